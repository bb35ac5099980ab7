// CmdSift - core/export.rs
//
// Turns retained command records into export rows and writes them as CSV,
// JSON, or a plain hex-block listing.
// Core layer: writes to any Write trait object.

use crate::core::model::{CommandRecord, ExportRow, NameLookup};
use crate::util::constants;
use crate::util::error::ExportError;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

/// Output format for a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    /// File extension for output files of this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(format!(
                "unknown export format '{other}'; expected csv, json, or text"
            )),
        }
    }
}

/// The `CMD:[..]->[..]` block for one record.
///
/// First line is the main pair; each following pair is on its own line with
/// the sub prefix. Pairs beyond the shorter of `send`/`return_values` are
/// omitted. No trailing newline.
pub fn hex_block(record: &CommandRecord) -> String {
    let (Some(sent), Some(returned)) = (record.send.first(), record.return_values.first()) else {
        return String::new();
    };

    let mut block = format!("{}[{sent}]->[{returned}]", constants::HEX_BLOCK_MAIN_PREFIX);
    for i in 1..record.pair_count() {
        block.push('\n');
        block.push_str(constants::HEX_BLOCK_SUB_PREFIX);
        block.push_str(&format!("[{}]->[{}]", record.send[i], record.return_values[i]));
    }
    block
}

/// Flatten one record into an export row, resolving its name.
pub fn export_row(record: &CommandRecord, names: &NameLookup) -> ExportRow {
    ExportRow {
        name: names
            .get(&record.head)
            .unwrap_or(constants::MISSING_NAME_LABEL)
            .to_string(),
        head: record.head.clone(),
        send: record.send.join(","),
        return_values: record.return_values.join(","),
        hex_format: hex_block(record),
    }
}

/// Export rows for every record, in order.
pub fn export_rows(records: &[CommandRecord], names: &NameLookup) -> Vec<ExportRow> {
    records.iter().map(|r| export_row(r, names)).collect()
}

/// Write records in the requested format. Returns the number of records written.
pub fn export<W: Write>(
    format: ExportFormat,
    records: &[CommandRecord],
    names: &NameLookup,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    match format {
        ExportFormat::Csv => export_csv(records, names, writer, export_path),
        ExportFormat::Json => export_json(records, names, writer, export_path),
        ExportFormat::Text => export_text(records, writer, export_path),
    }
}

/// Export records to CSV.
///
/// Writes: Name, Head, Send, Return_Values, Hex_Format
pub fn export_csv<W: Write>(
    records: &[CommandRecord],
    names: &NameLookup,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(constants::EXPORT_CSV_HEADER)
        .map_err(csv_err)?;

    let mut count = 0;
    for record in records {
        let row = export_row(record, names);
        csv_writer
            .write_record([
                &row.name,
                &row.head,
                &row.send,
                &row.return_values,
                &row.hex_format,
            ])
            .map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Export records to JSON (array of row objects).
pub fn export_json<W: Write>(
    records: &[CommandRecord],
    names: &NameLookup,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let rows = export_rows(records, names);
    serde_json::to_writer_pretty(writer, &rows).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(rows.len())
}

/// Export the hex block of each record, every line newline-terminated.
/// Records missing either sequence are skipped.
pub fn export_text<W: Write>(
    records: &[CommandRecord],
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let io_err = |e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut count = 0;
    for record in records {
        if record.send.is_empty() || record.return_values.is_empty() {
            continue;
        }
        writeln!(writer, "{}", hex_block(record)).map_err(io_err)?;
        count += 1;
    }
    writer.flush().map_err(io_err)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(pairs: &[(&str, &str)]) -> CommandRecord {
        let mut r = CommandRecord::open(pairs[0].0, pairs[0].1);
        for (s, ret) in &pairs[1..] {
            r.push_sub(s, ret);
        }
        r
    }

    fn names() -> NameLookup {
        [("0x51".to_string(), "Handshake".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_hex_block_single_pair() {
        assert_eq!(hex_block(&record(&[("0x01", "0x99")])), "CMD:[0x01]->[0x99]");
    }

    #[test]
    fn test_hex_block_with_subs() {
        let r = record(&[("0x51", "0x10"), ("0x30", "0x20"), ("0x31", "0x21")]);
        assert_eq!(
            hex_block(&r),
            "CMD:[0x51]->[0x10]\n   :[0x30]->[0x20]\n   :[0x31]->[0x21]"
        );
    }

    #[test]
    fn test_hex_block_truncates_to_shorter_sequence() {
        let mut r = record(&[("0x51", "0x10"), ("0x30", "0x20")]);
        r.send.push("0x40".to_string());
        assert_eq!(hex_block(&r), "CMD:[0x51]->[0x10]\n   :[0x30]->[0x20]");
    }

    #[test]
    fn test_hex_block_empty_record() {
        assert_eq!(hex_block(&CommandRecord::default()), "");
    }

    #[test]
    fn test_export_row_fields() {
        let r = record(&[("0x51", "0x10"), ("0x30", "0x20")]);
        let row = export_row(&r, &names());
        assert_eq!(row.name, "Handshake");
        assert_eq!(row.head, "0x51");
        assert_eq!(row.send, "0x51,0x30");
        assert_eq!(row.return_values, "0x10,0x20");
    }

    #[test]
    fn test_export_row_missing_name_uses_fallback() {
        let row = export_row(&record(&[("0x02", "0x00")]), &names());
        assert_eq!(row.name, constants::MISSING_NAME_LABEL);
    }

    #[test]
    fn test_csv_export() {
        let records = vec![
            record(&[("0x51", "0x10"), ("0x30", "0x20")]),
            record(&[("0x01", "0x99")]),
        ];
        let mut buf = Vec::new();
        let count = export_csv(&records, &names(), &mut buf, &PathBuf::from("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("Name,Head,Send,Return_Values,Hex_Format\n"));
        // Multi-value and multi-line fields are quoted.
        assert!(output.contains("Handshake,0x51,\"0x51,0x30\",\"0x10,0x20\",\"CMD:[0x51]->[0x10]\n   :[0x30]->[0x20]\""));
        assert!(output.contains(",0x01,0x01,0x99,CMD:[0x01]->[0x99]"));
    }

    #[test]
    fn test_csv_export_reads_back() {
        let records = vec![record(&[("0x51", "0x10"), ("0x30", "0x20")])];
        let mut buf = Vec::new();
        export_csv(&records, &names(), &mut buf, &PathBuf::from("out.csv")).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][4], "CMD:[0x51]->[0x10]\n   :[0x30]->[0x20]");
    }

    #[test]
    fn test_json_export() {
        let records = vec![record(&[("0x51", "0x10")])];
        let mut buf = Vec::new();
        let count = export_json(&records, &names(), &mut buf, &PathBuf::from("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["head"], "0x51");
        assert_eq!(value[0]["name"], "Handshake");
        assert_eq!(value[0]["hex_format"], "CMD:[0x51]->[0x10]");
    }

    #[test]
    fn test_text_export_skips_empty_records() {
        let records = vec![
            record(&[("0x51", "0x10"), ("0x30", "0x20")]),
            CommandRecord::default(),
            record(&[("0x01", "0x99")]),
        ];
        let mut buf = Vec::new();
        let count = export_text(&records, &mut buf, &PathBuf::from("out.txt")).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "CMD:[0x51]->[0x10]\n   :[0x30]->[0x20]\nCMD:[0x01]->[0x99]\n"
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("txt".parse::<ExportFormat>(), Ok(ExportFormat::Text));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::Text.extension(), "txt");
    }
}
