// CmdSift - app/name_table.rs
//
// Loads the head -> label table from `name.csv`, creating the file from the
// built-in command list on first run.
//
// The file is a two-column CSV with a header row; columns are read by
// position so localized headers work unchanged. Keys are taken verbatim.

use crate::core::model::NameLookup;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::ConfigError;
use std::path::Path;

/// Built-in device command names, written to `name.csv` when it is missing.
/// Empty labels mark reserved commands without a documented name.
pub const DEFAULT_NAMES: &[(&str, &str)] = &[
    ("0x01", "Query engine basic status"),
    ("0x02", "Query recoverable errors"),
    ("0x03", "Query cover-open details"),
    ("0x08", "Query paper jam location details 1"),
    ("0x09", "Query paper jam location details 2"),
    ("0x0D", "Query print error information"),
    ("0x0E", "Query print wait information"),
    ("0x0F", "Query print wait details"),
    ("0x11", "Query engine power-save details"),
    ("0x12", "Query engine reset details"),
    ("0x13", "Query warning information 1"),
    ("0x14", "Query warning information 2"),
    ("0x1B", "Query consumable request information"),
    ("0x1C", "Query engine request information"),
    ("0x1D", "Query paper tray installation"),
    ("0x20", "Query paper tray change information"),
    ("0x21", "Query standard tray change details"),
    ("0x22", "Query standard tray paper size change details"),
    ("0x23", "Query multi-purpose tray change details"),
    ("0x25", "Query optional tray 1 change details"),
    ("0x26", "Query optional tray 1 paper size details"),
    ("0x27", "Query optional tray 2 change details"),
    ("0x28", "Query optional tray 2 paper size details"),
    ("0x30", "Query print management"),
    ("0x31", "Query page side A start/end information"),
    ("0x32", "Query page side B start/end information"),
    ("0x33", "Query page feed information"),
    ("0x37", "Query consumable life change information"),
    ("0x3D", "Query execution parameter operation status"),
    ("0x40", "Query special function availability"),
    ("0x41", "Query pages to resend after error"),
    ("0x51", "Handshake"),
    ("0x52", "Print preparation request"),
    ("0x53", "Set color mode / input / output tray"),
    ("0x54", "Set print resolution"),
    ("0x55", "Set paper type and thickness"),
    ("0x56", "Set paper size"),
    ("0x57", "Set custom paper length and width"),
    ("0x58", "Set size-mismatch detection"),
    ("0x59", "Set print mode"),
    ("0x5A", "Set image processing level"),
    ("0x5B", "Set print PPM"),
    ("0x5C", "Set print quality"),
    ("0x5E", "Set print density level"),
    ("0x65", "Execute print"),
    ("0x66", "Enter power-save mode"),
    ("0x67", "Exit power-save mode"),
    ("0x68", "Enter diagnostic mode"),
    ("0x69", "Exit diagnostic mode"),
    ("0x70", "Clear print error status bits"),
    ("0x71", "Clear paper jam status bits"),
    ("0x72", "Clear size-mismatch status bits"),
    ("0x82", "Controller image ready notification"),
    ("0x83", "Set CHAR MP parameter"),
    ("0x84", "Set SHORT MP parameter"),
    ("0x85", "Set LONG MP parameter"),
    ("0x86", "Set STRING MP parameter"),
    ("0x87", "Set EXECUTION MP parameter"),
    ("0x88", "Send machine information"),
    ("0x89", "Send machine current date"),
    ("0x8A", "Send dot count"),
    ("0x8C", "Send printer information"),
    ("0x99", "Request print cancel"),
    ("0x9A", "Request communication close"),
    ("0x9B", "Schedule engine reset"),
    ("0x9C", "Request engine reset"),
    ("0x9D", "Request color calibration start"),
    ("0x9E", "Request color calibration end"),
    ("0x9F", "Request color calibration type"),
    ("0xA0", "Request consumable special check"),
    ("0xA1", "Schedule consumable special check"),
    ("0xA2", "Request toner consumption check"),
    ("0xB5", "Request engine restart"),
    ("0xB6", "Set color calibration parameters"),
    ("0xB7", "Transfer consumable data"),
    ("0xB8", "Transfer NVRAM data"),
    ("0xB9", "Engine firmware update"),
    ("0xBA", "Read CHAR MP parameter"),
    ("0xBB", "Read SHORT MP parameter"),
    ("0xBC", "Read LONG MP parameter"),
    ("0xBD", "Read STRING MP parameter"),
    ("0xBE", ""),
    ("0xBF", "Query part-not-installed error status"),
    ("0xC0", ""),
    ("0xC1", "Query consumable near-empty error status"),
    ("0xC2", "Query consumable empty warning status"),
    ("0xC3", ""),
    ("0xC4", "Query calibration warning status"),
    ("0xC5", "Query consumable mismatch error status"),
    ("0xC6", ""),
    ("0xC7", "Query part-not-installed error details"),
    ("0xC8", "Query part mismatch error details"),
    ("0xC9", "Query consumable low warning status"),
    ("0xCA", "Query consumable remaining amount"),
    ("0xCB", "Query part usage rate"),
    ("0xCC", "Query consumable life information"),
    ("0xCD", "Query consumable page count information"),
    ("0xCE", "Query consumable part model / serial number"),
    ("0xCF", "Query consumable jobs counted by page length"),
    ("0xD0", ""),
    ("0xD1", ""),
    ("0xD2", ""),
    ("0xD3", "Query temperature/humidity warning status"),
    ("0xD4", "Query paper jam error code"),
    ("0xD5", "Query unrecoverable error code"),
    ("0xD6", ""),
    ("0xD7", "Query print cancel result"),
    ("0xD8", "Query page ID of print error"),
    ("0xD9", "Query page ID of paper jam"),
    ("0xDA", "Query page ID of size mismatch"),
    ("0xDB", "Engine NVRAM upload"),
    ("0xDC", "Engine log upload"),
    ("0xDD", "Extract post-calibration data"),
    ("0xDE", "Query engine color calibration mode"),
    ("0xDF", "Engine data export"),
    ("0xE0", "Engine consumable data upload"),
    ("0xE1", "Query calibration type result"),
    ("0xE2", "Query consumable special check type ID"),
    ("0xE3", "Query consumable special check result"),
    ("0xE4", "Query consumable change status"),
    ("0xE6", "Query toner consumption check result"),
];

/// The built-in table as a lookup, for runs without a name file.
pub fn default_lookup() -> NameLookup {
    DEFAULT_NAMES
        .iter()
        .map(|(head, label)| ((*head).to_string(), (*label).to_string()))
        .collect()
}

/// Load `name.csv`, writing the built-in table first if it does not exist.
pub fn load_name_table(path: &Path) -> Result<NameLookup, ConfigError> {
    if !path.exists() {
        write_default_name_table(path)?;
        tracing::info!(path = %path.display(), "Created default name table");
    }

    let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = fs::decode_text(&bytes).map_err(|e| ConfigError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;

    let names = parse_name_table(&text, path)?;
    tracing::info!(path = %path.display(), entries = names.len(), "Loaded name table");
    Ok(names)
}

/// Parse name table CSV text. Rows with an empty key are skipped; a later
/// row for the same key replaces an earlier one.
pub fn parse_name_table(text: &str, path: &Path) -> Result<NameLookup, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ConfigError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        let head = record.get(0).unwrap_or("").trim();
        if head.is_empty() {
            continue;
        }
        let label = record.get(1).unwrap_or("").trim();
        entries.push((head.to_string(), label.to_string()));
    }
    Ok(entries.into_iter().collect())
}

fn write_default_name_table(path: &Path) -> Result<(), ConfigError> {
    let csv_err = |e| ConfigError::Csv {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record(constants::NAME_TABLE_HEADER)
        .map_err(csv_err)?;
    for (head, label) in DEFAULT_NAMES {
        writer.write_record([*head, *label]).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
