// CmdSift - app/key_config.rs
//
// Loads the matchkey / changematchkey sets from `config.csv`, creating the
// file with default keys on first run.
//
// Cells are canonicalised to `0xHH`: an optional `0x` prefix is stripped and
// a single digit is zero-padded. Digit case is kept as written. Empty cells
// are skipped; malformed cells are skipped with a warning.

use crate::core::model::KeyConfig;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::ConfigError;
use std::collections::BTreeSet;
use std::path::Path;

/// Canonical `0xHH` form of a configured key, or `None` if it is not a one-
/// or two-digit hex value.
pub fn canonicalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{digits:0>2}"))
}

/// Load `config.csv`, writing the default file first if it does not exist.
///
/// Returns the key sets and any skipped-cell warnings.
pub fn load_key_config(path: &Path) -> Result<(KeyConfig, Vec<ConfigError>), ConfigError> {
    if !path.exists() {
        write_default_key_config(path)?;
        tracing::info!(path = %path.display(), "Created default key configuration");
    }

    let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = fs::decode_text(&bytes).map_err(|e| ConfigError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (keys, warnings) = parse_key_config(&text, path)?;
    for w in &warnings {
        tracing::warn!(warning = %w, "Key configuration warning");
    }
    tracing::info!(
        path = %path.display(),
        matchkey = ?keys.matchkey,
        changematchkey = ?keys.changematchkey,
        "Loaded key configuration"
    );
    Ok((keys, warnings))
}

/// Parse key configuration CSV text. `path` is used for error context only.
pub fn parse_key_config(
    text: &str,
    path: &Path,
) -> Result<(KeyConfig, Vec<ConfigError>), ConfigError> {
    let csv_err = |e| ConfigError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_err)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ConfigError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
    };
    let match_idx = column(constants::MATCHKEY_COLUMN)?;
    let change_idx = column(constants::CHANGEMATCHKEY_COLUMN)?;

    let mut matchkey = BTreeSet::new();
    let mut changematchkey = BTreeSet::new();
    let mut warnings = Vec::new();

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // Header is row 1.
        let row = row_idx + 2;

        for (idx, column_name, set) in [
            (match_idx, constants::MATCHKEY_COLUMN, &mut matchkey),
            (change_idx, constants::CHANGEMATCHKEY_COLUMN, &mut changematchkey),
        ] {
            let Some(cell) = record.get(idx).filter(|c| !c.trim().is_empty()) else {
                continue;
            };
            match canonicalize_key(cell) {
                Some(key) => {
                    set.insert(key);
                }
                None => warnings.push(ConfigError::InvalidKey {
                    path: path.to_path_buf(),
                    column: column_name,
                    row,
                    value: cell.to_string(),
                }),
            }
        }
    }

    Ok((
        KeyConfig {
            matchkey,
            changematchkey,
        },
        warnings,
    ))
}

fn write_default_key_config(path: &Path) -> Result<(), ConfigError> {
    let csv_err = |e| ConfigError::Csv {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([constants::MATCHKEY_COLUMN, constants::CHANGEMATCHKEY_COLUMN])
        .map_err(csv_err)?;

    let rows = constants::DEFAULT_MATCHKEYS
        .len()
        .max(constants::DEFAULT_CHANGEMATCHKEYS.len());
    for i in 0..rows {
        writer
            .write_record([
                constants::DEFAULT_MATCHKEYS.get(i).copied().unwrap_or(""),
                constants::DEFAULT_CHANGEMATCHKEYS.get(i).copied().unwrap_or(""),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (KeyConfig, Vec<ConfigError>) {
        parse_key_config(text, Path::new("config.csv")).unwrap()
    }

    #[test]
    fn test_canonicalize_key() {
        assert_eq!(canonicalize_key("51").as_deref(), Some("0x51"));
        assert_eq!(canonicalize_key("1").as_deref(), Some("0x01"));
        assert_eq!(canonicalize_key("0x5A").as_deref(), Some("0x5A"));
        assert_eq!(canonicalize_key(" 0Xb ").as_deref(), Some("0x0b"));
        assert_eq!(canonicalize_key(""), None);
        assert_eq!(canonicalize_key("0x"), None);
        assert_eq!(canonicalize_key("123"), None);
        assert_eq!(canonicalize_key("zz"), None);
        assert_eq!(canonicalize_key("51.0"), None);
    }

    #[test]
    fn test_parse_uneven_columns() {
        let (keys, warnings) = parse("matchkey,changematchkey\n51,01\n52,30\n65,\n,31\n");
        assert!(warnings.is_empty());
        assert_eq!(
            keys.matchkey.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["0x51", "0x52", "0x65"]
        );
        assert_eq!(
            keys.changematchkey.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["0x01", "0x30", "0x31"]
        );
    }

    #[test]
    fn test_parse_column_order_and_short_rows() {
        let (keys, _) = parse("changematchkey,matchkey\n1,82\n2\n");
        assert!(keys.matchkey.contains("0x82"));
        assert!(keys.changematchkey.contains("0x01"));
        assert!(keys.changematchkey.contains("0x02"));
    }

    #[test]
    fn test_invalid_cells_are_warned_and_skipped() {
        let (keys, warnings) = parse("matchkey,changematchkey\n51,xyz\n");
        assert_eq!(keys.matchkey.len(), 1);
        assert!(keys.changematchkey.is_empty());
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            ConfigError::InvalidKey {
                column, row, value, ..
            } => {
                assert_eq!(*column, "changematchkey");
                assert_eq!(*row, 2);
                assert_eq!(value, "xyz");
            }
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_is_error() {
        let err = parse_key_config("matchkey\n51\n", Path::new("config.csv")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingColumn {
                column: "changematchkey",
                ..
            }
        ));
    }

    #[test]
    fn test_default_file_created_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.csv");

        let (keys, warnings) = load_key_config(&path).unwrap();
        assert!(path.exists());
        assert!(warnings.is_empty());
        assert_eq!(keys.matchkey.len(), 4);
        assert!(keys.matchkey.contains("0x65"));
        assert!(keys.changematchkey.contains("0x01"));
        assert!(keys.changematchkey.contains("0x32"));
    }

    #[test]
    fn test_existing_file_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.csv");
        std::fs::write(&path, "matchkey,changematchkey\n99,\n").unwrap();

        let (keys, _) = load_key_config(&path).unwrap();
        assert_eq!(keys.matchkey.len(), 1);
        assert!(keys.matchkey.contains("0x99"));
        assert!(keys.changematchkey.is_empty());
    }
}
