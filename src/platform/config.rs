// CmdSift - platform/config.rs
//
// Working-directory resolution and `cmdsift.toml` settings loading with
// startup validation.
//
// The working directory is the directory holding the executable, so a copy
// of the tool carries its own config.csv, name.csv, settings and log/.

use crate::core::export::ExportFormat;
use crate::util::constants;
use crate::util::error::ConfigError;
use std::path::{Path, PathBuf};

/// Resolved locations of the files the tool reads and writes.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    /// Directory holding the executable (or `.` if it cannot be determined).
    pub work_dir: PathBuf,

    /// `config.csv` with the matchkey / changematchkey columns.
    pub key_config: PathBuf,

    /// `name.csv` with head labels.
    pub name_table: PathBuf,

    /// Optional `cmdsift.toml`.
    pub settings: PathBuf,

    /// Directory for daily log files.
    pub log_dir: PathBuf,
}

impl WorkPaths {
    /// Resolve paths next to the running executable.
    pub fn resolve() -> Self {
        let work_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(work_dir)
    }

    /// Paths rooted at an explicit directory.
    pub fn in_dir(work_dir: PathBuf) -> Self {
        Self {
            key_config: work_dir.join(constants::KEY_CONFIG_FILE_NAME),
            name_table: work_dir.join(constants::NAME_TABLE_FILE_NAME),
            settings: work_dir.join(constants::SETTINGS_FILE_NAME),
            log_dir: work_dir.join(constants::LOG_DIR_NAME),
            work_dir,
        }
    }
}

// =============================================================================
// cmdsift.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of `cmdsift.toml`.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawSettings {
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[dedup]` section.
    pub dedup: DedupSection,
    /// `[discovery]` section.
    pub discovery: DiscoverySection,
}

/// `[logging]` settings section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Write the daily log file (default true).
    pub file: Option<bool>,
}

/// `[output]` settings section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Subfolder (relative to each input's directory) for export files.
    pub subfolder: Option<String>,
    /// "csv", "json", or "text".
    pub format: Option<String>,
}

/// `[dedup]` settings section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DedupSection {
    /// "batch" (one table per run) or "file" (fresh table per file).
    pub scope: Option<String>,
}

/// `[discovery]` settings section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Filename globs picked up in directory mode.
    pub include_patterns: Option<Vec<String>>,
    /// Maximum directory recursion depth.
    pub max_depth: Option<usize>,
}

/// How long a dedup table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableScope {
    /// One table for the whole run; decisions carry across files.
    #[default]
    Batch,
    /// A fresh table for every file.
    PerFile,
}

/// Validated settings derived from `cmdsift.toml`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: Option<String>,
    pub log_to_file: bool,
    pub output_subfolder: String,
    pub format: ExportFormat,
    pub table_scope: TableScope,
    pub include_patterns: Vec<String>,
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: None,
            log_to_file: true,
            output_subfolder: String::new(),
            format: ExportFormat::default(),
            table_scope: TableScope::default(),
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_depth: constants::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Load and validate the settings file.
///
/// Returns validated settings and a list of non-fatal warnings. A missing
/// file yields defaults with no warnings; an unparseable file yields
/// defaults with one warning.
pub fn load_settings(path: &Path) -> (Settings, Vec<ConfigError>) {
    let mut warnings: Vec<ConfigError> = Vec::new();

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No settings file found; using defaults");
        return (Settings::default(), warnings);
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            });
            return (Settings::default(), warnings);
        }
    };

    let (settings, parse_warnings) = parse_settings(&content, path);
    warnings.extend(parse_warnings);
    (settings, warnings)
}

/// Validate settings text. Split from `load_settings` so it can be tested
/// without touching the filesystem.
pub fn parse_settings(content: &str, path: &Path) -> (Settings, Vec<ConfigError>) {
    let mut warnings: Vec<ConfigError> = Vec::new();

    let raw: RawSettings = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(ConfigError::TomlParse {
                path: path.to_path_buf(),
                source: e,
            });
            return (Settings::default(), warnings);
        }
    };

    let mut settings = Settings::default();

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            settings.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "logging.level".to_string(),
                value: level.clone(),
                expected: constants::VALID_LOG_LEVELS.join(", "),
            });
        }
    }

    if let Some(file) = raw.logging.file {
        settings.log_to_file = file;
    }

    // -- Output --
    if let Some(subfolder) = raw.output.subfolder {
        if Path::new(&subfolder).is_absolute() {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "output.subfolder".to_string(),
                value: subfolder,
                expected: "a relative folder name".to_string(),
            });
        } else {
            settings.output_subfolder = subfolder;
        }
    }

    if let Some(ref format) = raw.output.format {
        match format.parse::<ExportFormat>() {
            Ok(f) => settings.format = f,
            Err(_) => warnings.push(ConfigError::ValueOutOfRange {
                field: "output.format".to_string(),
                value: format.clone(),
                expected: "csv, json, text".to_string(),
            }),
        }
    }

    // -- Dedup: scope --
    if let Some(ref scope) = raw.dedup.scope {
        match scope.to_lowercase().as_str() {
            "batch" => settings.table_scope = TableScope::Batch,
            "file" => settings.table_scope = TableScope::PerFile,
            _ => warnings.push(ConfigError::ValueOutOfRange {
                field: "dedup.scope".to_string(),
                value: scope.clone(),
                expected: "batch, file".to_string(),
            }),
        }
    }

    // -- Discovery --
    if let Some(patterns) = raw.discovery.include_patterns {
        if patterns.is_empty() {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "discovery.include_patterns".to_string(),
                value: "[]".to_string(),
                expected: "at least one glob pattern".to_string(),
            });
        } else {
            settings.include_patterns = patterns;
        }
    }

    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            settings.max_depth = depth;
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "discovery.max_depth".to_string(),
                value: depth.to_string(),
                expected: format!("1-{}", constants::ABSOLUTE_MAX_DEPTH),
            });
        }
    }

    tracing::info!(path = %path.display(), warnings = warnings.len(), "Loaded settings");

    (settings, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> (Settings, Vec<ConfigError>) {
        parse_settings(content, Path::new("cmdsift.toml"))
    }

    #[test]
    fn test_work_paths_layout() {
        let paths = WorkPaths::in_dir(PathBuf::from("/opt/cmdsift"));
        assert_eq!(paths.key_config, PathBuf::from("/opt/cmdsift/config.csv"));
        assert_eq!(paths.name_table, PathBuf::from("/opt/cmdsift/name.csv"));
        assert_eq!(paths.settings, PathBuf::from("/opt/cmdsift/cmdsift.toml"));
        assert_eq!(paths.log_dir, PathBuf::from("/opt/cmdsift/log"));
    }

    #[test]
    fn test_empty_settings_are_defaults() {
        let (settings, warnings) = parse("");
        assert!(warnings.is_empty());
        assert_eq!(settings.table_scope, TableScope::Batch);
        assert_eq!(settings.format, ExportFormat::Csv);
        assert_eq!(settings.include_patterns, vec!["*.log"]);
        assert!(settings.log_to_file);
        assert!(settings.output_subfolder.is_empty());
    }

    #[test]
    fn test_full_settings() {
        let (settings, warnings) = parse(
            r#"
            [logging]
            level = "DEBUG"
            file = false

            [output]
            subfolder = "parsed"
            format = "json"

            [dedup]
            scope = "file"

            [discovery]
            include_patterns = ["*.log", "*.txt"]
            max_depth = 3

            [future]
            ignored = true
            "#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert!(!settings.log_to_file);
        assert_eq!(settings.output_subfolder, "parsed");
        assert_eq!(settings.format, ExportFormat::Json);
        assert_eq!(settings.table_scope, TableScope::PerFile);
        assert_eq!(settings.include_patterns, vec!["*.log", "*.txt"]);
        assert_eq!(settings.max_depth, 3);
    }

    #[test]
    fn test_invalid_values_fall_back_with_warnings() {
        let (settings, warnings) = parse(
            r#"
            [logging]
            level = "loud"
            [output]
            format = "xlsx"
            [dedup]
            scope = "forever"
            [discovery]
            include_patterns = []
            max_depth = 0
            "#,
        );
        assert_eq!(warnings.len(), 5);
        assert!(settings.log_level.is_none());
        assert_eq!(settings.format, ExportFormat::Csv);
        assert_eq!(settings.table_scope, TableScope::Batch);
        assert_eq!(settings.include_patterns, vec!["*.log"]);
        assert_eq!(settings.max_depth, constants::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_unparseable_settings() {
        let (settings, warnings) = parse("[logging\nlevel = ");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], ConfigError::TomlParse { .. }));
        assert_eq!(settings.table_scope, TableScope::Batch);
    }

    #[test]
    fn test_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (_, warnings) = load_settings(&dir.path().join("cmdsift.toml"));
        assert!(warnings.is_empty());
    }
}
