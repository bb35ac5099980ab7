// CmdSift - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every variant keeps its cause so the
// top-level caller can log the full chain before terminating the batch.
//
// Expected malformations in log input (a sub line with no open main command)
// are NOT represented here: the aggregator handles them in place and reports
// them as per-line outcomes. Only conditions that abort work live here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all CmdSift operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum CmdSiftError {
    /// Key configuration, name table, or settings loading failed.
    Config(ConfigError),

    /// Input discovery failed.
    Discovery(DiscoveryError),

    /// Processing a log file was aborted.
    Parse(ParseError),

    /// Writing an export file failed.
    Export(ExportError),

    /// The input path cannot be processed.
    UnsupportedInput { path: PathBuf, reason: String },

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for CmdSiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::UnsupportedInput { path, reason } => {
                write!(f, "Cannot process '{}': {reason}", path.display())
            }
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CmdSiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::UnsupportedInput { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to loading the key configuration, name table, or settings.
#[derive(Debug)]
pub enum ConfigError {
    /// CSV reading or writing failed.
    Csv { path: PathBuf, source: csv::Error },

    /// A required CSV column is absent from the header row.
    MissingColumn { path: PathBuf, column: &'static str },

    /// A key cell is not a one- or two-digit hex value (non-fatal, skipped).
    InvalidKey {
        path: PathBuf,
        column: &'static str,
        row: usize,
        value: String,
    },

    /// TOML parsing of the settings file failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A settings value is out of the allowed range (non-fatal, default used).
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// The file could not be decoded as text.
    Decode {
        path: PathBuf,
        source: DecodeError,
    },

    /// I/O error reading or creating a config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { path, source } => {
                write!(f, "CSV error in '{}': {source}", path.display())
            }
            Self::MissingColumn { path, column } => {
                write!(f, "'{}' has no '{column}' column", path.display())
            }
            Self::InvalidKey {
                path,
                column,
                row,
                value,
            } => write!(
                f,
                "'{}' row {row}: {column} value '{value}' is not a 1-2 digit hex byte; skipped",
                path.display()
            ),
            Self::TomlParse { path, source } => {
                write!(f, "Settings parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Setting '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Decode { path, source } => {
                write!(f, "'{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::TomlParse { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for CmdSiftError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to finding log files under a directory.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },

    /// An include pattern is not a valid glob.
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Scan path '{}' is not a directory", path.display())
            }
            Self::InvalidPattern { pattern, source } => {
                write!(f, "Invalid include pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for CmdSiftError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors that abort processing of a log file, and with it the whole batch.
#[derive(Debug)]
pub enum ParseError {
    /// An unexpected failure while handling one line. Carries the offending
    /// raw line so it can be reported to the user.
    Aborted {
        file: PathBuf,
        line_number: u64,
        line: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The file could not be read.
    Io { file: PathBuf, source: io::Error },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted {
                file,
                line_number,
                line,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: {source} (source line: {line:?})",
                file.display()
            ),
            Self::Io { file, source } => {
                write!(f, "'{}': I/O error: {source}", file.display())
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Aborted { source, .. } => Some(source.as_ref()),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ParseError> for CmdSiftError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

/// A line (or whole file) that is not valid text in the detected encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Name of the encoding the bytes were decoded with.
    pub encoding: &'static str,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed {} text", self.encoding)
    }
}

impl std::error::Error for DecodeError {}

/// A line the line source could not deliver. The aggregator turns this into
/// `ParseError::Aborted` and stops.
#[derive(Debug)]
pub struct LineError {
    /// Best-effort text of the offending line (lossy if it was undecodable).
    pub raw: String,
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl LineError {
    pub fn new<E>(raw: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            raw: raw.into(),
            source: Box::new(source),
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line: {:?})", self.source, self.raw)
    }
}

impl std::error::Error for LineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to writing export files.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for CmdSiftError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for CmdSift results.
pub type Result<T> = std::result::Result<T, CmdSiftError>;
