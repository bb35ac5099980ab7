// CmdSift - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "CmdSift";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Line classification
// =============================================================================

/// Literal token that marks a line as opening a new main command.
pub const MAIN_COMMAND_MARKER: &str = ":CMD:";

/// Pattern for a single sent/returned byte pair, e.g. `[0x51]->[0x10]`.
pub const HEX_PAIR_PATTERN: &str = r"\[(0x[a-fA-F0-9]{2})\]->\[(0x[a-fA-F0-9]{2})\]";

/// Number of slots in the dedup table: one per possible head byte.
pub const DEDUP_TABLE_SLOTS: usize = 256;

// =============================================================================
// Export
// =============================================================================

/// Label exported when a head has no entry in the name table.
pub const MISSING_NAME_LABEL: &str = "<name missing or empty, please update name.csv>";

/// CSV header row for exported command records.
pub const EXPORT_CSV_HEADER: [&str; 5] = ["Name", "Head", "Send", "Return_Values", "Hex_Format"];

/// Prefix of the first line of a record's hex block.
pub const HEX_BLOCK_MAIN_PREFIX: &str = "CMD:";

/// Prefix of every follow-up line of a record's hex block.
pub const HEX_BLOCK_SUB_PREFIX: &str = "   :";

/// Suffix appended to the file stem in single-file mode (`trace_parse.csv`).
pub const SINGLE_FILE_OUTPUT_SUFFIX: &str = "_parse";

/// Prefix prepended to the file stem in directory mode (`parse_trace.csv`).
pub const DIRECTORY_OUTPUT_PREFIX: &str = "parse_";

/// File extensions accepted when a single file is given as input.
pub const SINGLE_FILE_EXTENSIONS: &[&str] = &["txt", "log"];

// =============================================================================
// Working-directory files
// =============================================================================

/// Key configuration file (matchkey / changematchkey columns).
pub const KEY_CONFIG_FILE_NAME: &str = "config.csv";

/// Name table file (head -> human-readable label).
pub const NAME_TABLE_FILE_NAME: &str = "name.csv";

/// Optional TOML settings file.
pub const SETTINGS_FILE_NAME: &str = "cmdsift.toml";

/// Directory holding the daily log files.
pub const LOG_DIR_NAME: &str = "log";

/// chrono format string for daily log file names (`20260118.log`).
pub const LOG_FILE_DATE_FORMAT: &str = "%Y%m%d";

/// Column header of the matchkey column in `config.csv`.
pub const MATCHKEY_COLUMN: &str = "matchkey";

/// Column header of the changematchkey column in `config.csv`.
pub const CHANGEMATCHKEY_COLUMN: &str = "changematchkey";

/// matchkey values written to a freshly created `config.csv`.
pub const DEFAULT_MATCHKEYS: &[&str] = &["51", "52", "65", "82"];

/// changematchkey values written to a freshly created `config.csv`.
pub const DEFAULT_CHANGEMATCHKEYS: &[&str] = &["01", "30", "31", "32"];

/// Header row written to a freshly created `name.csv`.
pub const NAME_TABLE_HEADER: [&str; 2] = ["command", "label"];

// =============================================================================
// Discovery limits
// =============================================================================

/// Default glob patterns for log files picked up in directory mode.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.log"];

/// Maximum directory recursion depth during discovery.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 256;

/// Input files larger than this are refused (the core holds one file in memory).
pub const MAX_INPUT_FILE_SIZE: u64 = 512 * 1024 * 1024; // 512 MB

// =============================================================================
// Logging
// =============================================================================

/// Default log level when no override is provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in the settings file.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
