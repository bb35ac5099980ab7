// CmdSift - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Settings file: [logging] level = "debug"
//
// Output: stderr, plus an appended daily file (`<log dir>/YYYYMMDD.log`)
// when a log directory is supplied and can be created.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from the settings file (if present).
/// `log_dir` is the directory for the daily log file; `None` logs to stderr only.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
///
/// Returns the path of the log file actually attached, if any.
pub fn init(debug_flag: bool, config_level: Option<&str>, log_dir: Option<&Path>) -> Option<PathBuf> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    // A log file that cannot be opened is reported on stderr once logging is
    // up; the run itself proceeds without it.
    let (log_file, open_error) = match log_dir.map(open_daily_log) {
        Some(Ok((path, file))) => (Some((path, file)), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let attached = match log_file {
        Some((path, file)) => {
            builder
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Mutex::new(file)))
                .init();
            Some(path)
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            None
        }
    };

    if let Some(e) = open_error {
        tracing::warn!(error = %e, "Could not open log file; logging to stderr only");
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        log_file = ?attached,
        "Logging initialised"
    );

    attached
}

/// Path of today's log file inside `log_dir`.
pub fn daily_log_path(log_dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format(super::constants::LOG_FILE_DATE_FORMAT);
    log_dir.join(format!("{stamp}.log"))
}

/// Create `log_dir` if needed and open today's log file in append mode.
fn open_daily_log(log_dir: &Path) -> std::io::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;
    let path = daily_log_path(log_dir);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}
