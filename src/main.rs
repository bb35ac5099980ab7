// CmdSift - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Settings loading and logging initialisation (debug mode support)
// 3. Key configuration and name table loading
// 4. One processing run over the given file or directory

use clap::Parser;
use cmdsift::app::batch::{ProcessingRun, RunOptions};
use cmdsift::app::{key_config, name_table};
use cmdsift::core::export::ExportFormat;
use cmdsift::platform::config::{self, TableScope, WorkPaths};
use cmdsift::util;
use cmdsift::util::error::CmdSiftError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// CmdSift - extract and deduplicate device command records from
/// communication logs.
///
/// Point CmdSift at a `.log`/`.txt` file, or at a directory to process every
/// matching log file beneath it. One export file is written per input file.
#[derive(Parser, Debug)]
#[command(name = "cmdsift", version, about)]
struct Cli {
    /// Log file or directory to process.
    path: PathBuf,

    /// Key configuration CSV (default: config.csv next to the executable).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Name table CSV (default: name.csv next to the executable).
    #[arg(short = 'n', long = "names")]
    names: Option<PathBuf>,

    /// Settings file (default: cmdsift.toml next to the executable).
    #[arg(short = 's', long = "settings")]
    settings: Option<PathBuf>,

    /// Subfolder, relative to each input file, for export files.
    #[arg(short = 'o', long = "output-subfolder")]
    output_subfolder: Option<String>,

    /// Export format: csv, json, or text.
    #[arg(short = 'f', long = "format")]
    format: Option<ExportFormat>,

    /// Start every file with an empty dedup table instead of sharing one
    /// table across the whole run.
    #[arg(long = "per-file-table")]
    per_file_table: bool,

    /// Log to stderr only; do not write the daily log file.
    #[arg(long = "no-log-file")]
    no_log_file: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = WorkPaths::resolve();

    // Settings are read before logging exists; their warnings are replayed
    // once the subscriber is installed.
    let settings_path = cli.settings.clone().unwrap_or_else(|| paths.settings.clone());
    let (settings, settings_warnings) = config::load_settings(&settings_path);

    let log_dir = (settings.log_to_file && !cli.no_log_file).then_some(paths.log_dir.as_path());
    let log_file = util::logging::init(cli.debug, settings.log_level.as_deref(), log_dir);

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        work_dir = %paths.work_dir.display(),
        "CmdSift starting"
    );

    for w in &settings_warnings {
        tracing::warn!(warning = %w, "Settings warning");
    }

    let key_path = cli.config.clone().unwrap_or_else(|| paths.key_config.clone());
    let keys = match key_config::load_key_config(&key_path) {
        Ok((keys, _warnings)) => keys,
        Err(e) => return fail(&CmdSiftError::from(e), log_file.as_deref()),
    };

    let names_path = cli.names.clone().unwrap_or_else(|| paths.name_table.clone());
    let names = match name_table::load_name_table(&names_path) {
        Ok(names) => names,
        Err(e) => return fail(&CmdSiftError::from(e), log_file.as_deref()),
    };

    let mut options = RunOptions::from(&settings);
    if let Some(subfolder) = cli.output_subfolder {
        options.output_subfolder = subfolder;
    }
    if let Some(format) = cli.format {
        options.format = format;
    }
    if cli.per_file_table {
        options.table_scope = TableScope::PerFile;
    }

    let mut run = ProcessingRun::new(keys, names, options);
    match run.process_input(&cli.path) {
        Ok(summary) => {
            for report in &summary.files {
                if let Some(ref output) = report.output {
                    println!(
                        "{} -> {} ({} kept, {} discarded)",
                        report.path.display(),
                        output.display(),
                        report.records_retained,
                        report.records_discarded()
                    );
                }
            }
            println!(
                "Done: {} file(s), {} record(s) kept, {} discarded, {} orphan sub line(s)",
                summary.files.len(),
                summary.records_retained(),
                summary.records_discarded(),
                summary.orphan_subs()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e, log_file.as_deref()),
    }
}

/// Log the error, tell the user where the log is, and exit non-zero.
fn fail(error: &CmdSiftError, log_file: Option<&Path>) -> ExitCode {
    tracing::error!(error = %error, "Run aborted");
    eprintln!("Error: {error}");
    if let Some(path) = log_file {
        eprintln!("Details were saved to the log at {}", path.display());
    }
    ExitCode::FAILURE
}
