// CmdSift - app/batch.rs
//
// One processing run over a file or a directory.
//
// Architecture:
//   - `ProcessingRun` owns the key configuration, the name table, and the
//     dedup table for the whole run.
//   - Files are processed strictly one after another; each file is read in
//     full, aggregated, and flushed to its export file before the next one.
//   - With `TableScope::Batch` the dedup table is shared by every file in the
//     run, so a changematchkey record already seen in an earlier file is
//     suppressed in later ones. `TableScope::PerFile` clears it per file.
//
// Failure model:
//   - Orphan sub lines, inaccessible directory entries: logged, run continues.
//   - Anything else (unreadable file, undecodable line, export failure):
//     the run stops at once and the error is returned. Export files already
//     written stay on disk.

use crate::core::aggregate::{self, Aggregation};
use crate::core::dedup::DedupTable;
use crate::core::discovery::{self, DiscoveryConfig};
use crate::core::export::{self, ExportFormat};
use crate::core::model::{BatchSummary, FileReport, KeyConfig, NameLookup};
use crate::platform::config::{Settings, TableScope};
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{CmdSiftError, ParseError, Result};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Output and scoping options for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Subfolder (relative to each input's directory) for export files.
    pub output_subfolder: String,
    pub format: ExportFormat,
    pub table_scope: TableScope,
    pub discovery: DiscoveryConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for RunOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            output_subfolder: settings.output_subfolder.clone(),
            format: settings.format,
            table_scope: settings.table_scope,
            discovery: DiscoveryConfig {
                max_depth: settings.max_depth,
                include_patterns: settings.include_patterns.clone(),
            },
        }
    }
}

/// How an input file was selected; decides the export file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    SingleFile,
    Directory,
}

/// Processing context for one run.
pub struct ProcessingRun {
    keys: KeyConfig,
    names: NameLookup,
    table: DedupTable,
    options: RunOptions,
}

impl ProcessingRun {
    /// A run with an empty dedup table.
    pub fn new(keys: KeyConfig, names: NameLookup, options: RunOptions) -> Self {
        Self {
            keys,
            names,
            table: DedupTable::new(),
            options,
        }
    }

    pub fn table(&self) -> &DedupTable {
        &self.table
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Discard every dedup decision made so far in this run.
    pub fn reset_table(&mut self) {
        self.table.clear();
    }

    /// Process a single `.txt`/`.log` file or every matching file under a directory.
    pub fn process_input(&mut self, input: &Path) -> Result<BatchSummary> {
        let start = Instant::now();
        let mut summary = BatchSummary::default();

        let metadata = std::fs::metadata(input).map_err(|_| CmdSiftError::UnsupportedInput {
            path: input.to_path_buf(),
            reason: "path is neither a file nor a directory".to_string(),
        })?;

        if metadata.is_file() {
            if !has_text_extension(input) {
                return Err(CmdSiftError::UnsupportedInput {
                    path: input.to_path_buf(),
                    reason: format!(
                        "not a text file; only {} files are supported",
                        constants::SINGLE_FILE_EXTENSIONS
                            .iter()
                            .map(|e| format!(".{e}"))
                            .collect::<Vec<_>>()
                            .join(" or ")
                    ),
                });
            }
            let output = self.output_path(input, InputMode::SingleFile);
            summary.files.push(self.process_file(input, &output)?);
        } else if metadata.is_dir() {
            let (files, warnings) = discovery::discover_files(input, &self.options.discovery)?;
            for w in &warnings {
                tracing::warn!(warning = %w, "Discovery warning");
            }
            summary.warnings.extend(warnings);

            for file in &files {
                let output = self.output_path(file, InputMode::Directory);
                summary.files.push(self.process_file(file, &output)?);
            }
        } else {
            return Err(CmdSiftError::UnsupportedInput {
                path: input.to_path_buf(),
                reason: "path is neither a file nor a directory".to_string(),
            });
        }

        summary.duration = start.elapsed();
        tracing::info!(
            input = %input.display(),
            files = summary.files.len(),
            retained = summary.records_retained(),
            discarded = summary.records_discarded(),
            orphan_subs = summary.orphan_subs(),
            duration_ms = summary.duration.as_millis() as u64,
            "Run complete"
        );
        Ok(summary)
    }

    /// Aggregate one file and write its export to `output`.
    pub fn process_file(&mut self, path: &Path, output: &Path) -> Result<FileReport> {
        tracing::info!(file = %path.display(), "Processing file");

        let aggregation = self.aggregate_file(path)?;
        let written = self.write_export(&aggregation, output)?;

        tracing::info!(
            file = %path.display(),
            output = %output.display(),
            rows = written,
            "Export complete"
        );

        Ok(FileReport {
            path: path.to_path_buf(),
            output: Some(output.to_path_buf()),
            lines: aggregation.lines,
            records_finalized: aggregation.finalized,
            records_retained: aggregation.records.len(),
            orphan_subs: aggregation.orphan_subs,
        })
    }

    /// Read and aggregate one file against this run's dedup table.
    pub fn aggregate_file(&mut self, path: &Path) -> Result<Aggregation> {
        if self.options.table_scope == TableScope::PerFile {
            self.table.clear();
        }

        let lines = fs::read_log_lines(path).map_err(|e| ParseError::Io {
            file: path.to_path_buf(),
            source: e,
        })?;

        Ok(aggregate::aggregate_lines(
            lines,
            path,
            &self.keys,
            &mut self.table,
        )?)
    }

    fn write_export(&self, aggregation: &Aggregation, output: &Path) -> Result<usize> {
        if let Some(dir) = output.parent() {
            std::fs::create_dir_all(dir).map_err(|e| CmdSiftError::Io {
                path: dir.to_path_buf(),
                operation: "create output directory",
                source: e,
            })?;
        }

        let file = std::fs::File::create(output).map_err(|e| CmdSiftError::Io {
            path: output.to_path_buf(),
            operation: "create export file",
            source: e,
        })?;

        Ok(export::export(
            self.options.format,
            &aggregation.records,
            &self.names,
            BufWriter::new(file),
            output,
        )?)
    }

    /// Export path for `input`:
    /// single file `<dir>/<subfolder>/<stem>_parse.<ext>`,
    /// directory mode `<dir>/<subfolder>/parse_<stem>.<ext>`.
    fn output_path(&self, input: &Path, mode: InputMode) -> PathBuf {
        let dir = input.parent().unwrap_or(Path::new("."));
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self.options.format.extension();

        let file_name = match mode {
            InputMode::SingleFile => format!("{stem}{}.{ext}", constants::SINGLE_FILE_OUTPUT_SUFFIX),
            InputMode::Directory => format!("{}{stem}.{ext}", constants::DIRECTORY_OUTPUT_PREFIX),
        };

        dir.join(&self.options.output_subfolder).join(file_name)
    }
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            constants::SINGLE_FILE_EXTENSIONS
                .iter()
                .any(|allowed| e.eq_ignore_ascii_case(allowed))
        })
}
