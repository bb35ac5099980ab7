// CmdSift - core/aggregate.rs
//
// Stateful scan over one file's lines. Main lines open command groups, sub
// lines extend the open group, and every closed group goes through the dedup
// filter. Core layer: takes lines, never touches the filesystem.
//
// Failure model:
//   - A sub line with no open group is expected malformed input: it is
//     logged, dropped, and the scan continues.
//   - A line the source could not deliver (`LineError`) is unexpected: the
//     scan stops at once, the open group is discarded, and the error is
//     returned with the offending line attached.

use crate::core::classify::classify_line;
use crate::core::dedup::{self, DedupTable, Verdict};
use crate::core::model::{CommandRecord, KeyConfig, LineKind};
use crate::util::error::{LineError, ParseError};
use std::path::Path;

/// What a single line did to the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// No hex pair; nothing changed.
    Ignored,

    /// A main line opened a new group. `finalized` is the verdict for the
    /// group it closed, if one was open.
    Opened { finalized: Option<Verdict> },

    /// A sub line was appended to the open group.
    Appended,

    /// A sub line arrived with no open group and was dropped.
    OrphanSub,
}

#[derive(Debug)]
enum ScanState {
    NoOpenCommand,
    OpenCommand(CommandRecord),
}

/// Result of scanning one file.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Records the filter kept, in the order they were finalized.
    pub records: Vec<CommandRecord>,

    /// Lines scanned.
    pub lines: u64,

    /// Records finalized and submitted to the filter.
    pub finalized: usize,

    /// Sub lines dropped because no group was open.
    pub orphan_subs: usize,
}

/// Line-at-a-time command aggregator.
///
/// Borrows the key configuration and the dedup table for the duration of one
/// file; the table outlives the aggregator so decisions carry over to the
/// next file when the caller reuses it.
pub struct Aggregator<'a> {
    keys: &'a KeyConfig,
    table: &'a mut DedupTable,
    state: ScanState,
    out: Aggregation,
}

impl<'a> Aggregator<'a> {
    pub fn new(keys: &'a KeyConfig, table: &'a mut DedupTable) -> Self {
        Self {
            keys,
            table,
            state: ScanState::NoOpenCommand,
            out: Aggregation::default(),
        }
    }

    /// Feed the next line.
    pub fn feed(&mut self, line: &str) -> LineOutcome {
        self.out.lines += 1;

        match classify_line(line) {
            LineKind::Invalid => LineOutcome::Ignored,
            LineKind::Main(pair) => {
                let next = CommandRecord::open(pair.sent, pair.returned);
                let previous = std::mem::replace(&mut self.state, ScanState::OpenCommand(next));
                let finalized = match previous {
                    ScanState::OpenCommand(record) => Some(self.finalize(record)),
                    ScanState::NoOpenCommand => None,
                };
                LineOutcome::Opened { finalized }
            }
            LineKind::Sub(pair) => match &mut self.state {
                ScanState::OpenCommand(record) => {
                    record.push_sub(pair.sent, pair.returned);
                    LineOutcome::Appended
                }
                ScanState::NoOpenCommand => {
                    self.out.orphan_subs += 1;
                    tracing::warn!(
                        line_number = self.out.lines,
                        line = %line,
                        "Sub command with no open main command; line skipped"
                    );
                    LineOutcome::OrphanSub
                }
            },
        }
    }

    /// End of input: finalize the open group, if any, and return the results.
    pub fn finish(mut self) -> Aggregation {
        if let ScanState::OpenCommand(record) =
            std::mem::replace(&mut self.state, ScanState::NoOpenCommand)
        {
            self.finalize(record);
        }
        self.out
    }

    fn finalize(&mut self, record: CommandRecord) -> Verdict {
        self.out.finalized += 1;
        let verdict = dedup::judge(&record, self.keys, self.table);
        tracing::trace!(head = %record.head, pairs = record.send.len(), ?verdict, "Record finalized");
        if verdict.is_kept() {
            self.out.records.push(record);
        }
        verdict
    }
}

/// Scan a fallible line source.
///
/// `file` labels errors and log events. The first `Err` item aborts the scan:
/// no further lines are read and the open group is not finalized.
pub fn aggregate_lines<I, S>(
    lines: I,
    file: &Path,
    keys: &KeyConfig,
    table: &mut DedupTable,
) -> Result<Aggregation, ParseError>
where
    I: IntoIterator<Item = Result<S, LineError>>,
    S: AsRef<str>,
{
    let mut aggregator = Aggregator::new(keys, table);

    for (idx, item) in lines.into_iter().enumerate() {
        match item {
            Ok(line) => {
                aggregator.feed(line.as_ref());
            }
            Err(e) => {
                let line_number = (idx as u64) + 1;
                tracing::error!(
                    file = %file.display(),
                    line_number,
                    line = %e.raw,
                    error = %e.source,
                    "Unexpected failure; aborting run"
                );
                return Err(ParseError::Aborted {
                    file: file.to_path_buf(),
                    line_number,
                    line: e.raw,
                    source: e.source,
                });
            }
        }
    }

    let out = aggregator.finish();
    tracing::debug!(
        file = %file.display(),
        lines = out.lines,
        finalized = out.finalized,
        retained = out.records.len(),
        orphan_subs = out.orphan_subs,
        "Aggregation complete"
    );
    Ok(out)
}

/// Scan lines that are already in memory. Cannot abort.
pub fn parse_commands<S: AsRef<str>>(
    lines: &[S],
    keys: &KeyConfig,
    table: &mut DedupTable,
) -> Aggregation {
    let mut aggregator = Aggregator::new(keys, table);
    for line in lines {
        aggregator.feed(line.as_ref());
    }
    aggregator.finish()
}
