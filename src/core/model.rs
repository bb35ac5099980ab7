// CmdSift - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

// =============================================================================
// Command Record
// =============================================================================

/// One command group: a main send/return pair followed by its sub pairs.
///
/// `send[0]` is always `head`. `send` and `return_values` are index-aligned;
/// export truncates to the shorter of the two if they ever diverge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandRecord {
    /// Hex identifier taken from the main line's sent value, e.g. `0x51`.
    pub head: String,

    /// Sent values in line order. Index 0 is the main command.
    pub send: Vec<String>,

    /// Returned values in line order, aligned with `send`.
    pub return_values: Vec<String>,
}

impl CommandRecord {
    /// Open a new record from a main line's sent/returned pair.
    pub fn open(sent: &str, returned: &str) -> Self {
        Self {
            head: sent.to_string(),
            send: vec![sent.to_string()],
            return_values: vec![returned.to_string()],
        }
    }

    /// Append one sub line's pair, preserving line order.
    pub fn push_sub(&mut self, sent: &str, returned: &str) {
        self.send.push(sent.to_string());
        self.return_values.push(returned.to_string());
    }

    /// Numeric value of `head` (the dedup table slot), or `None` when the head
    /// is not a `0xHH` byte. Records built by the aggregator always have one.
    pub fn head_value(&self) -> Option<u8> {
        let digits = self.head.strip_prefix("0x").or_else(|| self.head.strip_prefix("0X"))?;
        if digits.len() != 2 {
            return None;
        }
        u8::from_str_radix(digits, 16).ok()
    }

    /// Number of send/return pairs that can be exported side by side.
    pub fn pair_count(&self) -> usize {
        self.send.len().min(self.return_values.len())
    }

    /// True for the empty placeholder held by unused dedup table slots.
    pub fn is_placeholder(&self) -> bool {
        self.head.is_empty() && self.send.is_empty() && self.return_values.is_empty()
    }
}

/// Records compare by their send and return sequences only; `head` is not
/// part of equality. Two records with different heads but identical
/// sequences are equal. The changematchkey policy relies on this comparison.
impl PartialEq for CommandRecord {
    fn eq(&self, other: &Self) -> bool {
        self.send == other.send && self.return_values == other.return_values
    }
}

impl Eq for CommandRecord {}

// =============================================================================
// Line classification
// =============================================================================

/// The sent/returned values extracted from a `[0xHH]->[0xHH]` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexPair<'a> {
    pub sent: &'a str,
    pub returned: &'a str,
}

/// Classification of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// No hex pair on the line.
    Invalid,

    /// Marker and hex pair: opens a new command group.
    Main(HexPair<'a>),

    /// Hex pair without the marker: extends the open command group.
    Sub(HexPair<'a>),
}

impl<'a> LineKind<'a> {
    /// The extracted pair, when one was found.
    pub fn pair(&self) -> Option<HexPair<'a>> {
        match self {
            LineKind::Invalid => None,
            LineKind::Main(pair) | LineKind::Sub(pair) => Some(*pair),
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::Invalid => "invalid",
            LineKind::Main(_) => "main",
            LineKind::Sub(_) => "sub",
        }
    }
}

// =============================================================================
// Key configuration
// =============================================================================

/// The two head sets that decide which records survive deduplication.
///
/// Keys are canonical `0xHH` strings. Membership is an exact string match,
/// so digit case in the configuration must match the case used in the logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyConfig {
    /// Heads that are always kept.
    pub matchkey: BTreeSet<String>,

    /// Heads that are kept only when their sequences changed since last seen.
    pub changematchkey: BTreeSet<String>,
}

impl KeyConfig {
    pub fn new<M, C, S>(matchkey: M, changematchkey: C) -> Self
    where
        M: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matchkey: matchkey.into_iter().map(Into::into).collect(),
            changematchkey: changematchkey.into_iter().map(Into::into).collect(),
        }
    }

    /// Which policy applies to `head`. matchkey wins over changematchkey.
    pub fn policy_for(&self, head: &str) -> KeyPolicy {
        if self.matchkey.contains(head) {
            KeyPolicy::Match
        } else if self.changematchkey.contains(head) {
            KeyPolicy::ChangeMatch
        } else {
            KeyPolicy::Unlisted
        }
    }
}

/// Dedup policy resolved for a single head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    Match,
    ChangeMatch,
    Unlisted,
}

// =============================================================================
// Name lookup
// =============================================================================

/// Mapping from head (`0x51`) to a human-readable command name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameLookup {
    names: HashMap<String, String>,
}

impl NameLookup {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Label for `head`, or `None` when the head is not in the table.
    /// An entry with an empty label is returned as an empty string.
    pub fn get(&self, head: &str) -> Option<&str> {
        self.names.get(head).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameLookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Export row
// =============================================================================

/// One exported record, flattened for CSV/JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub name: String,
    pub head: String,
    /// `send` joined with commas.
    pub send: String,
    /// `return_values` joined with commas.
    pub return_values: String,
    /// Multi-line `CMD:[..]->[..]` block.
    pub hex_format: String,
}

// =============================================================================
// Run statistics
// =============================================================================

/// Counters for one processed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    /// Input file.
    pub path: PathBuf,

    /// Export file written for this input (None until written).
    pub output: Option<PathBuf>,

    /// Lines scanned.
    pub lines: u64,

    /// Records finalized and submitted to the dedup filter.
    pub records_finalized: usize,

    /// Records the filter kept.
    pub records_retained: usize,

    /// Sub lines dropped because no main command was open.
    pub orphan_subs: usize,
}

impl FileReport {
    /// Records the filter discarded.
    pub fn records_discarded(&self) -> usize {
        self.records_finalized - self.records_retained
    }
}

/// Totals for one processing run over a file or a directory.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Per-file breakdown in processing order.
    pub files: Vec<FileReport>,

    /// Non-fatal problems encountered (inaccessible entries, skipped files).
    pub warnings: Vec<String>,

    /// Wall-clock run duration.
    pub duration: std::time::Duration,
}

impl BatchSummary {
    pub fn records_retained(&self) -> usize {
        self.files.iter().map(|f| f.records_retained).sum()
    }

    pub fn records_discarded(&self) -> usize {
        self.files.iter().map(FileReport::records_discarded).sum()
    }

    pub fn orphan_subs(&self) -> usize {
        self.files.iter().map(|f| f.orphan_subs).sum()
    }
}
