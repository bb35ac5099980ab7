// CmdSift - core/classify.rs
//
// Line classification: decides whether a log line opens a command group,
// extends one, or carries nothing of interest. Pure and total.

use crate::core::model::{HexPair, LineKind};
use crate::util::constants;
use regex::Regex;
use std::sync::OnceLock;

fn hex_pair_regex() -> &'static Regex {
    static HEX_PAIR: OnceLock<Regex> = OnceLock::new();
    // The pattern is a compile-time constant covered by the tests below.
    HEX_PAIR.get_or_init(|| Regex::new(constants::HEX_PAIR_PATTERN).expect("valid hex pair regex"))
}

/// Extract the first `[0xHH]->[0xHH]` pair on the line, brackets stripped and
/// digit case preserved.
pub fn find_hex_pair(line: &str) -> Option<HexPair<'_>> {
    let caps = hex_pair_regex().captures(line)?;
    Some(HexPair {
        sent: caps.get(1)?.as_str(),
        returned: caps.get(2)?.as_str(),
    })
}

/// Classify one log line.
///
/// - marker and hex pair present: `Main`
/// - hex pair only: `Sub`
/// - no hex pair: `Invalid` (the marker alone is not enough)
pub fn classify_line(line: &str) -> LineKind<'_> {
    match find_hex_pair(line) {
        Some(pair) if line.contains(constants::MAIN_COMMAND_MARKER) => LineKind::Main(pair),
        Some(pair) => LineKind::Sub(pair),
        None => LineKind::Invalid,
    }
}
