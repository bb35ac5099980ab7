// CmdSift - core/dedup.rs
//
// The dedup table and the filter that decides which finalized records are
// kept. The table is an explicit value owned by the caller: one table per
// processing run carries decisions across every file in the run, while a
// fresh table per file isolates them.

use crate::core::model::{CommandRecord, KeyConfig, KeyPolicy};
use crate::util::constants::DEDUP_TABLE_SLOTS;

/// Last record stored per head byte. Unused slots hold an empty placeholder.
#[derive(Debug, Clone)]
pub struct DedupTable {
    slots: Vec<CommandRecord>,
}

impl DedupTable {
    /// A table with every slot set to the empty placeholder.
    pub fn new() -> Self {
        Self {
            slots: vec![CommandRecord::default(); DEDUP_TABLE_SLOTS],
        }
    }

    /// The record stored for `head_value` (the placeholder if none).
    pub fn get(&self, head_value: u8) -> &CommandRecord {
        &self.slots[usize::from(head_value)]
    }

    fn store(&mut self, head_value: u8, record: CommandRecord) {
        self.slots[usize::from(head_value)] = record;
    }

    /// Number of slots holding a real record.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|r| !r.is_placeholder()).count()
    }

    /// Return every slot to the placeholder.
    pub fn clear(&mut self) {
        self.slots.fill(CommandRecord::default());
    }
}

impl Default for DedupTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the filter kept or dropped a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Head is a matchkey: always kept.
    KeptMatch,
    /// Head is a changematchkey and the record differs from the stored one.
    KeptChanged,
    /// Head is a changematchkey and the record equals the stored one.
    DroppedUnchanged,
    /// Head is in neither key set.
    DroppedUnlisted,
    /// Head is listed but is not a `0xHH` byte, so it has no table slot.
    DroppedNoSlot,
}

impl Verdict {
    pub fn is_kept(self) -> bool {
        matches!(self, Verdict::KeptMatch | Verdict::KeptChanged)
    }
}

/// Decide whether `record` survives and update `table` accordingly.
///
/// - matchkey head: keep and overwrite the slot unconditionally.
/// - changematchkey head: keep and overwrite only if the record differs from
///   the slot (send and return sequences; `head` is not compared). A
///   placeholder slot never equals a real record.
/// - any other head: drop, table untouched.
///
/// A head in both sets is treated as matchkey.
pub fn judge(record: &CommandRecord, keys: &KeyConfig, table: &mut DedupTable) -> Verdict {
    let policy = keys.policy_for(&record.head);
    if policy == KeyPolicy::Unlisted {
        return Verdict::DroppedUnlisted;
    }

    let Some(slot) = record.head_value() else {
        tracing::warn!(head = %record.head, "Listed head is not a hex byte; record dropped");
        return Verdict::DroppedNoSlot;
    };

    match policy {
        KeyPolicy::Match => {
            table.store(slot, record.clone());
            Verdict::KeptMatch
        }
        KeyPolicy::ChangeMatch => {
            if table.get(slot) == record {
                Verdict::DroppedUnchanged
            } else {
                table.store(slot, record.clone());
                Verdict::KeptChanged
            }
        }
        KeyPolicy::Unlisted => Verdict::DroppedUnlisted,
    }
}
