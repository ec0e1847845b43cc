use std::collections::BTreeSet;

/// Order-by-completion-time sequence of WRITTEN records.
///
/// Backed by a `BTreeSet` of `(timestamp_millis, block_num)` pairs rather than
/// an intrusive linked list: insertion order is already non-decreasing in
/// `timestamp_millis`, so the set's natural order gives the
/// same head-first-to-expire behavior the original's `TAILQ` provided, while
/// letting a write that demotes a WRITTEN record back to WRITING remove its
/// own (known) key in O(log n) instead of a linear scan for it.
#[derive(Debug, Default)]
pub(crate) struct ExpiryList {
    entries: BTreeSet<(u64, u64)>,
}

impl ExpiryList {
    pub fn insert(&mut self, timestamp_millis: u64, block_num: u64) {
        self.entries.insert((timestamp_millis, block_num));
    }

    pub fn remove(&mut self, timestamp_millis: u64, block_num: u64) {
        self.entries.remove(&(timestamp_millis, block_num));
    }

    pub fn head(&self) -> Option<(u64, u64)> {
        self.entries.iter().next().copied()
    }

    pub fn pop_head(&mut self) -> Option<(u64, u64)> {
        let head = self.head()?;
        self.entries.remove(&head);
        Some(head)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(debug_assertions)]
    pub fn contains(&self, timestamp_millis: u64, block_num: u64) -> bool {
        self.entries.contains(&(timestamp_millis, block_num))
    }
}
