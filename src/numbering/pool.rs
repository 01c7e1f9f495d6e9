use std::collections::{BTreeSet, HashSet};

use tracing::debug;

/// Pool of invoice sequence numbers released by deleted invoices.
///
/// Released numbers are handed out again smallest first, so gaps left by
/// deletions fill from the bottom. When the pool is empty the next number
/// continues past the highest active one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberPool {
    freed: BTreeSet<u64>,
}

impl NumberPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next invoice number.
    ///
    /// Freed entries that turn out to be active are dropped on the way, so the
    /// returned number is never one of `active`.
    pub fn next_number(&mut self, active: &HashSet<u64>) -> u64 {
        while let Some(candidate) = self.freed.pop_first() {
            if active.contains(&candidate) {
                debug!(number = candidate, "discarding freed number that is still active");
                continue;
            }
            debug!(number = candidate, "reusing freed invoice number");
            return candidate;
        }
        continue_after(active)
    }

    /// The number `next_number` would return, without touching the pool.
    pub fn peek(&self, active: &HashSet<u64>) -> u64 {
        self.freed
            .iter()
            .copied()
            .find(|n| !active.contains(n))
            .unwrap_or_else(|| continue_after(active))
    }

    pub fn release(&mut self, number: u64) {
        if self.freed.insert(number) {
            debug!(number, "released invoice number");
        }
    }

    /// Pin `number` so it is no longer handed out by `next_number`.
    pub fn reserve(&mut self, number: u64) {
        if self.freed.remove(&number) {
            debug!(number, "reserved invoice number");
        }
    }

    pub fn contains(&self, number: u64) -> bool {
        self.freed.contains(&number)
    }

    pub fn is_empty(&self) -> bool {
        self.freed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.freed.len()
    }

    /// Freed numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.freed.iter().copied()
    }
}

impl FromIterator<u64> for NumberPool {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            freed: iter.into_iter().collect(),
        }
    }
}

fn continue_after(active: &HashSet<u64>) -> u64 {
    active.iter().copied().max().unwrap_or(0) + 1
}

/// Parse the sequence number out of an invoice label.
///
/// Takes the last run of ASCII digits, so "INV-0000000042" gives 42 and
/// "2026/INV-7" gives 7. Returns `None` when the label has no digits.
pub fn extract_numeric(label: &str) -> Option<u64> {
    let bytes = label.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    label[start..end].parse().ok()
}

/// Render an invoice label: prefix followed by the number zero-padded to `width`.
pub fn format_invoice_number(prefix: &str, width: usize, number: u64) -> String {
    format!("{prefix}{number:0width$}")
}
