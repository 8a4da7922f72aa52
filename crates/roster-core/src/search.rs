//! Free-text filtering over the full record set.
//!
//! No index: every call scans every field of every record. The registration
//! table is expected to stay in the tens of thousands of rows.

use strum::IntoEnumIterator;

use crate::record::{CitizenRecord, Field};

/// Records with at least one field containing `term`, ignoring case.
///
/// An empty (or whitespace-only) term matches everything. Order is preserved.
pub fn search<'a>(records: &'a [CitizenRecord], term: &str) -> Vec<&'a CitizenRecord> {
  let needle = term.trim().to_lowercase();
  if needle.is_empty() {
    return records.iter().collect();
  }
  records
    .iter()
    .filter(|r| Field::iter().any(|f| r.value(f).to_lowercase().contains(&needle)))
    .collect()
}

/// The last `n` records, oldest first.
pub fn recent(records: &[CitizenRecord], n: usize) -> &[CitizenRecord] {
  &records[records.len().saturating_sub(n)..]
}
