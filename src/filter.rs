//! Sample filter
//!
//! Narrows a user's record history (newest-first) to the records a request
//! should act on. Two modes: the calculation filter keeps everything not
//! soft-deleted; the drop-selection filter additionally narrows by a
//! specific id or by the oldest-N tail for a pending drop. Deterministic
//! and non-mutating.

use crate::model::MeasurementRecord;

/// Records eligible for statistics and display: soft-deleted ones are
/// omitted, newest-first order preserved.
pub fn eligible(records: &[MeasurementRecord]) -> Vec<&MeasurementRecord> {
    records
        .iter()
        .filter(|r| !r.exclude_from_calculations)
        .collect()
}

/// Select records from the eligible set for a drop (or a plain view).
///
/// A record is selected when its id matches `drop_id`, or when its position
/// counted from the oldest end is within the last `drop_oldest` entries.
/// With both selectors absent the whole eligible set is returned.
pub fn select_for_drop<'a>(
    eligible: &[&'a MeasurementRecord],
    drop_id: Option<u64>,
    drop_oldest: Option<usize>,
) -> Vec<&'a MeasurementRecord> {
    if drop_id.is_none() && drop_oldest.is_none() {
        return eligible.to_vec();
    }

    let len = eligible.len();
    eligible
        .iter()
        .enumerate()
        .filter(|(i, r)| {
            let id_match = drop_id.is_some_and(|id| r.id == id);
            // eligible is newest-first, so len - i is the 1-based position
            // counted from the oldest record
            let oldest_match = drop_oldest.is_some_and(|n| len - i <= n);
            id_match || oldest_match
        })
        .map(|(_, r)| *r)
        .collect()
}
