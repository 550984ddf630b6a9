use super::domain::{RankedRecord, UpliftRecord};
use std::cmp::Ordering;

/// Order records by uplift, highest first, and assign 1-based ranks.
///
/// The sort is stable so equal uplifts keep their input order, which keeps the
/// `BestN` cutoff reproducible when ties straddle the boundary. Non-finite
/// uplifts are filtered out upstream; any that slip through compare as equal.
pub fn rank(mut records: Vec<UpliftRecord>) -> Vec<RankedRecord> {
    records.sort_by(|a, b| b.uplift.partial_cmp(&a.uplift).unwrap_or(Ordering::Equal));
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| RankedRecord::from_uplift(record, index + 1))
        .collect()
}

/// Reassign ranks `1..k` in the current order.
pub(crate) fn rerank(records: &mut [RankedRecord]) {
    for (index, record) in records.iter_mut().enumerate() {
        record.rank = index + 1;
    }
}
