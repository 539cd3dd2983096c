//! News-item association backfill.
//!
//! After a boundary is created, every existing news item whose geometry
//! intersects it gets a `news_item_locations` join row. The id space is
//! walked in fixed-size batches, one set-based insert per batch, each
//! committing independently so that an interruption leaves a
//! well-defined prefix of batches committed and the rest untouched.
//!
//! Invoked exactly once per new boundary. The join table carries no
//! uniqueness constraint, so re-invoking for the same boundary may
//! duplicate rows; nothing here guards against that.

use blockpress_database::queries;
use switchy_database::Database;

use crate::BoundaryError;

/// News items per batch. Keeps each insert's scan and transaction
/// small and independently retriable.
pub const BATCH_SIZE: i64 = 200;

/// Partitions `[0, total)` into contiguous half-open id ranges of
/// `batch_size`.
///
/// The final range extends to the next batch boundary, mirroring the
/// insert's `id >= start AND id < end` filter.
#[must_use]
pub fn batch_ranges(total: i64, batch_size: i64) -> Vec<(i64, i64)> {
    assert!(batch_size > 0, "batch_size must be positive");
    let mut ranges = Vec::new();
    let mut start = 0i64;
    while start < total {
        ranges.push((start, start + batch_size));
        start += batch_size;
    }
    ranges
}

/// Inserts association rows for every news item intersecting the
/// location, batch by batch.
///
/// Returns the total number of rows inserted.
///
/// # Errors
///
/// Returns [`BoundaryError`] if the count query or any batch insert
/// fails. Batches committed before the failure stay committed.
pub async fn populate_news_item_locations(
    db: &dyn Database,
    location_id: i32,
    batch_size: i64,
) -> Result<u64, BoundaryError> {
    let total = queries::news_item_count(db).await?;
    let mut inserted = 0u64;

    for (start, end) in batch_ranges(total, batch_size) {
        inserted += queries::insert_item_location_batch(db, location_id, start, end).await?;
    }

    log::debug!("Backfilled {inserted} news item associations for location {location_id}");

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_space_yields_no_batches() {
        assert!(batch_ranges(0, 200).is_empty());
    }

    #[test]
    fn exact_multiple_of_batch_size() {
        let ranges = batch_ranges(1200, 200);
        assert_eq!(ranges.len(), 6);
        assert_eq!(ranges[0], (0, 200));
        assert_eq!(ranges[5], (1000, 1200));
    }

    #[test]
    fn partial_final_batch_extends_to_boundary() {
        let ranges = batch_ranges(450, 200);
        assert_eq!(ranges, vec![(0, 200), (200, 400), (400, 600)]);
    }

    #[test]
    fn ranges_are_contiguous_and_disjoint() {
        let ranges = batch_ranges(999, 64);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        assert_eq!(ranges[0].0, 0);
        assert!(ranges.last().unwrap().1 >= 999);
    }

    #[test]
    fn batch_size_invariance_over_covered_ids() {
        // Whatever the batch size, the union of ranges covers exactly
        // the ids that intersect-match, so the same id set is selected.
        let covered = |ranges: &[(i64, i64)], id: i64| {
            ranges.iter().any(|&(start, end)| id >= start && id < end)
        };

        for batch_size in [1, 7, 200, 500, 5000] {
            let ranges = batch_ranges(1200, batch_size);
            for id in [5, 250, 999] {
                assert!(covered(&ranges, id), "id {id} missed at batch {batch_size}");
            }
        }
    }
}
