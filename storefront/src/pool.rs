//! Availability data for one raffle's number space.

use crate::selection::Selection;
use crate::types::RaffleId;
use std::collections::BTreeSet;

/// Display buckets are fixed at 100 numbers ("centenas").
pub const CENTENA_SIZE: u32 = 100;

/// The authoritative-as-of-last-fetch view of a raffle's number space.
///
/// Owned exclusively by the availability side of the session state machine;
/// every other component reads it through [`NumberPool::is_selectable`] and
/// the centena summaries. Taken and processing sets are replaced wholesale on
/// each refresh - no incremental merging, which is what rules out stale-merge
/// bugs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPool {
    raffle_id: RaffleId,
    range_start: u32,
    range_end: u32,
    taken: BTreeSet<u32>,
    processing: BTreeSet<u32>,
}

/// Per-centena counts backing the bucket navigation cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentenaSummary {
    /// First number in the bucket (inclusive)
    pub start: u32,
    /// Last number in the bucket (inclusive)
    pub end: u32,
    /// Numbers in the bucket
    pub total: u32,
    /// Taken or processing numbers in the bucket
    pub unavailable: u32,
    /// Currently selected numbers in the bucket
    pub selected: u32,
    /// Numbers still open for selection
    pub free: u32,
}

impl NumberPool {
    /// Create a pool with the given inclusive range and no unavailable
    /// numbers.
    #[must_use]
    pub const fn new(raffle_id: RaffleId, range_start: u32, range_end: u32) -> Self {
        Self {
            raffle_id,
            range_start,
            range_end,
            taken: BTreeSet::new(),
            processing: BTreeSet::new(),
        }
    }

    /// Create a pool from a fetched availability snapshot.
    ///
    /// Out-of-range numbers reported by the backend are kept; they simply
    /// never match a selectable number.
    #[must_use]
    pub fn with_sets(
        raffle_id: RaffleId,
        range_start: u32,
        range_end: u32,
        taken: impl IntoIterator<Item = u32>,
        processing: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            raffle_id,
            range_start,
            range_end,
            taken: taken.into_iter().collect(),
            processing: processing.into_iter().collect(),
        }
    }

    /// The raffle this pool belongs to.
    #[must_use]
    pub const fn raffle_id(&self) -> RaffleId {
        self.raffle_id
    }

    /// First number in the range (inclusive).
    #[must_use]
    pub const fn range_start(&self) -> u32 {
        self.range_start
    }

    /// Last number in the range (inclusive).
    #[must_use]
    pub const fn range_end(&self) -> u32 {
        self.range_end
    }

    /// Whether the number falls inside this raffle's range.
    #[must_use]
    pub const fn contains(&self, number: u32) -> bool {
        number >= self.range_start && number <= self.range_end
    }

    /// Whether the number is already purchased or reserved by someone.
    #[must_use]
    pub fn is_taken(&self, number: u32) -> bool {
        self.taken.contains(&number)
    }

    /// Whether the number has a submitted receipt awaiting verification.
    #[must_use]
    pub fn is_processing(&self, number: u32) -> bool {
        self.processing.contains(&number)
    }

    /// The single selectability predicate.
    ///
    /// A number is selectable iff it is in range and in neither the taken
    /// nor the processing set. Both sets are always excluded, even in the
    /// transient window where they overlap.
    #[must_use]
    pub fn is_selectable(&self, number: u32) -> bool {
        self.contains(number) && !self.is_taken(number) && !self.is_processing(number)
    }

    /// Number of 100-wide display buckets covering the range.
    #[must_use]
    pub const fn centena_count(&self) -> u32 {
        if self.range_end < self.range_start {
            return 0;
        }
        (self.range_end - self.range_start) / CENTENA_SIZE + 1
    }

    /// Inclusive bounds of one display bucket, if it exists.
    #[must_use]
    pub const fn centena_bounds(&self, index: u32) -> Option<(u32, u32)> {
        if index >= self.centena_count() {
            return None;
        }
        let start = self.range_start + index * CENTENA_SIZE;
        let end = start + CENTENA_SIZE - 1;
        let end = if end > self.range_end {
            self.range_end
        } else {
            end
        };
        Some((start, end))
    }

    /// Counts for one display bucket, given the current selection.
    #[must_use]
    pub fn centena_summary(&self, index: u32, selection: &Selection) -> Option<CentenaSummary> {
        let (start, end) = self.centena_bounds(index)?;

        let total = end - start + 1;
        let unavailable = self
            .taken
            .range(start..=end)
            .chain(self.processing.range(start..=end))
            .collect::<BTreeSet<_>>()
            .len();
        let selected = selection.iter().filter(|n| *n >= start && *n <= end).count();

        // A bucket holds at most 100 numbers, so these counts always fit.
        let unavailable = u32::try_from(unavailable).unwrap_or(u32::MAX);
        let selected = u32::try_from(selected).unwrap_or(u32::MAX);

        Some(CentenaSummary {
            start,
            end,
            total,
            unavailable,
            selected,
            free: total.saturating_sub(unavailable),
        })
    }
}
