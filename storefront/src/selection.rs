//! The user's in-progress number selection.

use crate::types::Money;
use std::collections::BTreeSet;

/// Set of numbers the user has clicked but not yet submitted.
///
/// Backed by a [`BTreeSet`] so iteration is always in ascending numeric
/// order. Membership changes go through [`Selection::toggle`]; the workflow
/// reducer is the only caller and gates every toggle on selectability, so a
/// taken or processing number can never enter the set by any path.
///
/// Starts empty per raffle-detail session, cleared on successful submission,
/// successful cancellation, or explicit discard. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    numbers: BTreeSet<u32>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            numbers: BTreeSet::new(),
        }
    }

    /// Flip membership of a number; returns whether it is selected afterwards.
    pub fn toggle(&mut self, number: u32) -> bool {
        if self.numbers.remove(&number) {
            false
        } else {
            self.numbers.insert(number);
            true
        }
    }

    /// Whether the number is currently selected.
    #[must_use]
    pub fn contains(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }

    /// Drop every selected number failing the predicate.
    ///
    /// Used when a fresh availability snapshot arrives and some selected
    /// numbers were taken by another client in the meantime.
    pub fn retain(&mut self, keep: impl FnMut(&u32) -> bool) {
        self.numbers.retain(keep);
    }

    /// Empty the selection.
    pub fn clear(&mut self) {
        self.numbers.clear();
    }

    /// Number of selected numbers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Iterate selected numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.numbers.iter().copied()
    }

    /// Selected numbers as an ascending vector (request payload shape).
    #[must_use]
    pub fn numbers(&self) -> Vec<u32> {
        self.numbers.iter().copied().collect()
    }

    /// Running total at the given price per number.
    #[must_use]
    pub fn total(&self, price_per_number: Money) -> Money {
        price_per_number.times(self.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn toggle_flips_membership() {
        let mut selection = Selection::new();

        assert!(selection.toggle(7));
        assert!(selection.contains(7));

        assert!(!selection.toggle(7));
        assert!(!selection.contains(7));
    }

    #[test]
    fn numbers_come_out_ascending() {
        let mut selection = Selection::new();
        selection.toggle(42);
        selection.toggle(3);
        selection.toggle(17);

        assert_eq!(selection.numbers(), vec![3, 17, 42]);
    }

    #[test]
    fn clear_empties_the_selection() {
        let mut selection = Selection::new();
        selection.toggle(1);
        selection.toggle(2);

        selection.clear();

        assert!(selection.is_empty());
        assert_eq!(selection.total(Money::from_pesos(50)), Money::ZERO);
    }

    proptest! {
        #[test]
        fn double_toggle_is_identity(seed in proptest::collection::btree_set(0u32..1000, 0..20), n in 0u32..1000) {
            let mut selection = Selection::new();
            for number in &seed {
                selection.toggle(*number);
            }
            let before = selection.clone();

            selection.toggle(n);
            selection.toggle(n);

            prop_assert_eq!(selection, before);
        }

        #[test]
        fn total_is_count_times_price(numbers in proptest::collection::btree_set(0u32..10_000, 0..50), price in 0u64..1_000_000) {
            let mut selection = Selection::new();
            for number in &numbers {
                selection.toggle(*number);
            }

            let price = Money::from_centavos(price);
            prop_assert_eq!(selection.total(price), price.times(numbers.len()));
        }
    }
}
