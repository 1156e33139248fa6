//! Weighted outcome selection for the prize wheel.
//!
//! Weights are `u32` and accumulate into a `u64` total, so a table cannot
//! overflow. A draw `d` in `0..total` selects the first outcome whose
//! cumulative weight exceeds `d`; zero-weight outcomes therefore never win.

use crate::domain::ports::DrawSource;

/// Configuration errors for an [`OutcomeSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// No outcomes were supplied.
    #[error("outcome table must not be empty")]
    Empty,
    /// Every outcome has weight zero.
    #[error("outcome table must have a positive total weight")]
    ZeroTotalWeight,
}

/// One entry of an outcome table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedOutcome<T> {
    /// The outcome returned when this entry is drawn.
    pub outcome: T,
    /// Relative likelihood.
    pub weight: u32,
}

impl<T> WeightedOutcome<T> {
    /// Pair an outcome with its weight.
    pub const fn new(outcome: T, weight: u32) -> Self {
        Self { outcome, weight }
    }
}

/// Validated outcome table.
///
/// # Examples
/// ```
/// use wheel_backend::domain::ports::FixtureDrawSource;
/// use wheel_backend::domain::{OutcomeSelector, WeightedOutcome};
///
/// let selector = OutcomeSelector::new(vec![
///     WeightedOutcome::new("left", 1),
///     WeightedOutcome::new("right", 3),
/// ])
/// .expect("valid table");
/// assert_eq!(*selector.pick(&FixtureDrawSource(0)), "left");
/// assert_eq!(*selector.pick(&FixtureDrawSource(1)), "right");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeSelector<T> {
    outcomes: Vec<WeightedOutcome<T>>,
    total: u64,
    last_winnable: usize,
}

impl<T> OutcomeSelector<T> {
    /// Validate and build a selector.
    ///
    /// # Errors
    /// Returns [`SelectorError::Empty`] for an empty table and
    /// [`SelectorError::ZeroTotalWeight`] when no outcome can be drawn.
    pub fn new(outcomes: Vec<WeightedOutcome<T>>) -> Result<Self, SelectorError> {
        if outcomes.is_empty() {
            return Err(SelectorError::Empty);
        }
        let total: u64 = outcomes.iter().map(|entry| u64::from(entry.weight)).sum();
        let last_winnable = outcomes
            .iter()
            .rposition(|entry| entry.weight > 0)
            .ok_or(SelectorError::ZeroTotalWeight)?;
        Ok(Self {
            outcomes,
            total,
            last_winnable,
        })
    }

    /// Sum of all weights.
    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.total
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &WeightedOutcome<T>> {
        self.outcomes.iter()
    }

    /// Draw one outcome.
    #[expect(
        clippy::indexing_slicing,
        reason = "last_winnable is a validated index into outcomes"
    )]
    pub fn pick(&self, source: &dyn DrawSource) -> &T {
        let draw = source.draw_below(self.total);
        debug_assert!(
            draw < self.total,
            "draw source returned {draw}, expected below {}",
            self.total
        );
        let draw = draw % self.total;
        let mut cumulative = 0_u64;
        for entry in &self.outcomes {
            cumulative += u64::from(entry.weight);
            if draw < cumulative {
                return &entry.outcome;
            }
        }
        // Not reached: draw < total.
        &self.outcomes[self.last_winnable].outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureDrawSource, MockDrawSource};
    use rstest::rstest;

    fn table(weights: &[u32]) -> Result<OutcomeSelector<usize>, SelectorError> {
        OutcomeSelector::new(
            weights
                .iter()
                .enumerate()
                .map(|(index, weight)| WeightedOutcome::new(index, *weight))
                .collect(),
        )
    }

    #[rstest]
    fn empty_table_is_rejected() {
        assert_eq!(table(&[]), Err(SelectorError::Empty));
    }

    #[rstest]
    fn all_zero_weights_are_rejected() {
        assert_eq!(table(&[0, 0]), Err(SelectorError::ZeroTotalWeight));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(49, 0)]
    #[case(50, 1)]
    #[case(99, 1)]
    fn cumulative_boundaries_select_expected_entry(#[case] draw: u64, #[case] expected: usize) {
        let selector = table(&[50, 50]).expect("valid");
        assert_eq!(*selector.pick(&FixtureDrawSource(draw)), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn zero_weight_entries_never_win(#[case] draw: u64) {
        let selector = table(&[0, 3, 0]).expect("valid");
        assert_eq!(*selector.pick(&FixtureDrawSource(draw)), 1);
    }

    #[rstest]
    fn pick_asks_for_total_weight() {
        let selector = table(&[2, 5]).expect("valid");
        let mut source = MockDrawSource::new();
        source
            .expect_draw_below()
            .withf(|upper| *upper == 7)
            .times(1)
            .return_const(6_u64);
        assert_eq!(*selector.pick(&source), 1);
    }

    #[rstest]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "draw source returned 3, expected below 2")]
    fn out_of_range_draws_trip_the_debug_check() {
        let selector = table(&[1, 1]).expect("valid");
        let mut source = MockDrawSource::new();
        source.expect_draw_below().return_const(3_u64);
        let _ = selector.pick(&source);
    }

    #[rstest]
    fn last_draw_below_total_hits_the_last_winnable_entry() {
        let selector = table(&[1, 0, 1, 0]).expect("valid");
        let mut source = MockDrawSource::new();
        source.expect_draw_below().withf(|upper| *upper == 2).return_const(1_u64);
        assert_eq!(*selector.pick(&source), 2);
    }

    #[rstest]
    fn large_weights_accumulate_without_overflow() {
        let selector = table(&[u32::MAX, u32::MAX]).expect("valid");
        assert_eq!(selector.total_weight(), 2 * u64::from(u32::MAX));
        assert_eq!(*selector.pick(&FixtureDrawSource(u64::from(u32::MAX))), 1);
    }
}
