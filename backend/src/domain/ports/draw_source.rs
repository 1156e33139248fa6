//! Port for uniform random draws.
//!
//! The outcome selector only needs "a number below `upper`", so the random
//! source stays swappable: thread-local entropy in production, a seeded
//! generator in tests.

/// Source of uniform integer draws.
#[cfg_attr(test, mockall::automock)]
pub trait DrawSource: Send + Sync {
    /// Draw uniformly from `0..upper`. Callers guarantee `upper > 0`.
    fn draw_below(&self, upper: u64) -> u64;
}

/// Fixture source that always yields the same draw, wrapped into range.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDrawSource(pub u64);

impl DrawSource for FixtureDrawSource {
    fn draw_below(&self, upper: u64) -> u64 {
        self.0 % upper.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 0)]
    #[case(7, 10, 7)]
    #[case(15, 10, 5)]
    fn fixture_wraps_into_range(#[case] value: u64, #[case] upper: u64, #[case] expected: u64) {
        assert_eq!(FixtureDrawSource(value).draw_below(upper), expected);
    }
}
