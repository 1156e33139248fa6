//! Random draw adapters for the [`DrawSource`] port.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::ports::DrawSource;

/// Production draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngDrawSource;

impl DrawSource for ThreadRngDrawSource {
    fn draw_below(&self, upper: u64) -> u64 {
        rand::thread_rng().gen_range(0..upper.max(1))
    }
}

/// Deterministic draws from a seeded generator.
///
/// # Examples
/// ```
/// use wheel_backend::domain::ports::DrawSource;
/// use wheel_backend::outbound::random::SeededDrawSource;
///
/// let first = SeededDrawSource::new(7);
/// let second = SeededDrawSource::new(7);
/// assert_eq!(first.draw_below(100), second.draw_below(100));
/// ```
#[derive(Debug)]
pub struct SeededDrawSource(Mutex<StdRng>);

impl SeededDrawSource {
    /// Seed a new generator.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl DrawSource for SeededDrawSource {
    fn draw_below(&self, upper: u64) -> u64 {
        // The generator has no invariant a panicking holder could break.
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..upper.max(1))
    }
}
