//! Cooperative wall-clock budget.

use std::time::{Duration, Instant};

/// Time limit checked between discrete steps of the pipeline.
///
/// The check is cooperative: a long local search pass may overrun the limit
/// until it reaches its next check point.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    start: Instant,
    limit: Option<Duration>,
}

impl TimeBudget {
    /// Starts a budget with an optional limit.
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    /// Budget that never runs out.
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Starts a budget from a limit given in seconds.
    pub fn from_secs(limit_secs: Option<f64>) -> Self {
        Self::new(limit_secs.map(Duration::from_secs_f64))
    }

    /// Time elapsed since the budget was started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether the limit has been reached.
    pub fn exhausted(&self) -> bool {
        match self.limit {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
