//! Generator options.

use std::time::Duration;

/// Options for one generation run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_exchange::generator::GeneratorConfig;
///
/// let config = GeneratorConfig::default()
///     .with_seed(7)
///     .with_retry_budget(500)
///     .with_deadline(Duration::from_millis(250));
/// assert!(config.validate().is_ok());
/// assert_eq!(config.effective_retry_budget(10), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Random seed. Same roster, exclusions and seed give the same result.
    /// When `None`, a seed is drawn from entropy and reported back.
    pub seed: Option<u64>,

    /// Maximum number of backtracks in the randomized search before
    /// switching to the matching fallback. `None` = `max(n², 64)`.
    ///
    /// `Some(0)` skips the randomized search entirely.
    pub retry_budget: Option<u32>,

    /// Wall-clock limit for the randomized search. Exceeding it fails the
    /// run instead of falling back.
    pub deadline: Option<Duration>,

    /// Fallback randomization effort: `swap_rounds * n` random swap and
    /// rotation proposals are applied to the deterministic matching.
    pub swap_rounds: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            retry_budget: None,
            deadline: None,
            swap_rounds: 8,
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = Some(budget);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_swap_rounds(mut self, rounds: usize) -> Self {
        self.swap_rounds = rounds;
        self
    }

    /// Backtrack budget for a group of `n` participants.
    pub fn effective_retry_budget(&self, n: usize) -> u64 {
        match self.retry_budget {
            Some(b) => u64::from(b),
            None => (n as u64).saturating_mul(n as u64).max(64),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err("deadline must be positive".into());
        }
        Ok(())
    }
}
