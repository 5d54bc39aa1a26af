//! Generation outcome types.

use crate::assignment::AssignmentSet;
use std::time::Duration;

/// How the accepted assignment was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Randomized backtracking search succeeded within budget.
    Randomized,
    /// Deterministic matching, then randomized by constraint-preserving swaps.
    FallbackShuffled,
    /// Deterministic matching returned as-is; no swap was admissible.
    FallbackDeterministic,
}

/// Statistics about a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Seed actually used. Replaying it reproduces the result.
    pub seed: u64,
    /// Strategy that produced the result.
    pub strategy: Strategy,
    /// Randomized search restarts (each with a fresh shuffle).
    pub attempts: u64,
    /// Assignments undone during the randomized search.
    pub backtracks: u64,
    /// Swaps and rotations applied by the fallback.
    pub fallback_swaps: usize,
    /// Wall-clock time spent generating.
    pub elapsed: Duration,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// The candidate assignment (not yet validated).
    pub assignments: AssignmentSet,
    /// Run statistics.
    pub report: GenerationReport,
}
