//! Randomized derangement search with a matching fallback.
//!
//! # Algorithm
//!
//! 1. Shuffle the santas with a seeded RNG
//! 2. Depth-first over the shuffled santas: each draws a uniformly random
//!    untaken recipient from `allowed(santa)`; a draw that leaves a later
//!    santa without candidates is undone immediately (forward check)
//! 3. Exhausted candidates pop back to the previous santa (backtrack).
//!    After `n` backtracks in one attempt the search restarts with a
//!    fresh shuffle
//! 4. When the total backtrack budget is spent, compute a perfect matching
//!    with Hopcroft–Karp and randomize it with swaps and 3-rotations that
//!    keep every edge allowed
//! 5. If no move is admissible, return the matching unchanged
//!
//! The deadline and cancellation flag bound step 2–3; hitting either fails
//! the run instead of falling back.

use super::config::GeneratorConfig;
use super::types::{GenerationReport, GenerationResult, Strategy};
use crate::assignment::AssignmentSet;
use crate::error::AssignmentError;
use crate::matching::maximum_matching;
use crate::model::ConstraintModel;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

const NIL: usize = usize::MAX;

/// Clock is sampled once per this many search steps.
const DEADLINE_CHECK_INTERVAL: u64 = 64;

/// Produces randomized derangements for a [`ConstraintModel`].
///
/// The model is expected to be feasible (see
/// [`FeasibilityChecker`](crate::matching::FeasibilityChecker)). On an
/// infeasible model the fallback cannot complete and the run fails with
/// [`AssignmentError::RetryBudgetExhausted`].
pub struct AssignmentGenerator;

impl AssignmentGenerator {
    /// Runs generation.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_exchange::generator::{AssignmentGenerator, GeneratorConfig};
    /// use u_exchange::model::{ConstraintModel, Exclusion, ParticipantId};
    ///
    /// let roster: Vec<ParticipantId> = ["a", "b", "c", "d"].into_iter().map(Into::into).collect();
    /// let model = ConstraintModel::from_roster("g", roster, &[Exclusion::new("a", "b")]).unwrap();
    ///
    /// let result = AssignmentGenerator::run(&model, &GeneratorConfig::default().with_seed(1)).unwrap();
    /// assert_eq!(result.assignments.len(), 4);
    /// assert_eq!(result.report.seed, 1);
    /// ```
    pub fn run(
        model: &ConstraintModel,
        config: &GeneratorConfig,
    ) -> Result<GenerationResult, AssignmentError> {
        Self::run_with_cancel(model, config, None)
    }

    /// Runs generation with an optional cancellation token.
    pub fn run_with_cancel(
        model: &ConstraintModel,
        config: &GeneratorConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GenerationResult, AssignmentError> {
        config.validate().map_err(AssignmentError::InvalidConfig)?;

        let started = Instant::now();
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut search = Search::new(model, config.effective_retry_budget(model.len()));
        let outcome = search.run(&mut rng, |steps| {
            if cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Some("cancelled");
            }
            let check_clock = steps % DEADLINE_CHECK_INTERVAL == 0;
            if check_clock && config.deadline.is_some_and(|d| started.elapsed() >= d) {
                return Some("deadline elapsed");
            }
            None
        });

        let (perm, strategy, fallback_swaps) = match outcome {
            SearchOutcome::Found(perm) => (perm, Strategy::Randomized, 0),
            SearchOutcome::Interrupted(reason) => {
                tracing::warn!(
                    group = %model.group(),
                    attempts = search.attempts,
                    backtracks = search.backtracks,
                    reason,
                    "randomized search interrupted"
                );
                return Err(AssignmentError::RetryBudgetExhausted {
                    attempts: search.attempts,
                    reason: reason.into(),
                });
            }
            SearchOutcome::BudgetSpent => {
                tracing::debug!(
                    group = %model.group(),
                    attempts = search.attempts,
                    backtracks = search.backtracks,
                    "retry budget spent, using matching fallback"
                );
                let mut perm = fallback_matching(model).ok_or_else(|| {
                    tracing::error!(
                        group = %model.group(),
                        "fallback matcher found no perfect matching"
                    );
                    AssignmentError::RetryBudgetExhausted {
                        attempts: search.attempts,
                        reason: "fallback matcher found no perfect matching".into(),
                    }
                })?;
                let swaps = shuffle_matching(model, &mut perm, config.swap_rounds, &mut rng);
                let strategy = if swaps > 0 {
                    Strategy::FallbackShuffled
                } else {
                    Strategy::FallbackDeterministic
                };
                (perm, strategy, swaps)
            }
        };

        let report = GenerationReport {
            seed,
            strategy,
            attempts: search.attempts,
            backtracks: search.backtracks,
            fallback_swaps,
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            group = %model.group(),
            seed,
            strategy = ?strategy,
            attempts = report.attempts,
            backtracks = report.backtracks,
            "assignment generated"
        );

        Ok(GenerationResult {
            assignments: AssignmentSet::from_permutation(model, &perm),
            report,
        })
    }
}

enum SearchOutcome {
    Found(Vec<usize>),
    BudgetSpent,
    Interrupted(&'static str),
}

/// Depth-first state for one group.
struct Search<'a> {
    model: &'a ConstraintModel,
    budget: u64,
    attempts: u64,
    backtracks: u64,
    steps: u64,
}

/// Candidates of the santa at one depth, tried in order.
struct Frame {
    santa: usize,
    candidates: Vec<usize>,
    cursor: usize,
}

impl<'a> Search<'a> {
    fn new(model: &'a ConstraintModel, budget: u64) -> Self {
        Self {
            model,
            budget,
            attempts: 0,
            backtracks: 0,
            steps: 0,
        }
    }

    fn run<R, F>(&mut self, rng: &mut R, mut interrupt: F) -> SearchOutcome
    where
        R: Rng,
        F: FnMut(u64) -> Option<&'static str>,
    {
        if self.budget == 0 {
            return SearchOutcome::BudgetSpent;
        }
        let n = self.model.len();
        let restart_after = n as u64;

        while self.backtracks < self.budget {
            self.attempts += 1;
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(rng);

            match self.attempt(&order, rng, restart_after, &mut interrupt) {
                AttemptOutcome::Found(perm) => return SearchOutcome::Found(perm),
                AttemptOutcome::Interrupted(reason) => return SearchOutcome::Interrupted(reason),
                AttemptOutcome::Restart => {}
            }
        }
        SearchOutcome::BudgetSpent
    }

    fn attempt<R, F>(
        &mut self,
        order: &[usize],
        rng: &mut R,
        restart_after: u64,
        interrupt: &mut F,
    ) -> AttemptOutcome
    where
        R: Rng,
        F: FnMut(u64) -> Option<&'static str>,
    {
        let n = order.len();
        let mut perm = vec![NIL; n];
        let mut taken = vec![false; n];
        let mut local_backtracks = 0u64;
        let mut stack = vec![self.frame(order[0], &taken, rng)];

        while let Some(frame) = stack.last_mut() {
            self.steps += 1;
            if let Some(reason) = interrupt(self.steps) {
                return AttemptOutcome::Interrupted(reason);
            }

            let santa = frame.santa;
            if frame.cursor == frame.candidates.len() {
                // Exhausted: undo the previous santa's draw.
                stack.pop();
                if let Some(prev) = stack.last() {
                    taken[perm[prev.santa]] = false;
                    perm[prev.santa] = NIL;
                }
                self.backtracks += 1;
                local_backtracks += 1;
                if self.backtracks >= self.budget || local_backtracks >= restart_after {
                    return AttemptOutcome::Restart;
                }
                continue;
            }

            let recipient = frame.candidates[frame.cursor];
            frame.cursor += 1;

            perm[santa] = recipient;
            taken[recipient] = true;
            let depth = stack.len();

            if depth == n {
                return AttemptOutcome::Found(perm);
            }

            if !self.others_have_candidates(&order[depth..], &taken) {
                taken[recipient] = false;
                perm[santa] = NIL;
                self.backtracks += 1;
                local_backtracks += 1;
                if self.backtracks >= self.budget || local_backtracks >= restart_after {
                    return AttemptOutcome::Restart;
                }
                continue;
            }

            let next = self.frame(order[depth], &taken, rng);
            stack.push(next);
        }

        AttemptOutcome::Restart
    }

    fn frame<R: Rng>(&self, santa: usize, taken: &[bool], rng: &mut R) -> Frame {
        let mut candidates: Vec<usize> = self
            .model
            .allowed(santa)
            .iter()
            .copied()
            .filter(|&r| !taken[r])
            .collect();
        candidates.shuffle(rng);
        Frame {
            santa,
            candidates,
            cursor: 0,
        }
    }

    fn others_have_candidates(&self, pending: &[usize], taken: &[bool]) -> bool {
        pending
            .iter()
            .all(|&s| self.model.allowed(s).iter().any(|&r| !taken[r]))
    }
}

enum AttemptOutcome {
    Found(Vec<usize>),
    Restart,
    Interrupted(&'static str),
}

/// Deterministic perfect matching as `perm[santa] = recipient`.
fn fallback_matching(model: &ConstraintModel) -> Option<Vec<usize>> {
    let santas: Vec<usize> = (0..model.len()).collect();
    maximum_matching(model.len(), &santas, |s| model.allowed(s)).to_permutation()
}

/// Randomizes a valid permutation in place with moves that keep every
/// edge allowed. Returns the number of moves applied.
///
/// Proposals alternate between a 2-swap (`i` and `j` trade recipients)
/// and a 3-rotation (`i <- perm[j]`, `j <- perm[k]`, `k <- perm[i]`).
fn shuffle_matching<R: Rng>(
    model: &ConstraintModel,
    perm: &mut [usize],
    rounds: usize,
    rng: &mut R,
) -> usize {
    let n = perm.len();
    let mut applied = 0;

    for _ in 0..rounds.saturating_mul(n) {
        let i = rng.random_range(0..n);
        let j = rng.random_range(0..n);
        if i == j {
            continue;
        }

        if n >= 3 && rng.random_bool(0.5) {
            let k = rng.random_range(0..n);
            if k == i || k == j {
                continue;
            }
            let (pi, pj, pk) = (perm[i], perm[j], perm[k]);
            if model.is_allowed(i, pj) && model.is_allowed(j, pk) && model.is_allowed(k, pi) {
                perm[i] = pj;
                perm[j] = pk;
                perm[k] = pi;
                applied += 1;
            }
        } else {
            let (pi, pj) = (perm[i], perm[j]);
            if model.is_allowed(i, pj) && model.is_allowed(j, pi) {
                perm.swap(i, j);
                applied += 1;
            }
        }
    }
    applied
}
