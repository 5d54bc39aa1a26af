//! Gift-exchange assignment engine.
//!
//! Given a group of participants and pairwise exclusions (e.g. spouses
//! must not draw each other), produces a randomized, reproducible
//! derangement in which everyone gives exactly one gift and receives
//! exactly one gift:
//!
//! - **Model**: [`model::ConstraintModel`] — directed compatibility graph
//!   built from eligible participants and symmetric exclusions.
//! - **Matching**: [`matching::FeasibilityChecker`] — perfect-matching gate
//!   (Hopcroft–Karp) that proves infeasibility with a minimal Hall
//!   obstruction.
//! - **Generator**: [`generator::AssignmentGenerator`] — seeded randomized
//!   backtracking with a bounded budget and a matching-based fallback.
//! - **Validation**: [`validation::AssignmentValidator`] — independent
//!   fail-closed re-check of every invariant.
//! - **Persistence**: [`persist::AssignmentPersister`] — all-or-nothing
//!   replacement boundary, with [`persist::Notifier`] hooks.
//! - **Engine**: [`engine::AssignmentEngine`] — the pipeline under a
//!   per-group lock.
//!
//! # Architecture
//!
//! Generation is synchronous and CPU-bound with no process-wide state.
//! Scheduling, storage schemas, authorization and delivery of
//! notifications belong to the surrounding service.

pub mod assignment;
pub mod engine;
pub mod error;
pub mod generator;
pub mod matching;
pub mod model;
pub mod persist;
pub mod validation;

pub use assignment::{Assignment, AssignmentSet};
pub use engine::{plan_assignments, AssignmentEngine};
pub use error::AssignmentError;
pub use generator::GeneratorConfig;
