//! Randomized assignment generation.
//!
//! Produces an unpredictable derangement that respects all exclusions.
//! A seeded depth-first search with forward checking does the work;
//! a bounded backtrack budget guarantees termination by switching to a
//! Hopcroft–Karp matching randomized with constraint-preserving moves.
//!
//! # References
//!
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems" (forward checking)
//! - Gomes, Selman & Kautz (1998), "Boosting Combinatorial Search Through
//!   Randomization" (randomized restarts)

mod config;
mod runner;
mod types;

pub use config::GeneratorConfig;
pub use runner::AssignmentGenerator;
pub use types::{GenerationReport, GenerationResult, Strategy};
