//! Bipartite matching and feasibility checking.
//!
//! A valid gift assignment is a perfect matching in the bipartite graph
//! whose left side holds the santa-roles and right side the
//! recipient-roles, with an edge `p -> q` iff `q ∈ allowed(p)`.
//!
//! # Key Components
//!
//! - [`maximum_matching`] — Hopcroft–Karp over an arbitrary adjacency
//! - [`FeasibilityChecker`] — perfect-matching gate producing either a
//!   witness [`Matching`] or an [`ObstructionCertificate`]
//!
//! # References
//!
//! - Hall, P. (1935). "On Representatives of Subsets", *J. London Math. Soc.* 10, 26-30.
//! - Hopcroft & Karp (1973), "An n^{5/2} Algorithm for Maximum Matchings in Bipartite Graphs"

mod feasibility;
mod hopcroft_karp;

pub use feasibility::{Feasibility, FeasibilityChecker, ObstructionCertificate};
pub use hopcroft_karp::{maximum_matching, Matching};
