//! Error taxonomy for the assignment pipeline.

use crate::matching::ObstructionCertificate;
use crate::validation::Violation;

/// Opaque failure surfaced by an [`AssignmentPersister`](crate::persist::AssignmentPersister).
pub type PersistError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of an assignment run.
///
/// Every component of the pipeline reports its failure mode through this
/// type; nothing is signalled by panicking.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// Fewer than two eligible participants. Nobody can be deranged.
    #[error("degenerate group: {eligible} eligible participant(s), at least 2 required")]
    DegenerateGroup { eligible: usize },

    /// No perfect matching exists in the compatibility graph.
    ///
    /// The certificate names a minimal set of participants whose combined
    /// allowed recipients are too few to go around.
    #[error("infeasible constraints: {certificate}")]
    InfeasibleConstraints { certificate: ObstructionCertificate },

    /// Search ran out of time, was cancelled, or the fallback matcher
    /// could not complete.
    #[error("retry budget exhausted after {attempts} attempt(s): {reason}")]
    RetryBudgetExhausted { attempts: u64, reason: String },

    /// A produced assignment failed post-generation validation.
    ///
    /// This indicates a defect in the generator, never bad input.
    #[error("assignment invariant violated: {}", summarize(.violations))]
    InvariantViolation { violations: Vec<Violation> },

    /// Generator options are out of range.
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    /// The persistence boundary rejected the commit.
    #[error("persistence failed: {0}")]
    Persistence(#[source] PersistError),
}

impl AssignmentError {
    /// Whether the failure can be fixed by changing the input (roster,
    /// exclusions or options) rather than the code.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AssignmentError::DegenerateGroup { .. }
                | AssignmentError::InfeasibleConstraints { .. }
                | AssignmentError::InvalidConfig(_)
        )
    }
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no details".into(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}
