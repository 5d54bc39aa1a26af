//! Post-generation invariant checks.
//!
//! Re-verifies a produced [`AssignmentSet`] against the roster and
//! exclusions without trusting anything the generator computed. Detects:
//! - A set labelled with another group
//! - Wrong edge count
//! - Santas or recipients outside the roster
//! - Participants giving or receiving other than exactly once
//! - Self-assignments
//! - Edges coinciding with an exclusion (either direction)
//! - Participants not covered by a closed gift cycle

use crate::assignment::AssignmentSet;
use crate::error::AssignmentError;
use crate::model::{ConstraintModel, ParticipantId};
use std::collections::HashMap;
use std::fmt;

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    /// Violation category.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of assignment violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViolationKind {
    /// The set belongs to a different group than the roster.
    GroupMismatch,
    /// Number of edges differs from the number of participants.
    EdgeCount,
    /// An edge names someone outside the eligible roster.
    UnknownParticipant,
    /// A participant gives zero or several gifts.
    OutDegree,
    /// A participant receives zero or several gifts.
    InDegree,
    /// A participant draws themselves.
    SelfAssignment,
    /// An edge joins an excluded pair.
    ExcludedPair,
    /// Following gifts from a participant does not lead back to them.
    OpenCycle,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Fail-closed checker for produced assignments.
pub struct AssignmentValidator;

impl AssignmentValidator {
    /// Collects every violation of `set` against `model`.
    ///
    /// Returns an empty list when the set is a derangement of the roster
    /// that avoids all exclusions.
    pub fn violations(model: &ConstraintModel, set: &AssignmentSet) -> Vec<Violation> {
        let mut violations = Vec::new();
        let roster = model.participants();

        if set.group() != model.group() {
            violations.push(Violation::new(
                ViolationKind::GroupMismatch,
                format!("set is for group '{}', roster is '{}'", set.group(), model.group()),
            ));
        }

        if set.len() != roster.len() {
            violations.push(Violation::new(
                ViolationKind::EdgeCount,
                format!("expected {} assignments, found {}", roster.len(), set.len()),
            ));
        }

        let mut out_degree: HashMap<&ParticipantId, usize> = HashMap::new();
        let mut in_degree: HashMap<&ParticipantId, usize> = HashMap::new();
        let mut next: HashMap<&ParticipantId, &ParticipantId> = HashMap::new();

        for a in set {
            for id in [&a.santa, &a.recipient] {
                if model.index_of(id).is_none() {
                    violations.push(Violation::new(
                        ViolationKind::UnknownParticipant,
                        format!("'{id}' is not an eligible participant"),
                    ));
                }
            }
            if a.santa == a.recipient {
                violations.push(Violation::new(
                    ViolationKind::SelfAssignment,
                    format!("'{}' draws themselves", a.santa),
                ));
            }
            if model.is_excluded(&a.santa, &a.recipient) {
                violations.push(Violation::new(
                    ViolationKind::ExcludedPair,
                    format!("'{}' -> '{}' joins an excluded pair", a.santa, a.recipient),
                ));
            }
            *out_degree.entry(&a.santa).or_default() += 1;
            *in_degree.entry(&a.recipient).or_default() += 1;
            next.insert(&a.santa, &a.recipient);
        }

        for id in roster {
            let out = out_degree.get(id).copied().unwrap_or(0);
            if out != 1 {
                violations.push(Violation::new(
                    ViolationKind::OutDegree,
                    format!("'{id}' gives {out} gift(s)"),
                ));
            }
            let inc = in_degree.get(id).copied().unwrap_or(0);
            if inc != 1 {
                violations.push(Violation::new(
                    ViolationKind::InDegree,
                    format!("'{id}' receives {inc} gift(s)"),
                ));
            }
        }

        // Walk from each participant; a permutation returns within n steps.
        for id in roster {
            let mut cur = id;
            let mut closed = false;
            for _ in 0..roster.len() {
                match next.get(cur) {
                    Some(&r) => cur = r,
                    None => break,
                }
                if cur == id {
                    closed = true;
                    break;
                }
            }
            if !closed {
                violations.push(Violation::new(
                    ViolationKind::OpenCycle,
                    format!("gifts from '{id}' never return to them"),
                ));
            }
        }

        violations
    }

    /// Validates `set`, failing with [`AssignmentError::InvariantViolation`].
    ///
    /// A failure here is a generator defect, so it is logged at error level.
    pub fn validate(model: &ConstraintModel, set: &AssignmentSet) -> Result<(), AssignmentError> {
        let violations = Self::violations(model, set);
        if violations.is_empty() {
            return Ok(());
        }
        for v in &violations {
            tracing::error!(group = %model.group(), kind = ?v.kind, "{}", v.message);
        }
        Err(AssignmentError::InvariantViolation { violations })
    }
}
