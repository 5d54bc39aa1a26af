//! Feasibility gate and Hall-obstruction certificates.

use super::hopcroft_karp::{maximum_matching, Matching};
use crate::error::AssignmentError;
use crate::model::{ConstraintModel, ParticipantId};
use std::fmt;

/// Proof that no valid assignment exists.
///
/// A set `S` of santas whose combined allowed recipients `N(S)` satisfy
/// `|N(S)| < |S|`. The set is minimal: dropping any one member leaves a
/// set that can be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObstructionCertificate {
    participants: Vec<ParticipantId>,
    allowed_recipients: Vec<ParticipantId>,
}

impl ObstructionCertificate {
    /// The conflicting participants `S`.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    /// Everyone the participants in `S` may give to, `N(S)`.
    pub fn allowed_recipients(&self) -> &[ParticipantId] {
        &self.allowed_recipients
    }

    /// `|S| - |N(S)|`, always at least 1.
    pub fn deficiency(&self) -> usize {
        self.participants.len() - self.allowed_recipients.len()
    }
}

impl fmt::Display for ObstructionCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ids: &[ParticipantId]| {
            ids.iter()
                .map(ParticipantId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{} participant(s) [{}] can only give to {} recipient(s) [{}]",
            self.participants.len(),
            join(&self.participants),
            self.allowed_recipients.len(),
            join(&self.allowed_recipients),
        )
    }
}

/// Outcome of a feasibility check.
#[derive(Debug, Clone)]
pub enum Feasibility {
    /// A perfect matching exists; one is attached.
    Feasible(Matching),
    /// No perfect matching exists.
    Infeasible(ObstructionCertificate),
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible(_))
    }
}

/// Decides whether a constraint model admits a valid assignment.
///
/// A derangement respecting the exclusions is exactly a perfect matching
/// in the santa/recipient bipartite graph, since `p ∉ allowed(p)`.
pub struct FeasibilityChecker;

impl FeasibilityChecker {
    /// Runs the check.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_exchange::matching::FeasibilityChecker;
    /// use u_exchange::model::{ConstraintModel, Exclusion, ParticipantId};
    ///
    /// let roster: Vec<ParticipantId> = vec!["a".into(), "b".into()];
    /// let model = ConstraintModel::from_roster("g", roster, &[Exclusion::new("a", "b")]).unwrap();
    /// assert!(!FeasibilityChecker::check(&model).is_feasible());
    /// ```
    pub fn check(model: &ConstraintModel) -> Feasibility {
        let santas: Vec<usize> = (0..model.len()).collect();
        let matching = maximum_matching(model.len(), &santas, |s| model.allowed(s));

        if matching.is_perfect() {
            tracing::debug!(group = %model.group(), "constraints feasible");
            return Feasibility::Feasible(matching);
        }

        let certificate = Self::certificate(model, &matching);
        tracing::debug!(
            group = %model.group(),
            matched = matching.size(),
            participants = model.len(),
            obstruction = certificate.participants().len(),
            "constraints infeasible"
        );
        Feasibility::Infeasible(certificate)
    }

    /// Like [`check`](Self::check), but maps infeasibility to
    /// [`AssignmentError::InfeasibleConstraints`].
    pub fn require(model: &ConstraintModel) -> Result<Matching, AssignmentError> {
        match Self::check(model) {
            Feasibility::Feasible(m) => Ok(m),
            Feasibility::Infeasible(certificate) => {
                Err(AssignmentError::InfeasibleConstraints { certificate })
            }
        }
    }

    /// Extracts a minimal Hall violator from a non-perfect maximum matching.
    fn certificate(model: &ConstraintModel, matching: &Matching) -> ObstructionCertificate {
        let n = model.len();
        let mut set = match matching.unmatched_santas().next() {
            Some(free) => alternating_reach(model, matching, free),
            None => (0..n).collect(),
        };

        // "Contains a violator" is closed under supersets, so a single pass
        // leaves a set whose every proper subset is matchable.
        let mut i = 0;
        while i < set.len() {
            let candidate: Vec<usize> = set
                .iter()
                .enumerate()
                .filter_map(|(k, &s)| (k != i).then_some(s))
                .collect();
            let m = maximum_matching(n, &candidate, |s| model.allowed(s));
            if m.size() < candidate.len() {
                set = candidate;
            } else {
                i += 1;
            }
        }

        set.sort_unstable();
        let neighborhood = model.neighborhood(&set);
        ObstructionCertificate {
            participants: set.iter().map(|&s| model.participant(s).clone()).collect(),
            allowed_recipients: neighborhood
                .iter()
                .map(|&r| model.participant(r).clone())
                .collect(),
        }
    }
}

/// Santas reachable from `free` by alternating paths.
///
/// With a maximum matching every reachable recipient is matched, so the
/// result `S` has `|N(S)| = |S| - 1`.
fn alternating_reach(model: &ConstraintModel, matching: &Matching, free: usize) -> Vec<usize> {
    let n = model.len();
    let mut seen_santa = vec![false; n];
    let mut seen_recipient = vec![false; n];
    let mut stack = vec![free];
    seen_santa[free] = true;

    while let Some(s) = stack.pop() {
        for &r in model.allowed(s) {
            if seen_recipient[r] {
                continue;
            }
            seen_recipient[r] = true;
            if let Some(next) = matching.santa_of(r) {
                if !seen_santa[next] {
                    seen_santa[next] = true;
                    stack.push(next);
                }
            }
        }
    }

    (0..n).filter(|&s| seen_santa[s]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Exclusion;

    fn model(ids: &[&str], excl: &[(&str, &str)]) -> ConstraintModel {
        let roster = ids.iter().map(|&s| s.into()).collect();
        let exclusions: Vec<Exclusion> = excl.iter().map(|&(a, b)| Exclusion::new(a, b)).collect();
        ConstraintModel::from_roster("g", roster, &exclusions).unwrap()
    }

    fn assert_violates(model: &ConstraintModel, cert: &ObstructionCertificate) {
        let idx: Vec<usize> = cert
            .participants()
            .iter()
            .map(|p| model.index_of(p).unwrap())
            .collect();
        let hood = model.neighborhood(&idx);
        assert!(
            hood.len() < idx.len(),
            "|N(S)| = {} must be < |S| = {}",
            hood.len(),
            idx.len()
        );
        assert_eq!(hood.len(), cert.allowed_recipients().len());
    }

    #[test]
    fn test_pair_not_excluded() {
        let m = model(&["a", "b"], &[]);
        match FeasibilityChecker::check(&m) {
            Feasibility::Feasible(matching) => {
                assert_eq!(matching.to_permutation(), Some(vec![1, 0]));
            }
            Feasibility::Infeasible(c) => panic!("unexpected obstruction: {c}"),
        }
    }

    #[test]
    fn test_pair_excluded() {
        let m = model(&["a", "b"], &[("a", "b")]);
        let Feasibility::Infeasible(cert) = FeasibilityChecker::check(&m) else {
            panic!("expected infeasible");
        };
        assert_eq!(cert.participants().len(), 1);
        assert!(cert.allowed_recipients().is_empty());
        assert_eq!(cert.deficiency(), 1);
        assert_violates(&m, &cert);
    }

    #[test]
    fn test_three_share_one_recipient() {
        // a, b, c may only give to d.
        let m = model(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "c")],
        );
        let Feasibility::Infeasible(cert) = FeasibilityChecker::check(&m) else {
            panic!("expected infeasible");
        };
        // Any two of {a, b, c} already fight over d.
        assert_eq!(cert.participants().len(), 2);
        assert_eq!(cert.allowed_recipients(), &[ParticipantId::from("d")]);
        assert_violates(&m, &cert);
        assert!(cert.to_string().contains("can only give to 1 recipient(s) [d]"));
    }

    #[test]
    fn test_certificate_is_minimal() {
        // a is excluded from everyone else.
        let m = model(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("a", "c"), ("a", "d"), ("a", "e")],
        );
        let Feasibility::Infeasible(cert) = FeasibilityChecker::check(&m) else {
            panic!("expected infeasible");
        };
        assert_eq!(cert.participants(), &[ParticipantId::from("a")]);
        assert_violates(&m, &cert);
    }

    #[test]
    fn test_require() {
        let m = model(&["a", "b", "c", "d"], &[("a", "b")]);
        let matching = FeasibilityChecker::require(&m).unwrap();
        assert!(matching.is_perfect());

        // a and b both have only c left.
        let m = model(&["a", "b", "c"], &[("a", "b")]);
        let err = FeasibilityChecker::require(&m).unwrap_err();
        match err {
            AssignmentError::InfeasibleConstraints { certificate } => {
                assert_eq!(certificate.participants().len(), 2);
                assert_eq!(certificate.allowed_recipients(), &[ParticipantId::from("c")]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let m = model(&["a", "b"], &[("a", "b")]);
        let err = FeasibilityChecker::require(&m).unwrap_err();
        assert!(matches!(err, AssignmentError::InfeasibleConstraints { .. }));
    }
}
