//! Compatibility graph built from a roster and its exclusions.

use super::participant::{eligible_roster, Exclusion, GroupId, Participant, ParticipantId};
use crate::error::AssignmentError;
use std::collections::{BTreeSet, HashMap};

/// Directed compatibility graph for one group.
///
/// Participants are addressed by dense indices `0..n` in roster order.
/// `allowed(p)` is every other participant not excluded from `p`.
/// Exclusions are symmetric, so the graph is too.
///
/// Compatibility is kept as a dense `n * n` matrix next to the adjacency
/// lists. That is sized for gift-exchange groups (tens to a few thousand
/// participants); a roster of 10 000 already costs 100 MB, and a roster
/// whose cell count overflows `usize` is rejected with
/// [`AssignmentError::InvalidConfig`].
///
/// # Examples
///
/// ```
/// use u_exchange::model::{ConstraintModel, Exclusion, ParticipantId};
///
/// let roster: Vec<ParticipantId> = ["a", "b", "c"].into_iter().map(Into::into).collect();
/// let model = ConstraintModel::from_roster("g", roster, &[Exclusion::new("a", "b")]).unwrap();
///
/// assert_eq!(model.len(), 3);
/// assert_eq!(model.allowed(0), &[2]);
/// assert!(!model.is_allowed(0, 1));
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    group: GroupId,
    participants: Vec<ParticipantId>,
    index: HashMap<ParticipantId, usize>,
    /// Row-major `n * n`; `true` where `i -> j` is permitted.
    compatible: Vec<bool>,
    allowed: Vec<Vec<usize>>,
    /// Normalized `(i, j)` with `i < j`.
    exclusions: BTreeSet<(usize, usize)>,
}

impl ConstraintModel {
    /// Builds the model for `group` from a full participant list.
    ///
    /// Only eligible members of `group` are kept.
    pub fn build(
        group: impl Into<GroupId>,
        participants: &[Participant],
        exclusions: &[Exclusion],
    ) -> Result<Self, AssignmentError> {
        let group = group.into();
        let roster = eligible_roster(&group, participants);
        Self::from_roster(group, roster, exclusions)
    }

    /// Builds the model from an already filtered roster.
    ///
    /// Fails with [`AssignmentError::DegenerateGroup`] when fewer than two
    /// distinct participants remain.
    pub fn from_roster(
        group: impl Into<GroupId>,
        roster: Vec<ParticipantId>,
        exclusions: &[Exclusion],
    ) -> Result<Self, AssignmentError> {
        let group = group.into();

        let mut participants = Vec::with_capacity(roster.len());
        let mut index = HashMap::with_capacity(roster.len());
        for id in roster {
            if index.contains_key(&id) {
                tracing::warn!(group = %group, participant = %id, "duplicate participant ignored");
                continue;
            }
            index.insert(id.clone(), participants.len());
            participants.push(id);
        }

        let n = participants.len();
        if n < 2 {
            return Err(AssignmentError::DegenerateGroup { eligible: n });
        }

        let cells = n.checked_mul(n).ok_or_else(|| {
            AssignmentError::InvalidConfig(format!("roster of {n} participants is too large"))
        })?;
        let mut compatible = vec![true; cells];
        for i in 0..n {
            compatible[i * n + i] = false;
        }

        let mut pairs = BTreeSet::new();
        for ex in exclusions {
            if ex.is_reflexive() {
                tracing::warn!(group = %group, participant = %ex.a, "self-exclusion ignored");
                continue;
            }
            let (Some(&i), Some(&j)) = (index.get(&ex.a), index.get(&ex.b)) else {
                tracing::warn!(
                    group = %group,
                    a = %ex.a,
                    b = %ex.b,
                    "exclusion names a participant outside the eligible roster, ignored"
                );
                continue;
            };
            compatible[i * n + j] = false;
            compatible[j * n + i] = false;
            pairs.insert((i.min(j), i.max(j)));
        }

        let allowed = (0..n)
            .map(|i| (0..n).filter(|&j| compatible[i * n + j]).collect())
            .collect();

        tracing::debug!(
            group = %group,
            participants = n,
            exclusions = pairs.len(),
            "constraint model built"
        );

        Ok(Self {
            group,
            participants,
            index,
            compatible,
            allowed,
            exclusions: pairs,
        })
    }

    /// Number of eligible participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Always false; a model holds at least two participants.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    /// Participants in index order.
    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn participant(&self, i: usize) -> &ParticipantId {
        &self.participants[i]
    }

    pub fn index_of(&self, id: &ParticipantId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Recipients participant `i` may draw, ascending.
    pub fn allowed(&self, i: usize) -> &[usize] {
        &self.allowed[i]
    }

    /// Whether `santa -> recipient` is permitted.
    pub fn is_allowed(&self, santa: usize, recipient: usize) -> bool {
        self.compatible[santa * self.len() + recipient]
    }

    /// Whether the two participants are an excluded pair.
    pub fn is_excluded(&self, a: &ParticipantId, b: &ParticipantId) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.exclusions.contains(&(i.min(j), i.max(j))),
            _ => false,
        }
    }

    /// Effective exclusions (after dropping ignored ones), as id pairs.
    pub fn exclusions(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantId)> + '_ {
        self.exclusions
            .iter()
            .map(|&(i, j)| (&self.participants[i], &self.participants[j]))
    }

    pub fn exclusion_count(&self) -> usize {
        self.exclusions.len()
    }

    /// Union of `allowed` over the given santas, ascending.
    pub fn neighborhood(&self, santas: &[usize]) -> Vec<usize> {
        let mut seen = vec![false; self.len()];
        for &s in santas {
            for &r in self.allowed(s) {
                seen[r] = true;
            }
        }
        seen.iter()
            .enumerate()
            .filter_map(|(r, &hit)| hit.then_some(r))
            .collect()
    }
}
