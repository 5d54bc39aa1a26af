//! Assignment sets and their cycle structure.

use crate::model::{ConstraintModel, GroupId, ParticipantId};
use std::collections::{HashMap, HashSet};

/// A directed gift edge: `santa` gives to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub santa: ParticipantId,
    pub recipient: ParticipantId,
}

impl Assignment {
    pub fn new(santa: impl Into<ParticipantId>, recipient: impl Into<ParticipantId>) -> Self {
        Self {
            santa: santa.into(),
            recipient: recipient.into(),
        }
    }
}

/// The assignments of one group.
///
/// Order is irrelevant; edges are kept sorted by santa so two sets with
/// the same edges compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentSet {
    group: GroupId,
    assignments: Vec<Assignment>,
}

impl AssignmentSet {
    /// Wraps raw edges. No invariant is checked here; see
    /// [`AssignmentValidator`](crate::validation::AssignmentValidator).
    pub fn new(group: impl Into<GroupId>, mut assignments: Vec<Assignment>) -> Self {
        assignments.sort();
        Self {
            group: group.into(),
            assignments,
        }
    }

    /// Builds a set from `perm[santa] = recipient` over model indices.
    pub(crate) fn from_permutation(model: &ConstraintModel, perm: &[usize]) -> Self {
        let assignments = perm
            .iter()
            .enumerate()
            .map(|(s, &r)| Assignment {
                santa: model.participant(s).clone(),
                recipient: model.participant(r).clone(),
            })
            .collect();
        Self::new(model.group().clone(), assignments)
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.assignments.iter()
    }

    pub fn as_slice(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Recipient drawn by `santa`.
    pub fn recipient_of(&self, santa: &ParticipantId) -> Option<&ParticipantId> {
        self.assignments
            .binary_search_by(|a| a.santa.cmp(santa))
            .ok()
            .map(|i| &self.assignments[i].recipient)
    }

    /// Santa giving to `recipient`.
    pub fn santa_of(&self, recipient: &ParticipantId) -> Option<&ParticipantId> {
        self.assignments
            .iter()
            .find(|a| &a.recipient == recipient)
            .map(|a| &a.santa)
    }

    pub fn contains(&self, santa: &ParticipantId, recipient: &ParticipantId) -> bool {
        self.recipient_of(santa) == Some(recipient)
    }

    /// Decomposes the edges into gift cycles.
    ///
    /// Each cycle starts at its smallest santa and follows the gift
    /// direction. For a valid set every participant lies on exactly one
    /// cycle; a walk that does not close is still returned as-is.
    pub fn cycles(&self) -> Vec<Vec<ParticipantId>> {
        let next: HashMap<&ParticipantId, &ParticipantId> = self
            .assignments
            .iter()
            .map(|a| (&a.santa, &a.recipient))
            .collect();

        let mut visited: HashSet<&ParticipantId> = HashSet::new();
        let mut cycles = Vec::new();
        for a in &self.assignments {
            if visited.contains(&a.santa) {
                continue;
            }
            let mut cycle = Vec::new();
            let mut cur = &a.santa;
            while visited.insert(cur) {
                cycle.push(cur.clone());
                match next.get(cur) {
                    Some(&r) => cur = r,
                    None => break,
                }
            }
            cycles.push(cycle);
        }
        cycles
    }

    /// Cycle lengths, ascending. `[2, 3]` means one pair swap plus a
    /// three-way ring.
    pub fn cycle_structure(&self) -> Vec<usize> {
        let mut lengths: Vec<usize> = self.cycles().iter().map(Vec::len).collect();
        lengths.sort_unstable();
        lengths
    }
}

impl<'a> IntoIterator for &'a AssignmentSet {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(edges: &[(&str, &str)]) -> AssignmentSet {
        AssignmentSet::new(
            "g",
            edges.iter().map(|&(s, r)| Assignment::new(s, r)).collect(),
        )
    }

    #[test]
    fn test_order_irrelevant() {
        let a = set(&[("a", "b"), ("b", "a")]);
        let b = set(&[("b", "a"), ("a", "b")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup() {
        let s = set(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(s.recipient_of(&"a".into()), Some(&"b".into()));
        assert_eq!(s.santa_of(&"a".into()), Some(&"c".into()));
        assert!(s.contains(&"b".into(), &"c".into()));
        assert!(!s.contains(&"c".into(), &"b".into()));
        assert_eq!(s.recipient_of(&"z".into()), None);
    }

    #[test]
    fn test_cycles() {
        let s = set(&[("a", "b"), ("b", "a"), ("c", "e"), ("d", "c"), ("e", "d")]);
        let cycles = s.cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec![ParticipantId::from("a"), "b".into()]);
        assert_eq!(cycles[1], vec![ParticipantId::from("c"), "e".into(), "d".into()]);
        assert_eq!(s.cycle_structure(), vec![2, 3]);
    }

    #[test]
    fn test_from_permutation() {
        let roster = vec!["x".into(), "y".into(), "z".into()];
        let model = ConstraintModel::from_roster("g", roster, &[]).unwrap();
        let s = AssignmentSet::from_permutation(&model, &[2, 0, 1]);
        assert_eq!(s.len(), 3);
        assert!(s.contains(&"x".into(), &"z".into()));
        assert_eq!(s.cycle_structure(), vec![3]);
        assert_eq!(s.group().as_str(), "g");
    }
}
