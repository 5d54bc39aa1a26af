//! Participants, groups and exclusion pairs.

use std::collections::HashSet;
use std::fmt;

/// Identifier of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an exchange group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership status of a participant within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParticipantStatus {
    /// Invitation sent, not yet accepted.
    Invited,
    /// Accepted the invitation.
    Joined,
    /// Confirmed participation.
    Confirmed,
    /// Left the group.
    Withdrawn,
}

impl ParticipantStatus {
    /// Only joined and confirmed participants take part in a draw.
    pub fn is_eligible(self) -> bool {
        matches!(self, ParticipantStatus::Joined | ParticipantStatus::Confirmed)
    }
}

/// A member of an exchange group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub group: GroupId,
    pub status: ParticipantStatus,
}

impl Participant {
    pub fn new(
        id: impl Into<ParticipantId>,
        group: impl Into<GroupId>,
        status: ParticipantStatus,
    ) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            status,
        }
    }

    /// Convenience constructor for a confirmed participant.
    pub fn confirmed(id: impl Into<ParticipantId>, group: impl Into<GroupId>) -> Self {
        Self::new(id, group, ParticipantStatus::Confirmed)
    }
}

/// An unordered pair of participants who must not draw each other.
///
/// `Exclusion::new(a, b)` and `Exclusion::new(b, a)` compare equal.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exclusion {
    pub a: ParticipantId,
    pub b: ParticipantId,
}

impl Exclusion {
    pub fn new(a: impl Into<ParticipantId>, b: impl Into<ParticipantId>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Whether this exclusion forbids `santa -> recipient` (either direction).
    pub fn forbids(&self, santa: &ParticipantId, recipient: &ParticipantId) -> bool {
        (&self.a == santa && &self.b == recipient) || (&self.a == recipient && &self.b == santa)
    }

    /// Whether both sides name the same participant.
    pub fn is_reflexive(&self) -> bool {
        self.a == self.b
    }

    fn ordered(&self) -> (&ParticipantId, &ParticipantId) {
        if self.a <= self.b {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }
}

impl PartialEq for Exclusion {
    fn eq(&self, other: &Self) -> bool {
        self.ordered() == other.ordered()
    }
}

impl std::hash::Hash for Exclusion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ordered().hash(state);
    }
}

/// Returns the ids of eligible members of `group`, in roster order.
///
/// Participants of other groups and ineligible statuses are dropped.
/// Repeated ids keep their first occurrence.
pub fn eligible_roster(group: &GroupId, participants: &[Participant]) -> Vec<ParticipantId> {
    let mut seen = HashSet::new();
    let mut roster = Vec::new();
    for p in participants {
        if &p.group != group || !p.status.is_eligible() {
            continue;
        }
        if seen.insert(&p.id) {
            roster.push(p.id.clone());
        } else {
            tracing::warn!(group = %group, participant = %p.id, "duplicate participant ignored");
        }
    }
    roster
}
