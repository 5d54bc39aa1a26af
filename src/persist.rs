//! Persistence and notification boundaries.
//!
//! The engine never stores anything itself. A successful run hands its
//! validated [`AssignmentSet`] to an [`AssignmentPersister`], which must
//! replace the group's previous assignments and their dependent message
//! threads in one all-or-nothing step. After a commit, a [`Notifier`] is
//! told about each new assignment without the engine waiting on delivery.

use crate::assignment::{Assignment, AssignmentSet};
use crate::error::PersistError;
use crate::model::{GroupId, ParticipantId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// What a commit changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistReceipt {
    /// Prior assignments deleted.
    pub removed_assignments: usize,
    /// Message threads deleted with them.
    pub removed_threads: usize,
    /// New assignments written.
    pub inserted: usize,
}

/// Transactional store for assignment sets.
pub trait AssignmentPersister: Send + Sync {
    /// Atomically deletes every assignment and dependent message thread of
    /// `set.group()` and inserts `set`.
    ///
    /// Either the whole replacement becomes visible or none of it does.
    fn replace_assignments(&self, set: &AssignmentSet) -> Result<PersistReceipt, PersistError>;
}

/// Fire-and-forget hook invoked once per created assignment.
///
/// The engine calls it from a delivery thread after the commit, never
/// while holding the group lock.
pub trait Notifier: Send + Sync {
    fn assignment_created(&self, group: &GroupId, assignment: &Assignment);
}

/// Notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn assignment_created(&self, _group: &GroupId, _assignment: &Assignment) {}
}

/// Identifier of a message thread.
pub type ThreadId = u64;

/// A santa/recipient conversation that depends on one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageThread {
    pub id: ThreadId,
    pub santa: ParticipantId,
    pub recipient: ParticipantId,
}

#[derive(Debug, Default)]
struct GroupRecord {
    assignments: Option<AssignmentSet>,
    threads: Vec<MessageThread>,
}

#[derive(Debug, Default)]
struct Store {
    groups: HashMap<GroupId, GroupRecord>,
    next_thread: ThreadId,
}

/// In-process [`AssignmentPersister`] with cascading thread deletion.
///
/// All state lives behind one lock, so a replacement is observed either
/// completely or not at all.
#[derive(Debug, Default)]
pub struct InMemoryPersister {
    store: RwLock<Store>,
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current assignments of `group`, if any were committed.
    pub fn assignments(&self, group: &GroupId) -> Option<AssignmentSet> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store.groups.get(group).and_then(|r| r.assignments.clone())
    }

    /// Message threads of `group`.
    pub fn threads(&self, group: &GroupId) -> Vec<MessageThread> {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store
            .groups
            .get(group)
            .map(|r| r.threads.clone())
            .unwrap_or_default()
    }

    /// Opens a thread on an existing assignment.
    pub fn open_thread(
        &self,
        group: &GroupId,
        santa: &ParticipantId,
        recipient: &ParticipantId,
    ) -> Result<ThreadId, PersistError> {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let id = store.next_thread;
        let record = store
            .groups
            .get_mut(group)
            .ok_or_else(|| format!("group '{group}' has no assignments"))?;

        let assigned = record
            .assignments
            .as_ref()
            .is_some_and(|set| set.contains(santa, recipient));
        if !assigned {
            return Err(format!("no assignment '{santa}' -> '{recipient}' in group '{group}'").into());
        }

        record.threads.push(MessageThread {
            id,
            santa: santa.clone(),
            recipient: recipient.clone(),
        });
        store.next_thread += 1;
        Ok(id)
    }
}

impl AssignmentPersister for InMemoryPersister {
    fn replace_assignments(&self, set: &AssignmentSet) -> Result<PersistReceipt, PersistError> {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let record = store.groups.entry(set.group().clone()).or_default();

        let removed_assignments = record.assignments.as_ref().map_or(0, AssignmentSet::len);
        let removed_threads = record.threads.len();
        record.threads.clear();
        record.assignments = Some(set.clone());

        tracing::debug!(
            group = %set.group(),
            removed_assignments,
            removed_threads,
            inserted = set.len(),
            "assignments replaced"
        );

        Ok(PersistReceipt {
            removed_assignments,
            removed_threads,
            inserted: set.len(),
        })
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
    fn test_replace_cascades_threads() {
        let persister = InMemoryPersister::new();
        let g = GroupId::from("g");

        let first = set(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let receipt = persister.replace_assignments(&first).unwrap();
        assert_eq!(receipt, PersistReceipt { inserted: 3, ..Default::default() });

        persister.open_thread(&g, &"a".into(), &"b".into()).unwrap();
        persister.open_thread(&g, &"c".into(), &"a".into()).unwrap();
        assert_eq!(persister.threads(&g).len(), 2);

        let second = set(&[("a", "c"), ("c", "b"), ("b", "a")]);
        let receipt = persister.replace_assignments(&second).unwrap();
        assert_eq!(receipt.removed_assignments, 3);
        assert_eq!(receipt.removed_threads, 2);
        assert_eq!(receipt.inserted, 3);

        assert_eq!(persister.assignments(&g), Some(second));
        assert!(persister.threads(&g).is_empty());
    }

    #[test]
    fn test_open_thread_requires_assignment() {
        let persister = InMemoryPersister::new();
        let g = GroupId::from("g");
        assert!(persister.open_thread(&g, &"a".into(), &"b".into()).is_err());

        persister.replace_assignments(&set(&[("a", "b"), ("b", "a")])).unwrap();
        assert!(persister.open_thread(&g, &"a".into(), &"a".into()).is_err());

        let t1 = persister.open_thread(&g, &"a".into(), &"b".into()).unwrap();
        let t2 = persister.open_thread(&g, &"b".into(), &"a".into()).unwrap();
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_groups_isolated() {
        let persister = InMemoryPersister::new();
        persister.replace_assignments(&set(&[("a", "b"), ("b", "a")])).unwrap();
        let other = AssignmentSet::new("h", vec![Assignment::new("x", "y"), Assignment::new("y", "x")]);
        persister.replace_assignments(&other).unwrap();

        assert_eq!(persister.assignments(&"g".into()).map(|s| s.len()), Some(2));
        assert_eq!(persister.assignments(&"h".into()), Some(other));
        assert!(persister.assignments(&"zzz".into()).is_none());
    }
}
