//! End-to-end assignment pipeline.
//!
//! roster + exclusions → [`ConstraintModel`] → [`FeasibilityChecker`] →
//! [`AssignmentGenerator`] → [`AssignmentValidator`] → [`AssignmentPersister`]
//!
//! [`AssignmentEngine`] holds a per-group lock from model building through
//! the commit, so two runs for the same group never interleave while runs
//! for different groups proceed independently. Notifications are handed to
//! a delivery thread after the lock is released.

use crate::assignment::AssignmentSet;
use crate::error::AssignmentError;
use crate::generator::{AssignmentGenerator, GenerationReport, GenerationResult, GeneratorConfig};
use crate::matching::FeasibilityChecker;
use crate::model::{ConstraintModel, Exclusion, GroupId, Participant};
use crate::persist::{AssignmentPersister, NoopNotifier, Notifier, PersistReceipt};
use crate::validation::AssignmentValidator;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Runs the pipeline without persisting anything.
///
/// The returned assignment has passed validation.
///
/// # Examples
///
/// ```
/// use u_exchange::engine::plan_assignments;
/// use u_exchange::generator::GeneratorConfig;
/// use u_exchange::model::{Exclusion, Participant};
///
/// let roster = vec![
///     Participant::confirmed("ann", "family"),
///     Participant::confirmed("bob", "family"),
///     Participant::confirmed("cat", "family"),
///     Participant::confirmed("dan", "family"),
/// ];
/// let spouses = vec![Exclusion::new("ann", "bob"), Exclusion::new("cat", "dan")];
///
/// let result = plan_assignments(
///     "family",
///     &roster,
///     &spouses,
///     &GeneratorConfig::default().with_seed(2024),
///     None,
/// )
/// .unwrap();
/// assert_eq!(result.assignments.len(), 4);
/// assert!(!result.assignments.contains(&"ann".into(), &"bob".into()));
/// ```
pub fn plan_assignments(
    group: impl Into<GroupId>,
    participants: &[Participant],
    exclusions: &[Exclusion],
    config: &GeneratorConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<GenerationResult, AssignmentError> {
    let model = ConstraintModel::build(group, participants, exclusions)?;
    FeasibilityChecker::require(&model)?;
    let result = AssignmentGenerator::run_with_cancel(&model, config, cancel)?;
    AssignmentValidator::validate(&model, &result.assignments)?;
    Ok(result)
}

/// A generation request for one group.
#[derive(Debug, Clone)]
pub struct GroupRequest {
    pub group: GroupId,
    pub participants: Vec<Participant>,
    pub exclusions: Vec<Exclusion>,
    pub config: GeneratorConfig,
}

impl GroupRequest {
    pub fn new(
        group: impl Into<GroupId>,
        participants: Vec<Participant>,
        exclusions: Vec<Exclusion>,
    ) -> Self {
        Self {
            group: group.into(),
            participants,
            exclusions,
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }
}

/// Result of a committed run.
#[derive(Debug, Clone)]
pub struct EngineRun {
    /// The committed assignment.
    pub assignments: AssignmentSet,
    /// Generation statistics.
    pub report: GenerationReport,
    /// What the persister changed.
    pub receipt: PersistReceipt,
}

/// One mutex per group id, alive while some run holds a lease on it.
#[derive(Debug, Default)]
struct GroupLocks {
    locks: Mutex<HashMap<GroupId, Arc<Mutex<()>>>>,
}

impl GroupLocks {
    fn lease(&self, group: &GroupId) -> GroupLease<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = Arc::clone(locks.entry(group.clone()).or_default());
        GroupLease {
            locks: self,
            group: group.clone(),
            handle,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Shared handle on a group's mutex; the last lease out removes the entry.
struct GroupLease<'a> {
    locks: &'a GroupLocks,
    group: GroupId,
    handle: Arc<Mutex<()>>,
}

impl GroupLease<'_> {
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GroupLease<'_> {
    fn drop(&mut self) {
        // Leases are cloned under the map lock, so the count cannot grow
        // while it is held here. Two references means the map and us.
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&self.handle) == 2 {
            locks.remove(&self.group);
        }
    }
}

/// Generates, validates and commits assignments for groups.
///
/// The notifier is shared with delivery threads, so it must be `'static`.
pub struct AssignmentEngine<P, N = NoopNotifier> {
    persister: P,
    notifier: Arc<N>,
    locks: GroupLocks,
}

impl<P: AssignmentPersister> AssignmentEngine<P> {
    pub fn new(persister: P) -> Self {
        Self {
            persister,
            notifier: Arc::new(NoopNotifier),
            locks: GroupLocks::default(),
        }
    }
}

impl<P: AssignmentPersister, N: Notifier + 'static> AssignmentEngine<P, N> {
    /// Replaces the notifier.
    pub fn with_notifier<M: Notifier + 'static>(self, notifier: M) -> AssignmentEngine<P, M> {
        AssignmentEngine {
            persister: self.persister,
            notifier: Arc::new(notifier),
            locks: self.locks,
        }
    }

    pub fn persister(&self) -> &P {
        &self.persister
    }

    /// Generates and commits a fresh assignment for `group`, replacing any
    /// previous one.
    pub fn generate_assignments(
        &self,
        group: impl Into<GroupId>,
        participants: &[Participant],
        exclusions: &[Exclusion],
        config: &GeneratorConfig,
    ) -> Result<AssignmentSet, AssignmentError> {
        self.run(group, participants, exclusions, config, None)
            .map(|run| run.assignments)
    }

    /// Full pipeline with statistics and an optional cancellation token.
    ///
    /// Returns once the commit is done. Notifications for the new
    /// assignments are delivered afterwards on a separate thread and may
    /// still be in flight.
    pub fn run(
        &self,
        group: impl Into<GroupId>,
        participants: &[Participant],
        exclusions: &[Exclusion],
        config: &GeneratorConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<EngineRun, AssignmentError> {
        let group = group.into();
        let (assignments, report, receipt) = {
            let lease = self.locks.lease(&group);
            let _guard = lease.lock();
            self.commit(&group, participants, exclusions, config, cancel)?
        };

        self.dispatch_notifications(&assignments);

        tracing::info!(
            group = %group,
            participants = assignments.len(),
            strategy = ?report.strategy,
            seed = report.seed,
            "assignments committed"
        );

        Ok(EngineRun {
            assignments,
            report,
            receipt,
        })
    }

    fn commit(
        &self,
        group: &GroupId,
        participants: &[Participant],
        exclusions: &[Exclusion],
        config: &GeneratorConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<(AssignmentSet, GenerationReport, PersistReceipt), AssignmentError> {
        let GenerationResult {
            assignments,
            report,
        } = plan_assignments(group.clone(), participants, exclusions, config, cancel)?;

        let receipt = self
            .persister
            .replace_assignments(&assignments)
            .map_err(|e| {
                tracing::warn!(group = %group, error = %e, "commit failed");
                AssignmentError::Persistence(e)
            })?;

        Ok((assignments, report, receipt))
    }

    fn dispatch_notifications(&self, assignments: &AssignmentSet) {
        let notifier = Arc::clone(&self.notifier);
        let set = assignments.clone();
        let spawned = thread::Builder::new()
            .name(format!("notify-{}", set.group()))
            .spawn(move || {
                for assignment in &set {
                    notifier.assignment_created(set.group(), assignment);
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(
                group = %assignments.group(),
                error = %e,
                "notification delivery could not start"
            );
        }
    }

    /// Runs many independent group requests.
    ///
    /// With the `parallel` feature, requests run concurrently on the rayon
    /// pool; results keep request order either way.
    pub fn generate_batch(
        &self,
        requests: &[GroupRequest],
    ) -> Vec<Result<EngineRun, AssignmentError>> {
        let run_one = |r: &GroupRequest| {
            self.run(r.group.clone(), &r.participants, &r.exclusions, &r.config, None)
        };

        #[cfg(feature = "parallel")]
        {
            requests.par_iter().map(run_one).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            requests.iter().map(run_one).collect()
        }
    }
}
