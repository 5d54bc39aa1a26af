//! End-to-end scenarios for the assignment engine.

use std::collections::HashSet;
use u_exchange::matching::FeasibilityChecker;
use u_exchange::model::{ConstraintModel, Exclusion, GroupId, Participant, ParticipantId};
use u_exchange::persist::InMemoryPersister;
use u_exchange::validation::AssignmentValidator;
use u_exchange::{plan_assignments, AssignmentEngine, AssignmentError, GeneratorConfig};

fn roster(group: &str, ids: &[&str]) -> Vec<Participant> {
    ids.iter().map(|&id| Participant::confirmed(id, group)).collect()
}

fn pid(s: &str) -> ParticipantId {
    ParticipantId::from(s)
}

#[test]
fn single_participant_is_degenerate() {
    let config = GeneratorConfig::default();
    let err = plan_assignments("g", &roster("g", &["a"]), &[], &config, None).unwrap_err();
    assert!(matches!(err, AssignmentError::DegenerateGroup { eligible: 1 }));
}

#[test]
fn excluded_pair_is_infeasible() {
    let err = plan_assignments(
        "g",
        &roster("g", &["a", "b"]),
        &[Exclusion::new("a", "b")],
        &GeneratorConfig::default(),
        None,
    )
    .unwrap_err();
    match err {
        AssignmentError::InfeasibleConstraints { certificate } => {
            assert!(certificate.allowed_recipients().len() < certificate.participants().len());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn free_pair_swaps() {
    let result = plan_assignments(
        "g",
        &roster("g", &["a", "b"]),
        &[],
        &GeneratorConfig::default(),
        None,
    )
    .unwrap();
    assert_eq!(result.assignments.len(), 2);
    assert!(result.assignments.contains(&pid("a"), &pid("b")));
    assert!(result.assignments.contains(&pid("b"), &pid("a")));
}

#[test]
fn five_with_two_couples_over_thousand_seeds() {
    let participants = roster("family", &["A", "B", "C", "D", "E"]);
    let exclusions = vec![Exclusion::new("A", "B"), Exclusion::new("C", "D")];
    let model = ConstraintModel::build("family", &participants, &exclusions).unwrap();
    let forbidden = [("A", "B"), ("B", "A"), ("C", "D"), ("D", "C")];

    let mut structures = HashSet::new();
    let mut outcomes = HashSet::new();
    for seed in 0..1000u64 {
        let result = plan_assignments(
            "family",
            &participants,
            &exclusions,
            &GeneratorConfig::default().with_seed(seed),
            None,
        )
        .unwrap();
        let set = &result.assignments;

        assert!(AssignmentValidator::violations(&model, set).is_empty());
        for a in set {
            assert_ne!(a.santa, a.recipient);
        }
        for (s, r) in forbidden {
            assert!(!set.contains(&pid(s), &pid(r)), "seed {seed} produced {s} -> {r}");
        }
        structures.insert(set.cycle_structure());
        outcomes.insert(set.as_slice().to_vec());
    }

    assert!(structures.contains(&vec![5]));
    assert!(structures.contains(&vec![2, 3]));
    assert!(outcomes.len() > 10, "only {} distinct outcomes", outcomes.len());
}

#[test]
fn same_seed_same_assignment() {
    let participants = roster("g", &["a", "b", "c", "d", "e", "f", "g", "h"]);
    let exclusions = vec![
        Exclusion::new("a", "b"),
        Exclusion::new("c", "d"),
        Exclusion::new("e", "f"),
    ];
    let config = GeneratorConfig::default().with_seed(0xC0FFEE);

    let first = plan_assignments("g", &participants, &exclusions, &config, None).unwrap();
    for _ in 0..5 {
        let again = plan_assignments("g", &participants, &exclusions, &config, None).unwrap();
        assert_eq!(first.assignments, again.assignments);
        assert_eq!(first.report.strategy, again.report.strategy);
    }
}

#[test]
fn regeneration_replaces_previous_run() {
    let engine = AssignmentEngine::new(InMemoryPersister::new());
    let group = GroupId::from("office");
    let participants = roster("office", &["a", "b", "c", "d", "e"]);
    let exclusions = vec![Exclusion::new("a", "b")];

    let first = engine
        .run(
            group.clone(),
            &participants,
            &exclusions,
            &GeneratorConfig::default().with_seed(1),
            None,
        )
        .unwrap();
    assert_eq!(first.receipt.removed_assignments, 0);

    for a in &first.assignments {
        engine
            .persister()
            .open_thread(&group, &a.santa, &a.recipient)
            .unwrap();
    }
    assert_eq!(engine.persister().threads(&group).len(), 5);

    let second = engine
        .run(
            group.clone(),
            &participants,
            &exclusions,
            &GeneratorConfig::default().with_seed(2),
            None,
        )
        .unwrap();
    assert_eq!(second.receipt.removed_assignments, 5);
    assert_eq!(second.receipt.removed_threads, 5);
    assert_eq!(second.receipt.inserted, 5);

    let stored = engine.persister().assignments(&group).unwrap();
    assert_eq!(stored, second.assignments);
    assert!(engine.persister().threads(&group).is_empty());
}

#[test]
fn certificate_names_isolated_trio() {
    // Three siblings who may not draw each other, plus one outsider.
    let participants = roster("g", &["s1", "s2", "s3", "o"]);
    let exclusions = vec![
        Exclusion::new("s1", "s2"),
        Exclusion::new("s1", "s3"),
        Exclusion::new("s2", "s3"),
    ];
    let model = ConstraintModel::build("g", &participants, &exclusions).unwrap();
    let err = FeasibilityChecker::require(&model).unwrap_err();
    let AssignmentError::InfeasibleConstraints { certificate } = err else {
        panic!("expected infeasible");
    };

    let idx: Vec<usize> = certificate
        .participants()
        .iter()
        .map(|p| model.index_of(p).unwrap())
        .collect();
    assert!(model.neighborhood(&idx).len() < idx.len());
    assert_eq!(certificate.allowed_recipients(), &[pid("o")]);
    assert!(certificate.participants().iter().all(|p| p.as_str().starts_with('s')));
}
