//! Property tests: generator validity and feasibility soundness against
//! exhaustive search on small groups.

use proptest::prelude::*;
use u_exchange::generator::{AssignmentGenerator, GeneratorConfig};
use u_exchange::matching::{Feasibility, FeasibilityChecker};
use u_exchange::model::{ConstraintModel, Exclusion, ParticipantId};
use u_exchange::validation::AssignmentValidator;

fn build(n: usize, pairs: &[(usize, usize)]) -> ConstraintModel {
    let roster: Vec<ParticipantId> = (0..n).map(|i| ParticipantId::new(format!("p{i}"))).collect();
    let exclusions: Vec<Exclusion> = pairs
        .iter()
        .filter(|&&(a, b)| a < n && b < n)
        .map(|&(a, b)| Exclusion::new(format!("p{a}"), format!("p{b}")))
        .collect();
    ConstraintModel::from_roster("g", roster, &exclusions).unwrap()
}

/// Exhaustive search for any permutation using only allowed edges.
fn brute_force_exists(model: &ConstraintModel) -> bool {
    fn extend(model: &ConstraintModel, santa: usize, used: &mut [bool]) -> bool {
        if santa == model.len() {
            return true;
        }
        for &r in model.allowed(santa) {
            if !used[r] {
                used[r] = true;
                if extend(model, santa + 1, used) {
                    return true;
                }
                used[r] = false;
            }
        }
        false
    }
    let mut used = vec![false; model.len()];
    extend(model, 0, &mut used)
}

fn exclusion_pairs() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..8, 0usize..8), 0..20)
}

proptest! {
    #[test]
    fn feasibility_matches_brute_force(n in 2usize..=8, pairs in exclusion_pairs()) {
        let model = build(n, &pairs);
        let feasible = FeasibilityChecker::check(&model).is_feasible();
        prop_assert_eq!(feasible, brute_force_exists(&model));
    }

    #[test]
    fn certificate_violates_hall(n in 2usize..=8, pairs in exclusion_pairs()) {
        let model = build(n, &pairs);
        if let Feasibility::Infeasible(cert) = FeasibilityChecker::check(&model) {
            let idx: Vec<usize> = cert
                .participants()
                .iter()
                .map(|p| model.index_of(p).unwrap())
                .collect();
            let hood = model.neighborhood(&idx);
            prop_assert!(hood.len() < idx.len());
            prop_assert_eq!(hood.len(), cert.allowed_recipients().len());
            prop_assert!(cert.deficiency() >= 1);
        }
    }

    #[test]
    fn generated_assignments_are_valid(
        n in 2usize..=10,
        pairs in prop::collection::vec((0usize..10, 0usize..10), 0..15),
        seed in any::<u64>(),
        budget in prop::option::of(0u32..50),
    ) {
        let model = build(n, &pairs);
        prop_assume!(FeasibilityChecker::check(&model).is_feasible());

        let mut config = GeneratorConfig::default().with_seed(seed);
        config.retry_budget = budget;
        let result = AssignmentGenerator::run(&model, &config).unwrap();
        prop_assert!(AssignmentValidator::violations(&model, &result.assignments).is_empty());
        prop_assert_eq!(result.assignments.len(), n);
        prop_assert_eq!(result.assignments.cycle_structure().iter().sum::<usize>(), n);
    }

    #[test]
    fn seeded_runs_are_reproducible(n in 2usize..=10, seed in any::<u64>()) {
        let model = build(n, &[(0, 1)]);
        prop_assume!(FeasibilityChecker::check(&model).is_feasible());
        let config = GeneratorConfig::default().with_seed(seed);
        let a = AssignmentGenerator::run(&model, &config).unwrap();
        let b = AssignmentGenerator::run(&model, &config).unwrap();
        prop_assert_eq!(a.assignments, b.assignments);
    }
}
