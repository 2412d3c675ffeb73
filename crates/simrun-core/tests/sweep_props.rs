//! Property tests for sweep fan-out
//!
//! Job counts per phase must follow the cross product of the sweep, and
//! aggregated graphs must collapse exactly the joined dimensions.

use proptest::prelude::*;
use simrun_core::{
    DerivedScenario, GraphAggregation, GraphBehavior, Phase, Scenario, ToolPaths,
};
use simrun_test_utils::attack_scenario;
use std::collections::HashSet;

fn dims() -> impl Strategy<Value = (usize, usize, usize, usize)> {
    (1usize..4, 1usize..4, 1usize..4, 1usize..6)
}

proptest! {
    #[test]
    fn prop_every_phase_covers_every_leaf((a, t, e, r) in dims()) {
        let scenario = attack_scenario("sweep", a, t, e, r);
        let tools = ToolPaths::default();
        let leaves = a * t * e * r;

        for phase in Phase::ALL {
            let jobs = scenario.jobs(phase, &tools).unwrap();
            prop_assert_eq!(jobs.len(), leaves, "{}", phase);
            let distinct: HashSet<_> = jobs.iter().map(ToString::to_string).collect();
            prop_assert_eq!(distinct.len(), leaves);
        }
    }

    #[test]
    fn prop_per_topology_collapses_to_topologies((a, t, e, r) in dims()) {
        let base = attack_scenario("sweep", a, t, e, r);
        let derived = DerivedScenario::new("sweep-summary", &base)
            .without_simulate()
            .without_postprocess()
            .with_graph(GraphBehavior::Aggregate(GraphAggregation::PerTopology));
        let tools = ToolPaths::default();

        prop_assert!(derived.jobs(Phase::Simulate, &tools).unwrap().is_empty());
        prop_assert!(derived.jobs(Phase::Postprocess, &tools).unwrap().is_empty());

        let graphs = derived.jobs(Phase::Graph, &tools).unwrap();
        prop_assert_eq!(graphs.len(), t);
        for job in &graphs {
            prop_assert_eq!(job.arguments()[1].split(',').count(), a);
            prop_assert_eq!(job.arguments()[2].split(',').count(), e);
            prop_assert_eq!(job.arguments()[3].split(',').count(), r);
        }
    }

    #[test]
    fn prop_per_algorithm_topology_collapses_evils_and_runs((a, t, e, r) in dims()) {
        let base = attack_scenario("sweep", a, t, e, r);
        let derived = DerivedScenario::new("sweep-runs", &base)
            .with_graph(GraphBehavior::Aggregate(GraphAggregation::PerAlgorithmTopology));
        let tools = ToolPaths::default();

        // inherited phases still fan out over the whole sweep
        prop_assert_eq!(derived.jobs(Phase::Simulate, &tools).unwrap().len(), a * t * e * r);

        let graphs = derived.jobs(Phase::Graph, &tools).unwrap();
        prop_assert_eq!(graphs.len(), a * t);
        let pairs: HashSet<_> = graphs
            .iter()
            .map(|job| (job.arguments()[0].clone(), job.arguments()[1].clone()))
            .collect();
        prop_assert_eq!(pairs.len(), a * t);
    }
}
