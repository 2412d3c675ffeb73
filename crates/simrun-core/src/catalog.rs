//! Ordered scenario catalog
//!
//! Catalog order only drives display and log order. [`Catalog::standard`] is
//! the set of experiments shipped with the runner.

use crate::scenario::{
    AttackConfig, AttackScenario, ConvertTopologies, DerivedScenario, GraphAggregation,
    GraphBehavior, Producer, Scenario,
};
use std::sync::Arc;

/// Rocketfuel maps converted by `convert-topologies`
pub const ROCKETFUEL_TOPOLOGIES: [&str; 10] = [
    "1221.r0", "1239.r0", "1755.r0", "2914.r0", "3257.r0", "3356.r0", "3967.r0", "4755.r0",
    "6461.r0", "7018.r0",
];

/// Ordered collection of scenario instances
#[derive(Default, Clone)]
pub struct Catalog {
    scenarios: Vec<Arc<dyn Scenario>>,
}

impl Catalog {
    /// Create an empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scenario
    #[must_use]
    pub fn with(mut self, scenario: impl Scenario + 'static) -> Self {
        self.push(scenario);
        self
    }

    /// Append a scenario
    ///
    /// Names are expected to be unique; a duplicate is kept but logged.
    pub fn push(&mut self, scenario: impl Scenario + 'static) {
        if self.get(scenario.name()).is_some() {
            tracing::warn!("duplicate scenario name in catalog: {}", scenario.name());
        }
        self.scenarios.push(Arc::new(scenario));
    }

    /// Scenario by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Scenario>> {
        self.scenarios.iter().find(|scenario| scenario.name() == name)
    }

    /// Scenarios in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scenario>> {
        self.scenarios.iter()
    }

    /// Names in catalog order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|scenario| scenario.name()).collect()
    }

    /// Number of scenarios
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Experiments shipped with the runner
    #[must_use]
    pub fn standard() -> Self {
        let conversion = ConvertTopologies::new("convert-topologies", vec![1], ROCKETFUEL_TOPOLOGIES)
            .with_build_graph(true);

        let small_tree = AttackScenario::new(AttackConfig {
            name: "attack-small-tree".to_string(),
            algorithms: strings(["fairness", "satisfaction-accept", "satisfaction-pushback"]),
            topologies: strings(["small-tree"]),
            evils: vec![1, 2],
            runs: (1..=10).collect(),
            good_count: 1,
            producer: Producer::Gw,
            default_rtt: "250ms".to_string(),
            folder: "attackSmallTree".to_string(),
        });

        let small_tree_runs = DerivedScenario::new("attack-small-tree-runs", &small_tree)
            .without_simulate()
            .without_postprocess()
            .with_graph(GraphBehavior::Aggregate(
                GraphAggregation::PerAlgorithmTopology,
            ));

        let small_tree_summary = DerivedScenario::new("attack-small-tree-summary", &small_tree)
            .without_simulate()
            .with_graph(GraphBehavior::Aggregate(GraphAggregation::PerTopology));

        let small_tree_summary_graph = small_tree_summary
            .specialize("attack-small-tree-summary-graph")
            .without_postprocess();

        let tree = AttackScenario::new(AttackConfig {
            name: "attack-tree".to_string(),
            algorithms: strings([
                "simple-limits",
                "fairness",
                "satisfaction-accept",
                "satisfaction-pushback",
            ]),
            topologies: strings(["tree"]),
            evils: vec![1, 5, 10],
            runs: (1..=10).collect(),
            good_count: 10,
            producer: Producer::Gw,
            default_rtt: "250ms".to_string(),
            folder: "attackTree".to_string(),
        });

        Self::new()
            .with(conversion)
            .with(small_tree)
            .with(small_tree_runs)
            .with(small_tree_summary)
            .with(small_tree_summary_graph)
            .with(tree)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn strings<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}
