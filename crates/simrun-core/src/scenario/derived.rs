//! Scenarios layered over an existing attack sweep
//!
//! A [`DerivedScenario`] reads its base's configuration and never mutates it.
//! Each phase either inherits the base behaviour, is skipped because the data
//! already exists on disk, or (graph only) aggregates across the base sweep.
//! Variants are built by chaining overrides, so a further specialisation is
//! just one more override on top of an existing derived scenario.

use super::{join, AttackScenario, Scenario};
use crate::config::ToolPaths;
use crate::error::ScenarioError;
use crate::job::{CommandSpec, Job};

/// Behaviour of an overridable simulate or postprocess phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseBehavior {
    /// Same jobs as the base scenario
    #[default]
    Inherit,
    /// No jobs; outputs are assumed to exist
    Skip,
}

/// How the graph phase collapses the base sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphAggregation {
    /// One job per algorithm × topology; attacker counts and runs are joined
    PerAlgorithmTopology,
    /// One job per topology; algorithms, attacker counts and runs are joined
    PerTopology,
}

impl GraphAggregation {
    /// Script under the graphs directory
    #[must_use]
    pub fn script(self) -> &'static str {
        match self {
            GraphAggregation::PerAlgorithmTopology => "runs.R",
            GraphAggregation::PerTopology => "summary.R",
        }
    }
}

/// Behaviour of the graph phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphBehavior {
    /// Same jobs as the base scenario
    #[default]
    Inherit,
    /// No jobs
    Skip,
    /// Aggregate across the base sweep
    Aggregate(GraphAggregation),
}

/// Scenario reusing an [`AttackScenario`]'s sweep with selective phase overrides
#[derive(Debug, Clone)]
pub struct DerivedScenario {
    name: String,
    base: AttackScenario,
    simulate: PhaseBehavior,
    postprocess: PhaseBehavior,
    graph: GraphBehavior,
}

impl DerivedScenario {
    /// Derive from `base`, inheriting every phase until overridden
    #[must_use]
    pub fn new(name: impl Into<String>, base: &AttackScenario) -> Self {
        Self {
            name: name.into(),
            base: base.clone(),
            simulate: PhaseBehavior::Inherit,
            postprocess: PhaseBehavior::Inherit,
            graph: GraphBehavior::Inherit,
        }
    }

    /// Specialise an existing derived scenario under a new name
    #[must_use]
    pub fn specialize(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Do not simulate; raw data from the base's earlier runs is reused
    #[inline]
    #[must_use]
    pub fn without_simulate(mut self) -> Self {
        self.simulate = PhaseBehavior::Skip;
        self
    }

    /// Do not postprocess; reduced data is reused
    #[inline]
    #[must_use]
    pub fn without_postprocess(mut self) -> Self {
        self.postprocess = PhaseBehavior::Skip;
        self
    }

    /// With graph behaviour
    #[inline]
    #[must_use]
    pub fn with_graph(mut self, graph: GraphBehavior) -> Self {
        self.graph = graph;
        self
    }

    /// Base scenario
    #[inline]
    #[must_use]
    pub fn base(&self) -> &AttackScenario {
        &self.base
    }

    fn aggregated_graph(
        &self,
        tools: &ToolPaths,
        aggregation: GraphAggregation,
    ) -> Result<Vec<Job>, ScenarioError> {
        let config = self.base.config();
        config.validate()?;

        let script = tools.graph_script(aggregation.script());
        let evils = join(&config.evils);
        let runs = join(&config.runs);
        let trailing = [
            config.good_count.to_string(),
            config.producer.to_string(),
            config.folder.clone(),
        ];

        let jobs = match aggregation {
            GraphAggregation::PerAlgorithmTopology => {
                let topologies = &config.topologies;
                config
                    .algorithms
                    .iter()
                    .flat_map(move |algorithm| {
                        topologies.iter().map(move |topology| (algorithm, topology))
                    })
                    .map(|(algorithm, topology)| {
                        Job::command(
                            CommandSpec::new(&script)
                                .args([topology, algorithm, &evils, &runs])
                                .args(trailing.iter().cloned()),
                        )
                    })
                    .collect()
            }
            GraphAggregation::PerTopology => {
                let algorithms = join(&config.algorithms);
                config
                    .topologies
                    .iter()
                    .map(|topology| {
                        Job::command(
                            CommandSpec::new(&script)
                                .args([topology, &algorithms, &evils, &runs])
                                .args(trailing.iter().cloned()),
                        )
                    })
                    .collect()
            }
        };
        Ok(jobs)
    }
}

impl Scenario for DerivedScenario {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, tools: &ToolPaths) -> Result<(), ScenarioError> {
        match self.simulate {
            PhaseBehavior::Inherit => self.base.prepare(tools),
            PhaseBehavior::Skip => Ok(()),
        }
    }

    fn simulate(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        match self.simulate {
            PhaseBehavior::Inherit => self.base.simulate(tools),
            PhaseBehavior::Skip => Ok(Vec::new()),
        }
    }

    fn postprocess(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        match self.postprocess {
            PhaseBehavior::Inherit => self.base.postprocess(tools),
            PhaseBehavior::Skip => Ok(Vec::new()),
        }
    }

    fn graph(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        match self.graph {
            GraphBehavior::Inherit => self.base.graph(tools),
            GraphBehavior::Skip => Ok(Vec::new()),
            GraphBehavior::Aggregate(aggregation) => self.aggregated_graph(tools, aggregation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{AttackConfig, Producer};
    use crate::types::Phase;

    fn base() -> AttackScenario {
        AttackScenario::new(AttackConfig {
            name: "attack-small-tree".to_string(),
            algorithms: vec![
                "fairness".to_string(),
                "satisfaction-accept".to_string(),
                "satisfaction-pushback".to_string(),
            ],
            topologies: vec!["small-tree".to_string(), "tree".to_string()],
            evils: vec![1, 2],
            runs: vec![1, 2, 3],
            good_count: 1,
            producer: Producer::Gw,
            default_rtt: "250ms".to_string(),
            folder: "attackSmallTree".to_string(),
        })
    }

    #[test]
    fn inherits_everything_by_default() {
        let tools = ToolPaths::default();
        let base = base();
        let derived = DerivedScenario::new("copy", &base);
        for phase in Phase::ALL {
            assert_eq!(
                derived.jobs(phase, &tools).unwrap(),
                base.jobs(phase, &tools).unwrap()
            );
        }
        assert_eq!(derived.name(), "copy");
        assert_eq!(derived.base().name(), "attack-small-tree");
    }

    #[test]
    fn per_topology_graph_joins_the_sweep() {
        let tools = ToolPaths::default();
        let derived = DerivedScenario::new("summary", &base())
            .without_simulate()
            .with_graph(GraphBehavior::Aggregate(GraphAggregation::PerTopology));

        assert!(derived.simulate(&tools).unwrap().is_empty());
        assert_eq!(derived.postprocess(&tools).unwrap().len(), 36);

        let jobs = derived.graph(&tools).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(
            jobs[0].to_string(),
            "./graphs/summary.R small-tree fairness,satisfaction-accept,satisfaction-pushback \
             1,2 1,2,3 1 gw attackSmallTree"
        );
        assert_eq!(jobs[1].arguments()[0], "tree");
    }

    #[test]
    fn per_algorithm_topology_graph_collapses_runs() {
        let tools = ToolPaths::default();
        let derived = DerivedScenario::new("runs", &base())
            .without_simulate()
            .without_postprocess()
            .with_graph(GraphBehavior::Aggregate(
                GraphAggregation::PerAlgorithmTopology,
            ));

        let jobs = derived.graph(&tools).unwrap();
        assert_eq!(jobs.len(), 6);
        assert_eq!(
            jobs[1].to_string(),
            "./graphs/runs.R tree fairness 1,2 1,2,3 1 gw attackSmallTree"
        );
    }

    #[test]
    fn specialization_overrides_one_more_phase() {
        let tools = ToolPaths::default();
        let summary = DerivedScenario::new("summary", &base())
            .without_simulate()
            .with_graph(GraphBehavior::Aggregate(GraphAggregation::PerTopology));
        let graph_only = summary.specialize("summary-graph").without_postprocess();

        assert_eq!(graph_only.name(), "summary-graph");
        assert!(graph_only.postprocess(&tools).unwrap().is_empty());
        assert_eq!(
            graph_only.graph(&tools).unwrap(),
            summary.graph(&tools).unwrap()
        );
        // the summary variant keeps its own behaviour
        assert_eq!(summary.postprocess(&tools).unwrap().len(), 36);
    }

    #[test]
    fn skipped_simulate_skips_preparation() {
        let root = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            results_dir: root.path().to_path_buf(),
            ..ToolPaths::default()
        };
        DerivedScenario::new("summary", &base())
            .without_simulate()
            .prepare(&tools)
            .unwrap();
        assert!(!root.path().join("attackSmallTree").exists());
    }

    #[test]
    fn aggregation_rejects_empty_base_sweep() {
        let mut config = base().config().clone();
        config.runs.clear();
        let derived = DerivedScenario::new("broken", &AttackScenario::new(config))
            .with_graph(GraphBehavior::Aggregate(GraphAggregation::PerTopology));
        let err = derived.graph(&ToolPaths::default()).unwrap_err();
        assert!(matches!(err, ScenarioError::EmptySweep { dimension: "runs", .. }));
    }
}
