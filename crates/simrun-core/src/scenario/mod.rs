//! Scenarios and their phase behaviours
//!
//! A scenario turns its own sweep configuration into [`Job`]s for each
//! [`Phase`]. The trait carries the base behaviour: simulate and postprocess
//! produce nothing, graph runs `graphs/<name>.R`. Concrete variants override
//! only the phases they own; [`DerivedScenario`] composes over a shared base
//! configuration instead of re-deriving it.

mod attack;
mod convert;
mod derived;

pub use attack::{AttackConfig, AttackScenario, Leaf, Producer, ATTACK_SIMULATOR};
pub use convert::{ConvertTopologies, TOPOLOGY_CONVERTER};
pub use derived::{DerivedScenario, GraphAggregation, GraphBehavior, PhaseBehavior};

use crate::config::ToolPaths;
use crate::error::ScenarioError;
use crate::job::{CommandSpec, Job};
use crate::types::Phase;
use std::fmt::Display;

/// A named unit of work that materialises jobs per phase
pub trait Scenario: Send + Sync {
    /// Unique catalog key
    fn name(&self) -> &str;

    /// Create output directories needed before simulating
    ///
    /// Must be idempotent.
    fn prepare(&self, _tools: &ToolPaths) -> Result<(), ScenarioError> {
        Ok(())
    }

    /// Jobs for the simulate phase
    fn simulate(&self, _tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        Ok(Vec::new())
    }

    /// Jobs for the postprocess phase
    fn postprocess(&self, _tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        Ok(Vec::new())
    }

    /// Jobs for the graph phase
    fn graph(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        let script = tools.graph_script(&format!("{}.R", self.name()));
        Ok(vec![Job::command(CommandSpec::new(script))])
    }

    /// Dispatch to the phase method
    fn jobs(&self, phase: Phase, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        match phase {
            Phase::Simulate => self.simulate(tools),
            Phase::Postprocess => self.postprocess(tools),
            Phase::Graph => self.graph(tools),
        }
    }
}

/// Fail with `EmptySweep` unless `values` has at least one entry
pub(crate) fn require_sweep<'a, T>(
    scenario: &str,
    dimension: &'static str,
    values: &'a [T],
) -> Result<&'a [T], ScenarioError> {
    if values.is_empty() {
        return Err(ScenarioError::EmptySweep {
            scenario: scenario.to_string(),
            dimension,
        });
    }
    Ok(values)
}

/// Comma-joined rendering of a swept dimension
pub(crate) fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Scenario for Bare {
        fn name(&self) -> &str {
            "bare"
        }
    }

    #[test]
    fn base_behaviour() {
        let tools = ToolPaths::default();
        assert!(Bare.jobs(Phase::Simulate, &tools).unwrap().is_empty());
        assert!(Bare.jobs(Phase::Postprocess, &tools).unwrap().is_empty());

        let graph = Bare.jobs(Phase::Graph, &tools).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[0].to_string(), "./graphs/bare.R");
        assert!(Bare.prepare(&tools).is_ok());
    }

    #[test]
    fn join_uses_commas() {
        assert_eq!(join(&[1, 2, 10]), "1,2,10");
        assert_eq!(join(&["fairness"]), "fairness");
    }

    #[test]
    fn require_sweep_rejects_empty() {
        let empty: [u32; 0] = [];
        let err = require_sweep("s", "runs", &empty).unwrap_err();
        assert!(matches!(err, ScenarioError::EmptySweep { dimension: "runs", .. }));
        assert_eq!(require_sweep("s", "runs", &[1]).unwrap(), &[1]);
    }
}
