//! Rocketfuel topology conversion

use super::{require_sweep, Scenario};
use crate::config::ToolPaths;
use crate::error::ScenarioError;
use crate::fs::ensure_dir;
use crate::job::{CommandSpec, Job};
use std::path::PathBuf;

/// Converter binary under the build directory
pub const TOPOLOGY_CONVERTER: &str = "rocketfuel-maps-cch-to-annotaded";

/// Annotates raw Rocketfuel maps with random bandwidth and delay, one output per run
///
/// Only simulates; there is nothing to reduce or plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertTopologies {
    name: String,
    runs: Vec<u32>,
    topologies: Vec<String>,
    build_graph: bool,
}

impl ConvertTopologies {
    /// Create the scenario
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, runs: Vec<u32>, topologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            runs,
            topologies: topologies.into_iter().map(Into::into).collect(),
            build_graph: false,
        }
    }

    /// Ask the converter to also emit a graph of each topology
    #[inline]
    #[must_use]
    pub fn with_build_graph(mut self, build_graph: bool) -> Self {
        self.build_graph = build_graph;
        self
    }

    fn output_dir(tools: &ToolPaths, run: u32) -> PathBuf {
        tools.topologies_dir.join(format!("bw-delay-rand-{run}"))
    }
}

impl Scenario for ConvertTopologies {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&self, tools: &ToolPaths) -> Result<(), ScenarioError> {
        for run in require_sweep(&self.name, "runs", &self.runs)? {
            ensure_dir(&Self::output_dir(tools, *run))?;
        }
        Ok(())
    }

    fn simulate(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        let topologies = require_sweep(&self.name, "topologies", &self.topologies)?;
        let runs = require_sweep(&self.name, "runs", &self.runs)?;
        let converter = tools.simulator(TOPOLOGY_CONVERTER);
        let maps = tools.topologies_dir.join("rocketfuel_maps_cch");

        let mut jobs = Vec::with_capacity(topologies.len() * runs.len());
        for topology in topologies {
            for run in runs {
                let input = maps.join(format!("{topology}.cch"));
                let output = Self::output_dir(tools, *run).join(topology);
                jobs.push(Job::command(
                    CommandSpec::new(&converter)
                        .flag("topology", input.display())
                        .flag("run", run)
                        .flag("output", output.display())
                        .flag("buildGraph", u8::from(self.build_graph))
                        .flag("keepLargestComponent", 1)
                        .flag("connectBackbones", 1)
                        .flag("clients", 3),
                ));
            }
        }
        Ok(jobs)
    }

    fn graph(&self, _tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        Ok(Vec::new())
    }
}
