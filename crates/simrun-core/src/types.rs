//! Shared vocabulary types: phases, modes and per-scenario run states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered stage of a scenario's execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Run the simulator binaries
    Simulate,
    /// Reduce raw simulator output
    Postprocess,
    /// Render figures
    Graph,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 3] = [Phase::Simulate, Phase::Postprocess, Phase::Graph];

    /// Lowercase phase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Simulate => "simulate",
            Phase::Postprocess => "postprocess",
            Phase::Graph => "graph",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the orchestrator executes scenarios or only names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run the requested phases
    #[default]
    Run,
    /// Print selected scenario names, execute nothing
    List,
}

/// Which phases were requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseOptions {
    /// Run simulations (implies postprocessing)
    pub simulate: bool,
    /// Run postprocessing without simulating
    pub postprocess: bool,
    /// Build graphs
    pub graph: bool,
}

impl PhaseOptions {
    /// Whether `phase` runs under these options
    ///
    /// Postprocessing follows a simulation even when not requested on its own.
    #[must_use]
    pub fn includes(&self, phase: Phase) -> bool {
        match phase {
            Phase::Simulate => self.simulate,
            Phase::Postprocess => self.simulate || self.postprocess,
            Phase::Graph => self.graph,
        }
    }

    /// Requested phases in execution order
    pub fn phases(self) -> impl Iterator<Item = Phase> {
        Phase::ALL.into_iter().filter(move |phase| self.includes(*phase))
    }
}

impl Default for PhaseOptions {
    fn default() -> Self {
        Self {
            simulate: false,
            postprocess: false,
            graph: true,
        }
    }
}

/// Final state of one scenario after an orchestrator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Not in the selection
    Skipped,
    /// Named in list mode, nothing executed
    Listed,
    /// Every requested phase materialised and drained
    Done,
}
