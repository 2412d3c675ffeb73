//! Interest flooding attack and mitigation sweeps
//!
//! Every leaf of `algorithm × topology × evil × run` (runs innermost) is one
//! simulator invocation, one reduction pipeline and one per-leaf figure. The
//! leaf name matches the file names the simulator writes under
//! `results/<folder>/`, so leaves never share output paths.

use super::{require_sweep, Scenario};
use crate::config::ToolPaths;
use crate::error::ScenarioError;
use crate::fs::ensure_dir;
use crate::job::{CommandSpec, Job};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Simulator binary under the build directory
pub const ATTACK_SIMULATOR: &str = "interest-ddos-attack-and-mitigation-scenario";

/// Rate trace columns kept for reduction: time, node, face id, type, packets, kilobytes
const RATE_COLUMNS: &str = "1,2,3,5,6,7";

const RATE_TABLE: &str = "rate_trace";

const RATE_SUMMARY_SQL: &str = "DROP TABLE IF EXISTS rate_summary; \
     CREATE TABLE rate_summary AS \
     SELECT Time, Node, Type, SUM(Packets) AS Packets, SUM(Kilobytes) AS Kilobytes \
     FROM rate_trace GROUP BY Time, Node, Type;";

/// Where the content producer sits in the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Producer {
    /// Gateway node
    Gw,
    /// Backbone node
    Bb,
}

impl fmt::Display for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Producer::Gw => "gw",
            Producer::Bb => "bb",
        })
    }
}

/// Sweep definition of an attack scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Catalog key
    pub name: String,
    /// Mitigation algorithms
    pub algorithms: Vec<String>,
    /// Topology names under `topologies/`
    pub topologies: Vec<String>,
    /// Attacker counts
    pub evils: Vec<u32>,
    /// Run indices (random seeds)
    pub runs: Vec<u32>,
    /// Legitimate client count
    pub good_count: u32,
    /// Producer placement
    pub producer: Producer,
    /// Default RTT used for BDP limits, e.g. `250ms`
    pub default_rtt: String,
    /// Folder under `results/`
    pub folder: String,
}

/// One point of the full sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Leaf<'a> {
    /// Mitigation algorithm
    pub algorithm: &'a str,
    /// Topology name
    pub topology: &'a str,
    /// Attacker count
    pub evil: u32,
    /// Run index
    pub run: u32,
}

impl AttackConfig {
    /// Check that no sweep dimension is empty
    ///
    /// # Errors
    /// - `ScenarioError::EmptySweep` naming the first empty dimension
    pub fn validate(&self) -> Result<(), ScenarioError> {
        require_sweep(&self.name, "algorithms", &self.algorithms)?;
        require_sweep(&self.name, "topologies", &self.topologies)?;
        require_sweep(&self.name, "evils", &self.evils)?;
        require_sweep(&self.name, "runs", &self.runs)?;
        Ok(())
    }

    /// Full cross product, algorithm outermost and run innermost
    ///
    /// # Errors
    /// - `ScenarioError::EmptySweep` if any dimension is empty
    pub fn leaves(&self) -> Result<Vec<Leaf<'_>>, ScenarioError> {
        self.validate()?;
        let mut leaves = Vec::with_capacity(
            self.algorithms.len() * self.topologies.len() * self.evils.len() * self.runs.len(),
        );
        for algorithm in &self.algorithms {
            for topology in &self.topologies {
                for evil in &self.evils {
                    for run in &self.runs {
                        leaves.push(Leaf {
                            algorithm: algorithm.as_str(),
                            topology: topology.as_str(),
                            evil: *evil,
                            run: *run,
                        });
                    }
                }
            }
        }
        Ok(leaves)
    }

    /// File stem the simulator uses for a leaf
    #[must_use]
    pub fn leaf_name(&self, leaf: &Leaf<'_>) -> String {
        format!(
            "{}-topo-{}-evil-{}-good-{}-producer-{}-run-{}",
            leaf.algorithm, leaf.topology, leaf.evil, self.good_count, self.producer, leaf.run
        )
    }

    fn result_file(&self, tools: &ToolPaths, leaf: &Leaf<'_>, extension: &str) -> PathBuf {
        tools
            .results(&self.folder)
            .join(format!("{}.{extension}", self.leaf_name(leaf)))
    }
}

/// Scenario owning raw simulator data for its sweep
#[derive(Debug, Clone)]
pub struct AttackScenario {
    config: Arc<AttackConfig>,
}

impl AttackScenario {
    /// Create the scenario
    #[must_use]
    pub fn new(config: AttackConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Shared sweep configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AttackConfig {
        &self.config
    }
}

impl Scenario for AttackScenario {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn prepare(&self, tools: &ToolPaths) -> Result<(), ScenarioError> {
        ensure_dir(&tools.results(&self.config.folder))
    }

    fn simulate(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        let config = self.config();
        let simulator = tools.simulator(ATTACK_SIMULATOR);
        Ok(config
            .leaves()?
            .iter()
            .map(|leaf| {
                Job::command(
                    CommandSpec::new(&simulator)
                        .flag("topology", leaf.topology)
                        .flag("run", leaf.run)
                        .flag("algorithm", leaf.algorithm)
                        .flag("producer", config.producer)
                        .flag("badCount", leaf.evil)
                        .flag("goodCount", config.good_count)
                        .flag("folder", &config.folder)
                        .flag("defaultRtt", &config.default_rtt),
                )
            })
            .collect())
    }

    /// `decompress | keep rate columns | load and aggregate` per leaf
    fn postprocess(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        let config = self.config();
        Ok(config
            .leaves()?
            .iter()
            .map(|leaf| {
                let raw = config.result_file(tools, leaf, "txt.bz2");
                let db = config.result_file(tools, leaf, "db");
                Job::pipeline(
                    CommandSpec::new(&tools.decompressor)
                        .arg("-dc")
                        .arg(raw.display().to_string()),
                    [
                        CommandSpec::new(&tools.column_filter)
                            .arg("-f")
                            .arg(RATE_COLUMNS),
                        CommandSpec::new(&tools.table_loader)
                            .arg("-cmd")
                            .arg(format!("DROP TABLE IF EXISTS {RATE_TABLE};"))
                            .arg("-cmd")
                            .arg(".mode tabs")
                            .arg("-cmd")
                            .arg(format!(".import /dev/stdin {RATE_TABLE}"))
                            .arg(db.display().to_string())
                            .arg(RATE_SUMMARY_SQL),
                    ],
                )
            })
            .collect())
    }

    fn graph(&self, tools: &ToolPaths) -> Result<Vec<Job>, ScenarioError> {
        let config = self.config();
        let script = tools.graph_script("rate.R");
        Ok(config
            .leaves()?
            .iter()
            .map(|leaf| {
                Job::command(CommandSpec::new(&script).args([
                    leaf.topology.to_string(),
                    leaf.algorithm.to_string(),
                    leaf.evil.to_string(),
                    config.good_count.to_string(),
                    config.producer.to_string(),
                    config.folder.clone(),
                    leaf.run.to_string(),
                ]))
            })
            .collect())
    }
}
