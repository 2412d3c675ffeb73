//! Runner configuration
//!
//! Everything the orchestrator needs is carried by [`RunnerConfig`]; there is
//! no ambient state. Values can come from a TOML file and are then overridden
//! by the launcher's flags through the `with_*` builders.

use crate::error::ConfigError;
use crate::pool::default_worker_count;
use crate::selection::Selection;
use crate::types::{Mode, PhaseOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the external collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Directory holding the simulator binaries
    pub build_dir: PathBuf,
    /// Directory holding the graphing scripts
    pub graphs_dir: PathBuf,
    /// Root of per-scenario result folders
    pub results_dir: PathBuf,
    /// Root of topology inputs and converted topologies
    pub topologies_dir: PathBuf,
    /// Decompressor run as `<decompressor> -dc <file>`
    pub decompressor: PathBuf,
    /// Column filter run as `<column_filter> -f <columns>`
    pub column_filter: PathBuf,
    /// Relational table loader reading tab-separated rows on stdin
    pub table_loader: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("./build"),
            graphs_dir: PathBuf::from("./graphs"),
            results_dir: PathBuf::from("results"),
            topologies_dir: PathBuf::from("topologies"),
            decompressor: PathBuf::from("bzip2"),
            column_filter: PathBuf::from("cut"),
            table_loader: PathBuf::from("sqlite3"),
        }
    }
}

impl ToolPaths {
    /// Path of a simulator binary
    #[must_use]
    pub fn simulator(&self, name: &str) -> PathBuf {
        self.build_dir.join(name)
    }

    /// Path of a graphing script
    #[must_use]
    pub fn graph_script(&self, name: &str) -> PathBuf {
        self.graphs_dir.join(name)
    }

    /// Result folder of a scenario
    #[must_use]
    pub fn results(&self, folder: &str) -> PathBuf {
        self.results_dir.join(folder)
    }
}

/// Configuration for one orchestrator run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Worker threads in the shared pool
    pub worker_count: usize,
    /// Run or list
    pub mode: Mode,
    /// Requested phases
    pub phases: PhaseOptions,
    /// Requested scenario names; `all` selects the whole catalog
    pub scenarios: Vec<String>,
    /// Log jobs instead of starting processes
    pub dry_run: bool,
    /// External tool locations
    pub tools: ToolPaths,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            mode: Mode::Run,
            phases: PhaseOptions::default(),
            scenarios: Vec::new(),
            dry_run: false,
            tools: ToolPaths::default(),
        }
    }
}

impl RunnerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the document does not match
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not a valid configuration
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// With worker count
    #[inline]
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// With mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// With requested phases
    #[inline]
    #[must_use]
    pub fn with_phases(mut self, phases: PhaseOptions) -> Self {
        self.phases = phases;
        self
    }

    /// With requested scenario names
    #[must_use]
    pub fn with_scenarios<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenarios = names.into_iter().map(Into::into).collect();
        self
    }

    /// With dry run
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With tool paths
    #[inline]
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Selection derived from `scenarios`
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::from_names(&self.scenarios)
    }

    /// Check values the launcher cannot express through types
    ///
    /// # Errors
    /// - `ConfigError::InvalidWorkerCount` if `worker_count` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(())
    }
}
