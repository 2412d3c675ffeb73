//! simrun core - phased job-pool orchestration
//!
//! Turns a catalog of named scenarios into external-process jobs and runs
//! them through three ordered phases on one bounded worker pool:
//! - simulate: run simulator binaries over a parameter sweep
//! - postprocess: reduce raw traces through a decompress/filter/load pipeline
//! - graph: render figures, per sweep leaf or aggregated across the sweep
//!
//! Jobs inside a phase run concurrently; a drain barrier separates phases of
//! the same scenario.
//!
//! # Example
//!
//! ```rust,no_run
//! use simrun_core::{Catalog, Orchestrator, PhaseOptions, RunnerConfig};
//!
//! # fn example() -> Result<(), simrun_core::RunnerError> {
//! let config = RunnerConfig::new()
//!     .with_scenarios(["attack-small-tree"])
//!     .with_phases(PhaseOptions { simulate: true, postprocess: false, graph: true });
//! let summary = Orchestrator::new(config, Catalog::standard())?.run()?;
//!
//! println!("{} jobs, {} failed", summary.stats.submitted, summary.stats.failed);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod fs;
pub mod job;
pub mod orchestrator;
pub mod pool;
pub mod scenario;
pub mod selection;
pub mod types;

// Re-exports for convenience
pub use catalog::Catalog;
pub use config::{RunnerConfig, ToolPaths};
pub use error::{ConfigError, JobError, PoolError, RunnerError, ScenarioError, SelectionError};
pub use job::{CommandSpec, DryRunExecutor, Job, JobExecutor, JobOutcome, ProcessExecutor};
pub use orchestrator::{Orchestrator, PhaseCounts, RunSummary, ScenarioReport};
pub use pool::{default_worker_count, PoolStats, WorkerPool};
pub use scenario::{
    AttackConfig, AttackScenario, ConvertTopologies, DerivedScenario, GraphAggregation,
    GraphBehavior, Leaf, PhaseBehavior, Producer, Scenario, ATTACK_SIMULATOR, TOPOLOGY_CONVERTER,
};
pub use selection::Selection;
pub use types::{Mode, Phase, PhaseOptions, ScenarioState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for defining and running scenarios
    pub use crate::{
        Catalog, CommandSpec, Job, Mode, Orchestrator, Phase, PhaseOptions, RunnerConfig,
        Scenario, ScenarioError, ToolPaths,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
