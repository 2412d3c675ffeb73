//! Error types for simrun
//!
//! Provides error handling for:
//! - Worker pool lifecycle (submission after shutdown)
//! - External process failures (spawn, nonzero exit, signals)
//! - Scenario materialisation (empty sweeps, directory preparation)
//! - Selection validation and configuration loading

use std::path::PathBuf;

/// Main runner error type
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Selection rejected before any work started
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Worker pool misuse
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// Scenario could not materialise its jobs
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RunnerError {
    /// Check if the caller should be shown usage guidance
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Selection(_) | Self::Config(_))
    }
}

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Job submitted after `shutdown()`
    #[error("worker pool is closed")]
    Closed,

    /// Worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    SpawnWorker(#[source] std::io::Error),
}

/// External job execution failures
///
/// These are reported by the worker that ran the job and never stop the pool.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Process could not be started
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a started process failed
    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        /// Rendered command line
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a nonzero status
    #[error("`{command}` exited with status {code}")]
    NonZeroExit {
        /// Rendered command line
        command: String,
        /// Exit code
        code: i32,
    },

    /// Process was terminated by a signal
    #[error("`{command}` terminated by signal")]
    Terminated {
        /// Rendered command line
        command: String,
    },

    /// Pipeline stage could not be wired to its successor
    #[error("failed to connect pipeline stage `{command}`")]
    Pipe {
        /// Rendered stage command line
        command: String,
    },
}

impl JobError {
    /// Command line of the failed job or stage
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. }
            | Self::Wait { command, .. }
            | Self::NonZeroExit { command, .. }
            | Self::Terminated { command }
            | Self::Pipe { command } => command,
        }
    }
}

/// Scenario materialisation errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A sweep dimension has no values
    #[error("scenario `{scenario}` has an empty `{dimension}` sweep")]
    EmptySweep {
        /// Scenario name
        scenario: String,
        /// Dimension name
        dimension: &'static str,
    },

    /// Output directory could not be created
    #[error("failed to create directory {}: {source}", path.display())]
    Directory {
        /// Directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Selection validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// No scenario names given outside list mode
    #[error("at least one scenario needs to be specified")]
    Empty,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::RunnerConfig`]
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Worker pool cannot have zero workers
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_selection_and_config_errors_need_usage() {
        let err = RunnerError::from(ScenarioError::EmptySweep {
            scenario: "attack".to_string(),
            dimension: "runs",
        });
        assert!(!err.is_usage_error());
        assert!(!RunnerError::from(PoolError::Closed).is_usage_error());
        assert!(RunnerError::from(SelectionError::Empty).is_usage_error());
        assert!(RunnerError::from(ConfigError::InvalidWorkerCount).is_usage_error());
    }

    #[test]
    fn job_error_exposes_command() {
        let err = JobError::NonZeroExit {
            command: "./build/sim --run=1".to_string(),
            code: 3,
        };
        assert_eq!(err.command(), "./build/sim --run=1");
        assert_eq!(err.to_string(), "`./build/sim --run=1` exited with status 3");
    }

    #[test]
    fn empty_sweep_message_names_dimension() {
        let err = ScenarioError::EmptySweep {
            scenario: "attack-small-tree".to_string(),
            dimension: "algorithms",
        };
        assert_eq!(
            err.to_string(),
            "scenario `attack-small-tree` has an empty `algorithms` sweep"
        );
    }
}
