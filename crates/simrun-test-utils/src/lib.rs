//! Testing utilities for simrun workspace
//!
//! Shared executors, fixtures and assertions.

#![allow(missing_docs)]

use parking_lot::Mutex;
use simrun_core::{
    AttackConfig, AttackScenario, Job, JobError, JobExecutor, JobOutcome, PhaseOptions, Producer,
    RunnerConfig,
};
use std::path::PathBuf;
use std::time::Duration;

/// Records every job it is asked to run and reports success
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs executed so far, in completion order
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Executed jobs whose program file name is `program`
    pub fn count_program(&self, program: &str) -> usize {
        self.jobs
            .lock()
            .iter()
            .filter(|job| job.program().file_name().and_then(|name| name.to_str()) == Some(program))
            .count()
    }
}

impl JobExecutor for RecordingExecutor {
    fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        self.jobs.lock().push(job.clone());
        Ok(JobOutcome {
            elapsed: Duration::ZERO,
        })
    }
}

/// Fails every job whose rendered command line contains `needle`
#[derive(Debug)]
pub struct FailingExecutor {
    needle: String,
    inner: RecordingExecutor,
}

impl FailingExecutor {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            inner: RecordingExecutor::new(),
        }
    }

    /// All jobs attempted, failed or not
    pub fn attempted(&self) -> usize {
        self.inner.count()
    }
}

impl JobExecutor for FailingExecutor {
    fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        self.inner.execute(job)?;
        let command = job.to_string();
        if command.contains(&self.needle) {
            return Err(JobError::NonZeroExit { command, code: 1 });
        }
        Ok(JobOutcome {
            elapsed: Duration::ZERO,
        })
    }
}

/// `algorithms × topologies × evils × runs` attack sweep
pub fn attack_config(
    name: &str,
    algorithms: usize,
    topologies: usize,
    evils: usize,
    runs: usize,
) -> AttackConfig {
    AttackConfig {
        name: name.to_string(),
        algorithms: (0..algorithms).map(|i| format!("algorithm-{i}")).collect(),
        topologies: (0..topologies).map(|i| format!("topology-{i}")).collect(),
        evils: (1..=evils as u32).collect(),
        runs: (1..=runs as u32).collect(),
        good_count: 1,
        producer: Producer::Gw,
        default_rtt: "250ms".to_string(),
        folder: name.to_string(),
    }
}

pub fn attack_scenario(
    name: &str,
    algorithms: usize,
    topologies: usize,
    evils: usize,
    runs: usize,
) -> AttackScenario {
    AttackScenario::new(attack_config(name, algorithms, topologies, evils, runs))
}

/// Configuration rooted in `root` so directory preparation stays inside a temp dir
pub fn sandboxed_config(root: impl Into<PathBuf>) -> RunnerConfig {
    let root = root.into();
    let mut config = RunnerConfig::new().with_worker_count(4);
    config.tools.results_dir = root.join("results");
    config.tools.topologies_dir = root.join("topologies");
    config
}

pub fn simulate_and_graph() -> PhaseOptions {
    PhaseOptions {
        simulate: true,
        postprocess: false,
        graph: true,
    }
}

pub fn graph_only() -> PhaseOptions {
    PhaseOptions {
        simulate: false,
        postprocess: false,
        graph: true,
    }
}
