//! Orchestrator
//!
//! Drives the catalog through the phase barrier:
//! - Validates the selection before any work starts
//! - Skips unselected scenarios, names selected ones in list mode
//! - Materialises and submits one phase at a time, draining the shared pool
//!   between consecutive phases of a scenario and once after the scenario
//! - Drains and shuts the pool down on the way out, on success or error

use crate::catalog::Catalog;
use crate::config::RunnerConfig;
use crate::error::{RunnerError, SelectionError};
use crate::job::{DryRunExecutor, JobExecutor, ProcessExecutor};
use crate::pool::{PoolStats, WorkerPool};
use crate::scenario::Scenario;
use crate::selection::Selection;
use crate::types::{Mode, Phase, ScenarioState};
use std::sync::Arc;

/// Jobs materialised per phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    /// Simulate jobs
    pub simulate: usize,
    /// Postprocess jobs
    pub postprocess: usize,
    /// Graph jobs
    pub graph: usize,
}

impl PhaseCounts {
    /// Count for one phase
    #[must_use]
    pub fn get(&self, phase: Phase) -> usize {
        match phase {
            Phase::Simulate => self.simulate,
            Phase::Postprocess => self.postprocess,
            Phase::Graph => self.graph,
        }
    }

    /// Sum over all phases
    #[must_use]
    pub fn total(&self) -> usize {
        self.simulate + self.postprocess + self.graph
    }

    fn record(&mut self, phase: Phase, count: usize) {
        match phase {
            Phase::Simulate => self.simulate += count,
            Phase::Postprocess => self.postprocess += count,
            Phase::Graph => self.graph += count,
        }
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Final state
    pub state: ScenarioState,
    /// Jobs submitted per phase
    pub jobs: PhaseCounts,
    /// Drains performed between consecutive phases
    pub barriers: usize,
}

impl ScenarioReport {
    fn new(name: &str, state: ScenarioState) -> Self {
        Self {
            name: name.to_string(),
            state,
            jobs: PhaseCounts::default(),
            barriers: 0,
        }
    }
}

/// Outcome of an orchestrator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Names printed in list mode, in catalog order
    pub listed: Vec<String>,
    /// One report per catalog entry, in catalog order
    pub reports: Vec<ScenarioReport>,
    /// Pool statistics after shutdown
    pub stats: PoolStats,
}

impl RunSummary {
    /// Report for a scenario
    #[must_use]
    pub fn report(&self, name: &str) -> Option<&ScenarioReport> {
        self.reports.iter().find(|report| report.name == name)
    }

    /// Jobs submitted across all scenarios
    #[must_use]
    pub fn total_jobs(&self) -> usize {
        self.reports.iter().map(|report| report.jobs.total()).sum()
    }
}

/// Top-level driver owning the catalog and the shared worker pool
#[derive(Debug)]
pub struct Orchestrator {
    config: RunnerConfig,
    selection: Selection,
    catalog: Catalog,
    pool: WorkerPool,
}

impl Orchestrator {
    /// Create an orchestrator whose executor follows `config.dry_run`
    ///
    /// # Errors
    /// - `RunnerError::Config` for an invalid configuration
    /// - `RunnerError::Selection` when running with no scenario named
    /// - `RunnerError::Pool` if the workers cannot start
    pub fn new(config: RunnerConfig, catalog: Catalog) -> Result<Self, RunnerError> {
        let executor: Arc<dyn JobExecutor> = if config.dry_run {
            Arc::new(DryRunExecutor)
        } else {
            Arc::new(ProcessExecutor)
        };
        Self::with_executor(config, catalog, executor)
    }

    /// Create an orchestrator with a custom executor
    ///
    /// Selection and configuration are validated before the pool exists.
    ///
    /// # Errors
    /// Same as [`Orchestrator::new`].
    pub fn with_executor(
        config: RunnerConfig,
        catalog: Catalog,
        executor: Arc<dyn JobExecutor>,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        let selection = match (config.mode, config.selection()) {
            (Mode::Run, selection) if selection.is_empty() => {
                return Err(SelectionError::Empty.into())
            }
            (Mode::List, selection) if selection.is_empty() => Selection::All,
            (_, selection) => selection,
        };

        {
            let known = catalog.names();
            for name in selection.unknown(&known) {
                tracing::warn!("unknown scenario `{name}` ignored");
            }
        }

        let pool = WorkerPool::with_executor(config.worker_count, executor)?;
        Ok(Self {
            config,
            selection,
            catalog,
            pool,
        })
    }

    /// Effective selection
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Run the catalog, then drain and shut the pool down
    ///
    /// # Errors
    /// - `RunnerError::Scenario` if a scenario cannot materialise its jobs;
    ///   jobs already submitted still run to completion
    /// - `RunnerError::Pool` on submission after shutdown
    pub fn run(self) -> Result<RunSummary, RunnerError> {
        let outcome = self.run_catalog();

        self.pool.drain();
        self.pool.shutdown();
        let stats = self.pool.stats();
        tracing::info!(
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "worker pool finished"
        );

        match outcome {
            Ok((listed, reports)) => Ok(RunSummary {
                listed,
                reports,
                stats,
            }),
            Err(err) => {
                tracing::error!("run aborted: {err}");
                Err(err)
            }
        }
    }

    fn run_catalog(&self) -> Result<(Vec<String>, Vec<ScenarioReport>), RunnerError> {
        let mut listed = Vec::new();
        let mut reports = Vec::with_capacity(self.catalog.len());

        for scenario in self.catalog.iter() {
            let name = scenario.name();
            if !self.selection.contains(name) {
                tracing::trace!("skipping {name}");
                reports.push(ScenarioReport::new(name, ScenarioState::Skipped));
                continue;
            }
            if self.config.mode == Mode::List {
                listed.push(name.to_string());
                reports.push(ScenarioReport::new(name, ScenarioState::Listed));
                continue;
            }
            reports.push(self.run_scenario(scenario.as_ref())?);
        }

        Ok((listed, reports))
    }

    /// Simulating → Postprocessing → Graphing → Done, with a drain between phases
    fn run_scenario(&self, scenario: &dyn Scenario) -> Result<ScenarioReport, RunnerError> {
        let name = scenario.name();
        let tools = &self.config.tools;
        let mut report = ScenarioReport::new(name, ScenarioState::Done);
        let mut previous: Option<Phase> = None;

        tracing::info!("scenario {name}: starting");
        for phase in self.config.phases.phases() {
            if let Some(previous) = previous {
                tracing::debug!("scenario {name}: waiting for {previous} before {phase}");
                self.pool.drain();
                report.barriers += 1;
            }
            if phase == Phase::Simulate {
                scenario.prepare(tools)?;
            }

            let jobs = scenario.jobs(phase, tools)?;
            tracing::info!("scenario {name}: {phase} ({} jobs)", jobs.len());
            report.jobs.record(phase, jobs.len());
            for job in jobs {
                self.pool.submit(job)?;
            }
            previous = Some(phase);
        }

        self.pool.drain();
        tracing::info!("scenario {name}: done");
        Ok(report)
    }
}
