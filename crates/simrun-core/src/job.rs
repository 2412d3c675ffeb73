//! Jobs and job executors
//!
//! A [`Job`] is an immutable description of one external invocation: either a
//! single command or a pipeline of commands whose stdout feeds the next
//! stage's stdin. Arguments are kept as a structured list and never pass
//! through a shell.
//!
//! Execution goes through the [`JobExecutor`] trait so the worker pool can run
//! real processes ([`ProcessExecutor`]) or only announce them
//! ([`DryRunExecutor`]).

use crate::error::JobError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// One program invocation with its ordered argument list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSpec {
    /// Create a command with no arguments
    #[inline]
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument
    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several positional arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a `--name=value` flag
    #[inline]
    #[must_use]
    pub fn flag(self, name: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("--{name}={value}"))
    }

    /// Program path
    #[inline]
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument list
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Immutable unit of work handed to the worker pool
///
/// Always holds at least one stage; a single-stage job is a plain command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    stages: Vec<CommandSpec>,
}

impl Job {
    /// Job running a single command
    #[inline]
    #[must_use]
    pub fn command(spec: CommandSpec) -> Self {
        Self { stages: vec![spec] }
    }

    /// Job running `first | rest...`
    #[must_use]
    pub fn pipeline(first: CommandSpec, rest: impl IntoIterator<Item = CommandSpec>) -> Self {
        let mut stages = vec![first];
        stages.extend(rest);
        Self { stages }
    }

    /// Program of the first stage
    #[inline]
    #[must_use]
    pub fn program(&self) -> &Path {
        self.stages[0].program()
    }

    /// Arguments of the first stage
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        self.stages[0].arguments()
    }

    /// All stages in order
    #[inline]
    #[must_use]
    pub fn stages(&self) -> &[CommandSpec] {
        &self.stages
    }

    /// Whether this job connects several stages
    #[inline]
    #[must_use]
    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, stage) in self.stages.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

/// Successful job completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    /// Wall time from spawn to exit
    pub elapsed: Duration,
}

/// Strategy for running a job to completion
///
/// Implementations must not retry; the caller only observes the result.
pub trait JobExecutor: Send + Sync {
    /// Run `job` and report how it ended
    fn execute(&self, job: &Job) -> Result<JobOutcome, JobError>;
}

/// Runs jobs as real child processes with inherited stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl JobExecutor for ProcessExecutor {
    fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        tracing::info!("{job}");
        let started = Instant::now();
        if job.is_pipeline() {
            run_pipeline(job.stages())?;
        } else {
            run_single(&job.stages()[0])?;
        }
        Ok(JobOutcome {
            elapsed: started.elapsed(),
        })
    }
}

/// Logs jobs without starting any process
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl JobExecutor for DryRunExecutor {
    fn execute(&self, job: &Job) -> Result<JobOutcome, JobError> {
        tracing::info!("[dry-run] {job}");
        Ok(JobOutcome {
            elapsed: Duration::ZERO,
        })
    }
}

fn run_single(spec: &CommandSpec) -> Result<(), JobError> {
    let status = spec
        .to_command()
        .status()
        .map_err(|source| JobError::Spawn {
            command: spec.to_string(),
            source,
        })?;
    check_status(spec, status)
}

/// Spawn every stage, wiring stdout to the next stdin, then wait for all of them.
///
/// The first failing stage (in pipeline order) is reported.
fn run_pipeline(stages: &[CommandSpec]) -> Result<(), JobError> {
    let mut children: Vec<(&CommandSpec, Child)> = Vec::with_capacity(stages.len());
    let mut upstream = None;

    for (idx, stage) in stages.iter().enumerate() {
        let is_last = idx + 1 == stages.len();
        let mut cmd = stage.to_command();
        if let Some(stdout) = upstream.take() {
            cmd.stdin(Stdio::from(stdout));
        }
        if !is_last {
            cmd.stdout(Stdio::piped());
        }

        let spawned = cmd.spawn();
        // the parent's copy of the upstream read end must be closed before
        // any earlier stage is waited on, or a writer blocked on a full pipe
        // never exits
        drop(cmd);

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                reap(children);
                return Err(JobError::Spawn {
                    command: stage.to_string(),
                    source,
                });
            }
        };

        if !is_last {
            match child.stdout.take() {
                Some(stdout) => upstream = Some(stdout),
                None => {
                    children.push((stage, child));
                    reap(children);
                    return Err(JobError::Pipe {
                        command: stage.to_string(),
                    });
                }
            }
        }
        children.push((stage, child));
    }

    let mut first_failure = None;
    for (stage, mut child) in children {
        let result = child
            .wait()
            .map_err(|source| JobError::Wait {
                command: stage.to_string(),
                source,
            })
            .and_then(|status| check_status(stage, status));
        if let Err(err) = result {
            first_failure.get_or_insert(err);
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn reap(children: Vec<(&CommandSpec, Child)>) {
    for (stage, mut child) in children {
        if let Err(err) = child.wait() {
            tracing::warn!("failed to reap `{stage}`: {err}");
        }
    }
}

fn check_status(spec: &CommandSpec, status: ExitStatus) -> Result<(), JobError> {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(JobError::NonZeroExit {
            command: spec.to_string(),
            code,
        }),
        None => Err(JobError::Terminated {
            command: spec.to_string(),
        }),
    }
}
