//! simrun - batch launcher for the simulation scenario catalog
//!
//! Usage:
//!   simrun --list
//!   simrun -s attack-small-tree
//!   simrun -g -p attack-small-tree-summary
//!   simrun -j 8 all

use anyhow::Result;
use clap::{CommandFactory, Parser};
use simrun_core::{
    Catalog, ConfigError, Mode, Orchestrator, PhaseOptions, RunSummary, RunnerConfig, RunnerError,
    SelectionError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "simrun")]
#[command(version, about = "Simulation runner")]
struct Cli {
    /// Scenarios to run (`all` selects the whole catalog)
    #[arg(value_name = "SCENARIO")]
    scenarios: Vec<String>,

    /// Get list of available scenarios
    #[arg(short, long)]
    list: bool,

    /// Run simulation and postprocessing
    #[arg(short, long)]
    simulate: bool,

    /// Run postprocessing on existing simulation output
    #[arg(short, long)]
    postprocess: bool,

    /// Do not build graphs for the scenarios
    #[arg(short = 'g', long = "no-graph")]
    no_graph: bool,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Log the commands without running them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Configuration file (or defaults) overlaid with the flags
    fn runner_config(&self) -> Result<RunnerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => RunnerConfig::load(path)?,
            None => RunnerConfig::new(),
        };

        let phases = PhaseOptions {
            simulate: base.phases.simulate || self.simulate,
            postprocess: base.phases.postprocess || self.postprocess,
            graph: base.phases.graph && !self.no_graph,
        };
        let mode = if self.list { Mode::List } else { base.mode };
        let worker_count = self.jobs.unwrap_or(base.worker_count);
        let dry_run = base.dry_run || self.dry_run;
        let scenarios = if self.scenarios.is_empty() {
            base.scenarios.clone()
        } else {
            self.scenarios.clone()
        };

        Ok(base
            .with_mode(mode)
            .with_phases(phases)
            .with_worker_count(worker_count)
            .with_dry_run(dry_run)
            .with_scenarios(scenarios))
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    fmt().with_env_filter(filter).with_target(false).init();
}

fn announce(config: &RunnerConfig) {
    let names = config.scenarios.join(",");
    if config.phases.simulate {
        println!("Simulating the following scenarios: {names}");
    } else if config.phases.postprocess {
        println!("Postprocessing the following scenarios: {names}");
    }
    if config.phases.graph {
        println!("Building graphs for the following scenarios: {names}");
    }
}

fn log_summary(summary: &RunSummary) {
    let stats = summary.stats;
    if stats.failed > 0 {
        tracing::warn!(
            "{} of {} jobs failed; see the log above for the commands",
            stats.failed,
            stats.submitted
        );
    }
    for report in summary.reports.iter().filter(|r| r.jobs.total() > 0) {
        tracing::debug!(
            simulate = report.jobs.simulate,
            postprocess = report.jobs.postprocess,
            graph = report.jobs.graph,
            "{}",
            report.name
        );
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.runner_config().map_err(RunnerError::from)?;
    let mode = config.mode;
    if mode == Mode::Run {
        // usage errors surface before anything is announced
        config.validate().map_err(RunnerError::from)?;
        if config.selection().is_empty() {
            return Err(RunnerError::from(SelectionError::Empty).into());
        }
        announce(&config);
    }

    let orchestrator = Orchestrator::new(config, Catalog::standard())?;
    let summary = orchestrator.run()?;

    match mode {
        Mode::List => {
            println!("Available scenarios:");
            for name in &summary.listed {
                println!("    {name}");
            }
        }
        Mode::Run => log_summary(&summary),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RunnerError>() {
                Some(runner) if runner.is_usage_error() => {
                    eprintln!("ERROR: {runner}");
                    eprintln!("{}", Cli::command().render_help());
                }
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("simrun").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_build_graphs_only() {
        let config = parse(&["attack-tree"]).runner_config().unwrap();
        assert_eq!(config.mode, Mode::Run);
        assert_eq!(config.scenarios, ["attack-tree"]);
        assert_eq!(
            config.phases,
            PhaseOptions {
                simulate: false,
                postprocess: false,
                graph: true,
            }
        );
        assert!(!config.dry_run);
    }

    #[test]
    fn short_flags_map_to_config() {
        let config = parse(&["-s", "-g", "-n", "-j", "3", "a", "b"])
            .runner_config()
            .unwrap();
        assert!(config.phases.simulate);
        assert!(!config.phases.graph);
        assert!(config.dry_run);
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.scenarios, ["a", "b"]);
    }

    #[test]
    fn list_needs_no_scenarios() {
        let config = parse(&["--list"]).runner_config().unwrap();
        assert_eq!(config.mode, Mode::List);
        assert!(config.scenarios.is_empty());
    }

    #[test]
    fn run_without_scenarios_is_a_usage_error() {
        let err = run(&parse(&[])).unwrap_err();
        let runner = err.downcast_ref::<RunnerError>().unwrap();
        assert!(runner.is_usage_error());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simrun.toml");
        std::fs::write(
            &path,
            "worker_count = 2\nscenarios = [\"attack-tree\"]\n\n[phases]\nsimulate = true\n",
        )
        .unwrap();

        let cli = parse(&["-c", path.to_str().unwrap(), "-j", "5", "-g"]);
        let config = cli.runner_config().unwrap();
        assert_eq!(config.worker_count, 5);
        assert_eq!(config.scenarios, ["attack-tree"]);
        assert!(config.phases.simulate);
        assert!(!config.phases.graph);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = parse(&["-c", "/no/such/simrun.toml", "all"]);
        assert!(matches!(cli.runner_config(), Err(ConfigError::Read { .. })));
    }
}
