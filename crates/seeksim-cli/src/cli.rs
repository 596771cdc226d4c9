use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seeksim_engine::{PolicyKind, SimConfig, SimReport, Simulation};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Top-level command line of the `seeksim` binary.
#[derive(Parser)]
#[command(name = "seeksim")]
#[command(about = "Disk I/O scheduling simulator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run one simulation and print its report.
    Run {
        /// Scheduling policy: fifo, sstf, cscan, two-queue-scan or two-queue-look.
        #[arg(short, long)]
        policy: Option<PolicyKind>,
        #[command(flatten)]
        overrides: Overrides,
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Run every policy under the same settings and print one line per policy.
    Compare {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Render the sector occupancy of the generated file layout.
    Layout {
        #[arg(short, long, default_value = "50")]
        tracks: u32,
        #[arg(short, long, env = "SEEKSIM_CONFIG")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

/// Settings shared by `run` and `compare`, layered over the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Upper bound of the per-second request budget.
    #[arg(short, long)]
    pub rate: Option<u32>,
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Completions after which the run stops.
    #[arg(short, long)]
    pub target: Option<u64>,
    /// Leading latency and head samples kept in the report.
    #[arg(long)]
    pub samples: Option<usize>,
    /// TOML or JSON configuration file.
    #[arg(short, long, env = "SEEKSIM_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Overrides {
    /// Loads the config file, if any, and applies the flags on top.
    pub fn resolve(&self) -> Result<SimConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(rate) = self.rate {
            config.arrival.max_requests_per_second = rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(target) = self.target {
            config.target_completions = target;
        }
        if let Some(samples) = self.samples {
            config.sample_limit = samples;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

impl Cli {
    /// Executes the parsed command, writing its output to stdout.
    pub fn run(self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match self.command {
            Command::Run {
                policy,
                overrides,
                format,
            } => {
                let mut config = overrides.resolve()?;
                if let Some(policy) = policy {
                    config.policy = policy;
                }
                let report = Simulation::new(config)?.run()?;
                output::write_report(&report, format, &mut out)
            }
            Command::Compare { overrides } => {
                let config = overrides.resolve()?;
                let reports = compare(&config)?;
                writeln!(out, "{}", output::summary_header())?;
                for report in &reports {
                    writeln!(out, "{}", output::summary_line(report))?;
                }
                Ok(())
            }
            Command::Layout {
                tracks,
                config,
                seed,
            } => {
                let mut config = load_config(config.as_deref())?;
                if let Some(seed) = seed {
                    config.seed = seed;
                }
                let sim = Simulation::new(config)?;
                let map = sim.sector_map();
                writeln!(
                    out,
                    "{} sectors occupied on {} of {} tracks",
                    map.occupied_count(),
                    map.used_tracks(),
                    map.track_count()
                )?;
                write!(out, "{}", map.render_tracks(tracks))?;
                Ok(())
            }
        }
    }
}

/// Runs every policy on its own thread with otherwise identical settings.
pub fn compare(config: &SimConfig) -> Result<Vec<SimReport>> {
    info!(
        "Comparing {} policies at rate {}",
        PolicyKind::ALL.len(),
        config.arrival.max_requests_per_second
    );
    let results: Vec<Result<SimReport>> = std::thread::scope(|scope| {
        let handles: Vec<_> = PolicyKind::ALL
            .into_iter()
            .map(|policy| {
                let config = SimConfig {
                    policy,
                    ..config.clone()
                };
                scope.spawn(move || -> Result<SimReport> { Ok(Simulation::new(config)?.run()?) })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(_) => {
                    error!("Simulation thread panicked");
                    Err(anyhow::anyhow!("simulation thread panicked"))
                }
            })
            .collect()
    });
    results.into_iter().collect()
}
