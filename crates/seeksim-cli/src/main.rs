#![warn(missing_docs)]

//! `seeksim` binary entry point.

use anyhow::Result;
use clap::Parser;
use seeksim_cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    tracing::debug!("SeekSim CLI starting...");

    Cli::parse().run()
}
