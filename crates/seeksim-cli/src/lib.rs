#![warn(missing_docs)]

//! SeekSim command line: argument parsing and report rendering for the `seeksim` binary.

pub mod cli;
pub mod output;

pub use cli::{compare, Cli, Command, Overrides};
pub use output::{summary_header, summary_line, write_report, OutputFormat};
