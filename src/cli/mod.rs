//! Command-line interface for the earnings report binary

mod args;

pub use args::{CliArgs, TransferStatusArg};

use clap::Parser;

/// Parse command-line arguments
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
