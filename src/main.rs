//! Earnings Report CLI
//!
//! Command-line interface for reconciling instructor earnings from an
//! exported payment-record CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --instructor inst_1 payments.csv > report.csv
//! cargo run -- --instructor inst_1 --transfer-status pending payments.csv
//! cargo run -- --instructor inst_1 --from 2026-01-01 --to 2026-06-30 payments.csv
//! ```
//!
//! The program reads payment records from the input CSV file, applies any
//! requested filters, reconciles the instructor's earnings, and writes the
//! report to stdout.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, inconsistent records, etc.)

use chrono::Utc;
use instructor_payments_engine::cli;
use instructor_payments_engine::core::reconcile;
use instructor_payments_engine::io::{read_payments_csv, write_earnings_report};
use instructor_payments_engine::types::EngineError;
use std::process;

fn main() {
    // .env is optional; real deployments set the environment directly
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), EngineError> {
    let filter = args.to_filter()?;
    let payments = read_payments_csv(&args.input_file)?;
    let selected: Vec<_> = filter.apply(&payments).into_iter().cloned().collect();

    let snapshot = reconcile(&args.instructor, Utc::now(), None, &selected)?;

    let mut output = std::io::stdout();
    write_earnings_report(&args.instructor, &snapshot, &mut output)
}
