use crate::core::filter::{DateWindow, PaymentFilter};
use crate::types::{EngineError, TransferStatus};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Reconcile instructor earnings from an exported payment-record CSV
#[derive(Parser, Debug)]
#[command(name = "earnings-report")]
#[command(about = "Reconcile instructor earnings from exported payment records", long_about = None)]
pub struct CliArgs {
    /// Input CSV file containing exported payment records
    #[arg(value_name = "INPUT", help = "Path to the payment export CSV")]
    pub input_file: PathBuf,

    /// Instructor to reconcile earnings for
    #[arg(long = "instructor", value_name = "ID")]
    pub instructor: String,

    /// Free-text filter against student and course names
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Restrict to one transfer state
    #[arg(long = "transfer-status", value_name = "STATUS")]
    pub transfer_status: Option<TransferStatusArg>,

    /// Restrict to one course id
    #[arg(long = "course", value_name = "COURSE_ID")]
    pub course: Option<String>,

    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long = "from", value_name = "DATE")]
    pub from: Option<String>,

    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long = "to", value_name = "DATE")]
    pub to: Option<String>,
}

/// Transfer-state selection for the CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TransferStatusArg {
    Pending,
    Completed,
}

impl From<TransferStatusArg> for TransferStatus {
    fn from(arg: TransferStatusArg) -> Self {
        match arg {
            TransferStatusArg::Pending => TransferStatus::Pending,
            TransferStatusArg::Completed => TransferStatus::Completed,
        }
    }
}

impl CliArgs {
    /// Build the payment filter described by the CLI flags
    ///
    /// # Errors
    ///
    /// Returns a validation error for unparseable dates or an inverted
    /// date range.
    pub fn to_filter(&self) -> Result<PaymentFilter, EngineError> {
        let mut filter = PaymentFilter::new();

        if let Some(text) = &self.search {
            filter = filter.with_search(text.clone());
        }
        if let Some(status) = self.transfer_status {
            filter = filter.with_transfer_status(status.into());
        }
        if let Some(course) = &self.course {
            filter = filter.with_course(course.clone());
        }
        if self.from.is_some() || self.to.is_some() {
            let from = match &self.from {
                Some(date) => start_of_day(date)?,
                None => DateTime::<Utc>::MIN_UTC,
            };
            let to = match &self.to {
                Some(date) => end_of_day(date)?,
                None => DateTime::<Utc>::MAX_UTC,
            };
            filter = filter.with_window(DateWindow::new(from, to)?);
        }

        Ok(filter)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| EngineError::validation(format!("invalid date '{}', expected YYYY-MM-DD", input)))
}

fn start_of_day(input: &str) -> Result<DateTime<Utc>, EngineError> {
    Ok(parse_date(input)?.and_time(NaiveTime::MIN).and_utc())
}

/// Last representable instant of the given day, so `--to` stays inclusive
fn end_of_day(input: &str) -> Result<DateTime<Utc>, EngineError> {
    let date = parse_date(input)?;
    date.checked_add_days(Days::new(1))
        .and_then(|next| {
            next.and_time(NaiveTime::MIN)
                .checked_sub_signed(TimeDelta::nanoseconds(1))
        })
        .map(|end| end.and_utc())
        .ok_or_else(|| EngineError::validation(format!("date '{}' is out of range", input)))
}
