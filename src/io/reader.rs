//! CSV ingest for exported payment records
//!
//! Reads a billing export into memory for reconciliation. Malformed rows
//! are recoverable: they are logged and skipped so one bad record cannot
//! block a report.

use crate::io::csv_format::{convert_payment_record, PaymentCsvRecord};
use crate::types::{EngineError, Payment};
use std::fs::File;
use std::path::Path;

/// Read payment records from a CSV export
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read. Row-level
/// parse failures are skipped with a warning, not surfaced.
pub fn read_payments_csv(path: &Path) -> Result<Vec<Payment>, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::Io {
        message: format!("cannot open {}: {}", path.display(), e),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut payments = Vec::new();
    for (row, result) in reader.deserialize::<PaymentCsvRecord>().enumerate() {
        // Header is line 1; first data row is line 2
        let line = row as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(line, %error, "skipping unreadable payment row");
                continue;
            }
        };

        match convert_payment_record(record) {
            Ok(payment) => payments.push(payment),
            Err(error) => {
                tracing::warn!(line, %error, "skipping invalid payment row");
            }
        }
    }

    Ok(payments)
}
