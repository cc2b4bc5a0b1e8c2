//! I/O handling for the report binary
//!
//! CSV ingest of exported payment records and report rendering. All
//! format conversion lives in [`csv_format`] as pure functions.

pub mod csv_format;
pub mod reader;

pub use csv_format::{convert_payment_record, write_earnings_report, PaymentCsvRecord};
pub use reader::read_payments_csv;
