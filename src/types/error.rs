//! Error types for the instructor payments engine
//!
//! This module defines all error types that can occur during account
//! provisioning, processor calls, and earnings reconciliation.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: missing/invalid credentials; fatal for any processor call
//! - **Validation Errors**: malformed input caught before any network call
//! - **Processor Errors**: the external API rejected the request; recoverable
//! - **Transient Network Errors**: connectivity/timeout on a read-only call, surfaced
//!   after the retry budget is exhausted
//! - **Store Errors**: ledger read/write failures
//! - **Reconciliation Inconsistency**: the available+pending==total identity broke;
//!   a programming-error assertion, never expected at runtime

use crate::types::account::AccountStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the instructor payments engine
///
/// Each variant carries enough context to diagnose the failure at the
/// boundary where it is reported. Lifecycle operations surface these as
/// structured results; they never escape as unhandled faults.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Missing or invalid processor credentials
    ///
    /// Fatal for every processor call. Surfaced immediately, never retried.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },

    /// Malformed input to a lifecycle or reconciliation operation
    ///
    /// The caller's responsibility; detected before any network call.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the invalid input
        message: String,
    },

    /// The external processor rejected the request
    ///
    /// Recoverable - the lifecycle remains in its prior state and the
    /// caller is informed (e.g., unsupported country, malformed fields).
    #[error("Processor error{}: {message}", code.as_ref().map(|c| format!(" [{}]", c)).unwrap_or_default())]
    Processor {
        /// Machine-readable error code from the processor, if present
        code: Option<String>,
        /// Human-readable message from the processor
        message: String,
    },

    /// Connectivity or timeout failure on a read-only processor call
    ///
    /// Surfaced only after the bounded retry policy is exhausted.
    #[error("Network error during {operation} after {attempts} attempts: {message}")]
    TransientNetwork {
        /// The operation that failed
        operation: String,
        /// Number of attempts made before giving up
        attempts: u32,
        /// Description of the underlying failure
        message: String,
    },

    /// A lifecycle transition was requested from an incompatible state
    ///
    /// E.g. provisioning an account that is already Pending or Complete.
    /// Rejected rather than silently re-provisioning a second external account.
    #[error("Cannot {operation} a payment account in state {status}")]
    InvalidTransition {
        /// The operation that was rejected
        operation: String,
        /// The account state at the time of the request
        status: AccountStatus,
    },

    /// Ledger store read or write failure
    #[error("Ledger store error: {message}")]
    Store {
        /// Description of the store failure
        message: String,
    },

    /// I/O error while reading or writing report files
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error in an exported payment record
    ///
    /// Recoverable - the malformed record is skipped and ingest continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// The available+pending==total identity did not hold after aggregation
    ///
    /// Must never occur given exact decimal arithmetic; its detection is a
    /// programming error, not a user-facing condition.
    #[error("Reconciliation inconsistency: available {available} + pending {pending} != total {total}")]
    ReconciliationInconsistency {
        /// The grand total over completed payments
        total: Decimal,
        /// The available (transferred) portion
        available: Decimal,
        /// The pending (untransferred) portion
        pending: Decimal,
    },
}

// Conversion from io::Error to EngineError
impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::Io {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to EngineError
impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        EngineError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl EngineError {
    /// Create a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration {
            message: message.into(),
        }
    }

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
        }
    }

    /// Create a Processor error
    pub fn processor(code: Option<&str>, message: impl Into<String>) -> Self {
        EngineError::Processor {
            code: code.map(|c| c.to_string()),
            message: message.into(),
        }
    }

    /// Create a TransientNetwork error
    pub fn transient_network(operation: &str, attempts: u32, message: impl Into<String>) -> Self {
        EngineError::TransientNetwork {
            operation: operation.to_string(),
            attempts,
            message: message.into(),
        }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(operation: &str, status: AccountStatus) -> Self {
        EngineError::InvalidTransition {
            operation: operation.to_string(),
            status,
        }
    }

    /// Create a Store error
    pub fn store(message: impl Into<String>) -> Self {
        EngineError::Store {
            message: message.into(),
        }
    }

    /// True if the error represents a transient condition worth retrying
    ///
    /// Only connectivity/timeout failures qualify; processor rejections,
    /// validation failures, and configuration problems never do.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::TransientNetwork { .. })
    }
}
