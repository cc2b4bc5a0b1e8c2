//! Instructor Payments Engine Library
//! # Overview
//!
//! This library manages instructor payment-account onboarding against an
//! external payment processor and reconciles instructor earnings from
//! exported payment records.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (PaymentAccount, Payment, EarningsSnapshot, etc.)
//! - [`config`] - Processor credentials and execution mode
//! - [`client`] - HTTP client for the payment processor API
//! - [`store`] - Ledger persistence behind the [`store::LedgerStore`] trait
//! - [`core`] - Business logic components:
//!   - [`core::lifecycle`] - Payment-account state machine and persistence
//!   - [`core::reconcile`] - Pure earnings aggregation over payment records
//!   - [`core::filter`] - Composable payment post-filters
//! - [`io`] - CSV ingest and report rendering for the report binary
//! - [`cli`] - CLI argument parsing
//!
//! # Account Lifecycle
//!
//! A payment account moves forward through three states and never back:
//!
//! - **None**: No processor account exists yet
//! - **Pending**: A processor account was created; onboarding is incomplete
//! - **Complete**: Onboarding finished; the account can receive transfers
//!
//! # Earnings Reconciliation
//!
//! Reconciliation aggregates completed payments into an
//! [`types::EarningsSnapshot`]: lifetime and current-month totals, funds
//! split by transfer state, month-over-month growth, a twelve-month
//! series, and a top-five course ranking. All money math uses
//! [`rust_decimal::Decimal`] with checked arithmetic so that
//! `available + pending == total` holds exactly.

// Module declarations
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod io;
pub mod store;
pub mod types;

pub use client::{AccountCapabilities, CreatedAccount, ProcessorApi, ProcessorClient};
pub use config::{ExecutionMode, ProcessorConfig};
pub use crate::core::{reconcile, AccountLifecycleManager, DateWindow, PaymentFilter, VerifyOutcome};
pub use store::{LedgerStore, MemoryLedger, PaymentQuery};
pub use types::{
    AccountStatus, EarningsSnapshot, EngineError, Payment, PaymentAccount, PaymentStatus,
    TransferStatus, User, UserPatch,
};
