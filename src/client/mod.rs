//! Payment processor client
//!
//! This module owns the request/response wrapper around the external
//! processor's REST API: HTTP transport, bearer-auth injection, and error
//! classification. It holds no business state; retries and persistence are
//! the lifecycle manager's concern except for the bounded retry policy on
//! read-only calls.
//!
//! The [`ProcessorApi`] trait is the seam the lifecycle manager depends
//! on, so tests can substitute a scripted processor without any network.

use crate::types::{AccountId, EngineError};
use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod processor;

pub use processor::ProcessorClient;

/// Result of creating a connect sub-account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
    /// External processor identifier for the new sub-account
    pub account_id: AccountId,
    /// Processor-hosted onboarding URL for the initial redirect
    pub onboarding_url: String,
}

/// Capability snapshot reported by the processor for a sub-account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountCapabilities {
    /// Whether the instructor finished submitting identity/banking details
    pub details_submitted: bool,
    /// Whether the processor has granted the charges capability
    pub charges_enabled: bool,
    /// Whether the processor has granted the payouts capability
    pub payouts_enabled: bool,
}

/// Operations the engine needs from the payment processor
///
/// Account creation is non-idempotent at the processor and is never
/// auto-retried; status fetches and link creation are read-only/idempotent
/// and retry with bounded exponential backoff.
#[async_trait]
pub trait ProcessorApi: Send + Sync {
    /// Create a connect sub-account and its initial onboarding link
    ///
    /// Side effect: creates a real external resource. The caller is
    /// responsible for invoking this at most once per instructor per
    /// pending cycle.
    async fn create_connect_account(
        &self,
        email: &str,
        legal_name: &str,
        country: &str,
    ) -> Result<CreatedAccount, EngineError>;

    /// Fetch the current capability snapshot for a sub-account
    async fn fetch_account_status(
        &self,
        account_id: &str,
    ) -> Result<AccountCapabilities, EngineError>;

    /// Create a fresh onboarding link for initial or repeat onboarding
    async fn create_onboarding_link(&self, account_id: &str) -> Result<String, EngineError>;

    /// Move funds from the platform balance to a sub-account
    ///
    /// In sandbox mode this short-circuits to a deterministic synthetic
    /// transfer id without touching the network.
    async fn initiate_transfer(
        &self,
        account_id: &str,
        amount: Decimal,
        reference: &str,
    ) -> Result<String, EngineError>;
}
