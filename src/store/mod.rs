//! Ledger store interface
//!
//! The document database is an external collaborator; the engine consumes
//! it through this narrow trait with atomic, strongly-consistent
//! single-document semantics. The engine never mutates `Payment` records -
//! it only reads them and writes derived payment-account state onto users.

use crate::types::{EngineError, InstructorId, Payment, PaymentStatus, User, UserPatch};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryLedger;

/// Filter for payment queries against the ledger
///
/// Absent fields match everything. Richer predicate filtering (text
/// search, date windows) happens in memory over the returned set, not at
/// the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentQuery {
    /// Restrict to one instructor's payments
    pub instructor_id: Option<InstructorId>,
    /// Restrict to one charge status
    pub status: Option<PaymentStatus>,
}

impl PaymentQuery {
    /// Completed payments for one instructor - the reconciliation input set
    pub fn completed_for(instructor_id: impl Into<InstructorId>) -> Self {
        PaymentQuery {
            instructor_id: Some(instructor_id.into()),
            status: Some(PaymentStatus::Completed),
        }
    }

    /// Whether a payment satisfies this query
    pub fn matches(&self, payment: &Payment) -> bool {
        if let Some(instructor_id) = &self.instructor_id {
            if &payment.instructor_id != instructor_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if payment.status != status {
                return false;
            }
        }
        true
    }
}

/// Narrow interface over the document database
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch a user document by id
    async fn get_user(&self, id: &str) -> Result<User, EngineError>;

    /// Apply a partial update to a user document
    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<(), EngineError>;

    /// Fetch payment records matching a query
    async fn query_payments(&self, query: &PaymentQuery) -> Result<Vec<Payment>, EngineError>;
}
