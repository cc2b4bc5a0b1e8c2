//! In-memory ledger store
//!
//! Reference implementation of [`LedgerStore`] over plain maps. Backs the
//! integration suite and any embedded use where a real document database
//! is not wired in.

use crate::store::{LedgerStore, PaymentQuery};
use crate::types::{EngineError, Payment, User, UserPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// HashMap-backed ledger
///
/// User documents are keyed by id; payments are an append-only list.
/// A single mutex is enough here - operations are single-document and the
/// store is not a contention point.
#[derive(Default)]
pub struct MemoryLedger {
    users: Mutex<HashMap<String, User>>,
    payments: Mutex<Vec<Payment>>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user document
    ///
    /// Seeding helper; recovers from a poisoned lock since the held data
    /// stays valid.
    pub fn put_user(&self, user: User) {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        users.insert(user.id.clone(), user);
    }

    /// Append an immutable payment record
    pub fn put_payment(&self, payment: Payment) {
        let mut payments = self.payments.lock().unwrap_or_else(PoisonError::into_inner);
        payments.push(payment);
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, HashMap<String, User>>, EngineError> {
        self.users
            .lock()
            .map_err(|_| EngineError::store("user ledger mutex poisoned"))
    }

    fn lock_payments(&self) -> Result<MutexGuard<'_, Vec<Payment>>, EngineError> {
        self.payments
            .lock()
            .map_err(|_| EngineError::store("payment ledger mutex poisoned"))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_user(&self, id: &str) -> Result<User, EngineError> {
        let users = self.lock_users()?;
        users
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::store(format!("user {} not found", id)))
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<(), EngineError> {
        let mut users = self.lock_users()?;
        let user = users
            .get_mut(id)
            .ok_or_else(|| EngineError::store(format!("user {} not found", id)))?;

        if let Some(payment_account) = patch.payment_account {
            user.payment_account = payment_account;
        }
        Ok(())
    }

    async fn query_payments(&self, query: &PaymentQuery) -> Result<Vec<Payment>, EngineError> {
        let payments = self.lock_payments()?;
        Ok(payments
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }
}
