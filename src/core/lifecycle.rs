//! Payment-account lifecycle manager
//!
//! Owns the `None -> Pending -> Complete` state machine for instructor
//! sub-accounts, mediating every transition through the processor client
//! and persisting results to the ledger store. Processor failures are
//! expected, recoverable outcomes: they surface as structured errors and
//! the stored state never moves on a failed call.

use crate::client::ProcessorApi;
use crate::store::LedgerStore;
use crate::types::{AccountStatus, EngineError, UserPatch};
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The processor reported details submitted; the account is now Complete
    Activated,
    /// Onboarding is incomplete; redirect the instructor to this fresh link
    OnboardingIncomplete {
        /// Re-onboarding URL
        onboarding_url: String,
    },
}

/// Coordinates processor calls and ledger writes for account lifecycle
/// transitions
///
/// The in-flight flags are advisory UI-level debouncing: they let a caller
/// disable duplicate submission from one session, not a distributed lock.
pub struct AccountLifecycleManager<P, S> {
    processor: P,
    ledger: S,
    provision_in_flight: AtomicBool,
    verify_in_flight: AtomicBool,
}

/// Clears an in-flight flag when the operation ends, on any path
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &str) -> Result<Self, EngineError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(EngineError::validation(format!(
                "{} already in progress",
                operation
            )));
        }
        Ok(InFlightGuard(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<P: ProcessorApi, S: LedgerStore> AccountLifecycleManager<P, S> {
    /// Create a manager over a processor client and a ledger store
    pub fn new(processor: P, ledger: S) -> Self {
        AccountLifecycleManager {
            processor,
            ledger,
            provision_in_flight: AtomicBool::new(false),
            verify_in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a provisioning call is currently outstanding
    pub fn is_provisioning(&self) -> bool {
        self.provision_in_flight.load(Ordering::SeqCst)
    }

    /// Whether a verification call is currently outstanding
    pub fn is_verifying(&self) -> bool {
        self.verify_in_flight.load(Ordering::SeqCst)
    }

    /// Provision a payment sub-account for an instructor
    ///
    /// Precondition: the instructor's account status is `None`. Creates
    /// the external sub-account, persists `Pending { account_id }`, and
    /// returns the onboarding URL for redirect.
    ///
    /// On processor failure nothing is persisted - the account remains
    /// `None` and the error is returned for display. Profile creation
    /// proceeds independently of this outcome.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidTransition`] if the account is already
    ///   `Pending` or `Complete` (never silently re-provisions)
    /// - [`EngineError::Processor`] if the processor rejected the request
    ///   (e.g. unsupported country)
    pub async fn provision(&self, instructor_id: &str) -> Result<String, EngineError> {
        let _guard = InFlightGuard::acquire(&self.provision_in_flight, "provisioning")?;

        let user = self.ledger.get_user(instructor_id).await?;
        if user.payment_account.status() != AccountStatus::None {
            return Err(EngineError::invalid_transition(
                "provision",
                user.payment_account.status(),
            ));
        }

        let created = self
            .processor
            .create_connect_account(&user.email, &user.full_name, &user.country)
            .await?;

        let account = user.payment_account.begin_onboarding(created.account_id)?;
        self.ledger
            .update_user(instructor_id, UserPatch::payment_account(account))
            .await?;

        tracing::info!(%instructor_id, "payment account provisioned, onboarding pending");
        Ok(created.onboarding_url)
    }

    /// Verify onboarding completion and activate the account
    ///
    /// Fetches the live status from the processor; redirect query flags
    /// are never trusted as proof of completion. When the processor
    /// reports details submitted, the account activates immediately with
    /// both capability flags set - submitted details are treated as
    /// sufficient rather than awaiting the processor's asynchronous
    /// capability grants. Otherwise a fresh onboarding link is returned
    /// and the stored state stays `Pending`.
    ///
    /// Processor-side failures leave state untouched; the caller may
    /// retry without side effects beyond re-fetching status.
    pub async fn verify_and_activate(
        &self,
        instructor_id: &str,
    ) -> Result<VerifyOutcome, EngineError> {
        let _guard = InFlightGuard::acquire(&self.verify_in_flight, "verification")?;

        let user = self.ledger.get_user(instructor_id).await?;
        let account_id = user
            .payment_account
            .account_id()
            .ok_or_else(|| {
                EngineError::invalid_transition("verify", user.payment_account.status())
            })?
            .to_string();

        let capabilities = self.processor.fetch_account_status(&account_id).await?;

        if capabilities.details_submitted {
            let activated = user.payment_account.activate()?;
            self.ledger
                .update_user(instructor_id, UserPatch::payment_account(activated))
                .await?;

            tracing::info!(%instructor_id, %account_id, "payment account activated");
            return Ok(VerifyOutcome::Activated);
        }

        let onboarding_url = self.processor.create_onboarding_link(&account_id).await?;
        tracing::info!(%instructor_id, %account_id, "onboarding incomplete, issued fresh link");

        Ok(VerifyOutcome::OnboardingIncomplete { onboarding_url })
    }

    /// Backfill capability flags that were never recorded on a Complete
    /// account
    ///
    /// Opportunistic background correction. Safe to call redundantly:
    /// when the flags are already present this is a no-op without any
    /// processor call. Returns whether a backfill was persisted.
    pub async fn reconcile_capability_flags(
        &self,
        instructor_id: &str,
    ) -> Result<bool, EngineError> {
        let user = self.ledger.get_user(instructor_id).await?;

        if !user.payment_account.needs_capability_backfill() {
            return Ok(false);
        }
        // needs_capability_backfill is only true for Complete accounts,
        // which always carry an id
        let account_id = user
            .payment_account
            .account_id()
            .ok_or_else(|| EngineError::store("complete account missing account id"))?
            .to_string();

        let capabilities = self.processor.fetch_account_status(&account_id).await?;
        let backfilled = user
            .payment_account
            .with_backfilled_capabilities(capabilities.charges_enabled, capabilities.payouts_enabled);

        if backfilled == user.payment_account {
            return Ok(false);
        }

        self.ledger
            .update_user(instructor_id, UserPatch::payment_account(backfilled))
            .await?;

        tracing::info!(%instructor_id, %account_id, "backfilled capability flags");
        Ok(true)
    }
}
