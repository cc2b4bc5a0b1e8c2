//! Payment-account state for instructor users
//!
//! This module defines the `PaymentAccount` tagged enum that tracks an
//! instructor's sub-account at the external payment processor, together
//! with the `User` record it is embedded in.
//!
//! # State Machine
//!
//! ```text
//! None -> Pending -> Complete
//! ```
//!
//! No transition leads back to `None`. Re-onboarding after an incomplete
//! verification leaves the account in `Pending`. Capability flags exist
//! only on `Complete` and are derived from state rather than stored as
//! independently settable booleans, so they cannot drift apart.

use crate::types::error::EngineError;
use serde::{Deserialize, Serialize};

/// External processor account identifier (e.g. `acct_1A2b3C`)
pub type AccountId = String;

/// Instructor identifier in the ledger store
pub type InstructorId = String;

/// The lifecycle stage of an instructor's payment sub-account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// No sub-account has been provisioned
    None,
    /// A sub-account exists but onboarding has not been verified complete
    Pending,
    /// Onboarding verified complete; the account can receive funds
    Complete,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::None => write!(f, "none"),
            AccountStatus::Pending => write!(f, "pending"),
            AccountStatus::Complete => write!(f, "complete"),
        }
    }
}

/// Payment sub-account state embedded in a [`User`] record
///
/// The variants carry exactly the data valid for that stage:
/// an `account_id` exists if and only if the account is `Pending` or
/// `Complete`, and capability flags exist only on `Complete`. All
/// transitions go through methods that enforce the state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentAccount {
    /// No sub-account provisioned yet
    #[default]
    None,

    /// Sub-account created at the processor, onboarding not yet verified
    Pending {
        /// External processor identifier
        account_id: AccountId,
    },

    /// Onboarding verified complete
    Complete {
        /// External processor identifier
        account_id: AccountId,
        /// Whether the processor has granted the charges capability
        charges_enabled: bool,
        /// Whether the processor has granted the payouts capability
        payouts_enabled: bool,
    },
}

impl PaymentAccount {
    /// The lifecycle stage of this account
    pub fn status(&self) -> AccountStatus {
        match self {
            PaymentAccount::None => AccountStatus::None,
            PaymentAccount::Pending { .. } => AccountStatus::Pending,
            PaymentAccount::Complete { .. } => AccountStatus::Complete,
        }
    }

    /// The external processor identifier, if the account has been provisioned
    pub fn account_id(&self) -> Option<&str> {
        match self {
            PaymentAccount::None => None,
            PaymentAccount::Pending { account_id } => Some(account_id),
            PaymentAccount::Complete { account_id, .. } => Some(account_id),
        }
    }

    /// Whether the account can accept charges (only ever true on `Complete`)
    pub fn charges_enabled(&self) -> bool {
        matches!(
            self,
            PaymentAccount::Complete {
                charges_enabled: true,
                ..
            }
        )
    }

    /// Whether the account can receive payouts (only ever true on `Complete`)
    pub fn payouts_enabled(&self) -> bool {
        matches!(
            self,
            PaymentAccount::Complete {
                payouts_enabled: true,
                ..
            }
        )
    }

    /// Transition `None -> Pending` after a sub-account was created
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] if the account is already
    /// `Pending` or `Complete` - a second external account must never be
    /// provisioned silently.
    pub fn begin_onboarding(&self, account_id: AccountId) -> Result<PaymentAccount, EngineError> {
        match self {
            PaymentAccount::None => Ok(PaymentAccount::Pending { account_id }),
            _ => Err(EngineError::invalid_transition("provision", self.status())),
        }
    }

    /// Transition `Pending -> Complete` after the processor reported the
    /// account details as submitted
    ///
    /// Submitted details are treated as sufficient for activation: both
    /// capability flags are set without awaiting the processor's
    /// asynchronous capability grants. Calling this on an account that is
    /// already `Complete` is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] if no sub-account exists.
    pub fn activate(&self) -> Result<PaymentAccount, EngineError> {
        match self {
            PaymentAccount::Pending { account_id } => Ok(PaymentAccount::Complete {
                account_id: account_id.clone(),
                charges_enabled: true,
                payouts_enabled: true,
            }),
            PaymentAccount::Complete { .. } => Ok(self.clone()),
            PaymentAccount::None => Err(EngineError::invalid_transition(
                "activate",
                AccountStatus::None,
            )),
        }
    }

    /// Whether a capability flag was never recorded on a `Complete` account
    ///
    /// Such accounts predate the derived-state representation; the
    /// lifecycle manager backfills them opportunistically.
    pub fn needs_capability_backfill(&self) -> bool {
        matches!(
            self,
            PaymentAccount::Complete {
                charges_enabled,
                payouts_enabled,
                ..
            } if !charges_enabled || !payouts_enabled
        )
    }

    /// Merge freshly fetched capability flags into a `Complete` account
    ///
    /// Flags are only ever raised, never cleared - the state machine has
    /// no backward transitions. Returns the account unchanged for any
    /// other state.
    pub fn with_backfilled_capabilities(&self, charges: bool, payouts: bool) -> PaymentAccount {
        match self {
            PaymentAccount::Complete {
                account_id,
                charges_enabled,
                payouts_enabled,
            } => PaymentAccount::Complete {
                account_id: account_id.clone(),
                charges_enabled: *charges_enabled || charges,
                payouts_enabled: *payouts_enabled || payouts,
            },
            other => other.clone(),
        }
    }
}

/// Instructor user record as stored in the ledger
///
/// Only the fields the engine reads or writes; everything else on the
/// document (profile, avatar, bio) belongs to the UI layer and is opaque
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Ledger document identifier
    pub id: InstructorId,
    /// Contact email, forwarded to the processor at provisioning
    pub email: String,
    /// Legal name, forwarded to the processor at provisioning
    pub full_name: String,
    /// ISO-3166 alpha-2 country code
    pub country: String,
    /// Embedded payment sub-account state
    #[serde(default)]
    pub payment_account: PaymentAccount,
}

/// Partial update applied to a [`User`] document
///
/// The engine only ever writes derived payment-account state back to the
/// ledger; `Payment` records are never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    /// Replacement payment-account state, if it changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_account: Option<PaymentAccount>,
}

impl UserPatch {
    /// Create a patch that replaces the payment-account state
    pub fn payment_account(account: PaymentAccount) -> Self {
        UserPatch {
            payment_account: Some(account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pending() -> PaymentAccount {
        PaymentAccount::Pending {
            account_id: "acct_123".to_string(),
        }
    }

    fn complete(charges: bool, payouts: bool) -> PaymentAccount {
        PaymentAccount::Complete {
            account_id: "acct_123".to_string(),
            charges_enabled: charges,
            payouts_enabled: payouts,
        }
    }

    #[test]
    fn test_default_is_none() {
        let account = PaymentAccount::default();
        assert_eq!(account.status(), AccountStatus::None);
        assert_eq!(account.account_id(), None);
        assert!(!account.charges_enabled());
        assert!(!account.payouts_enabled());
    }

    #[test]
    fn test_begin_onboarding_from_none() {
        let account = PaymentAccount::None
            .begin_onboarding("acct_123".to_string())
            .unwrap();

        assert_eq!(account.status(), AccountStatus::Pending);
        assert_eq!(account.account_id(), Some("acct_123"));
        // Capability flags are not valid before Complete
        assert!(!account.charges_enabled());
        assert!(!account.payouts_enabled());
    }

    #[rstest]
    #[case::from_pending(pending(), AccountStatus::Pending)]
    #[case::from_complete(complete(true, true), AccountStatus::Complete)]
    fn test_begin_onboarding_rejected_when_already_provisioned(
        #[case] account: PaymentAccount,
        #[case] expected_status: AccountStatus,
    ) {
        let result = account.begin_onboarding("acct_456".to_string());

        assert_eq!(
            result.unwrap_err(),
            EngineError::invalid_transition("provision", expected_status)
        );
        // Original state untouched
        assert_eq!(account.account_id(), Some("acct_123"));
    }

    #[test]
    fn test_activate_from_pending_sets_both_capability_flags() {
        let account = pending().activate().unwrap();

        assert_eq!(account.status(), AccountStatus::Complete);
        assert_eq!(account.account_id(), Some("acct_123"));
        assert!(account.charges_enabled());
        assert!(account.payouts_enabled());
    }

    #[test]
    fn test_activate_on_complete_is_noop() {
        let account = complete(true, true);
        assert_eq!(account.activate().unwrap(), account);
    }

    #[test]
    fn test_activate_without_account_is_rejected() {
        let result = PaymentAccount::None.activate();
        assert_eq!(
            result.unwrap_err(),
            EngineError::invalid_transition("activate", AccountStatus::None)
        );
    }

    #[rstest]
    #[case::missing_charges(complete(false, true), true)]
    #[case::missing_payouts(complete(true, false), true)]
    #[case::missing_both(complete(false, false), true)]
    #[case::all_present(complete(true, true), false)]
    #[case::pending(pending(), false)]
    #[case::none(PaymentAccount::None, false)]
    fn test_needs_capability_backfill(#[case] account: PaymentAccount, #[case] expected: bool) {
        assert_eq!(account.needs_capability_backfill(), expected);
    }

    #[test]
    fn test_backfill_raises_flags_without_clearing() {
        let account = complete(true, false);

        // Processor now reports payouts granted but charges revoked;
        // flags are only ever raised
        let backfilled = account.with_backfilled_capabilities(false, true);

        assert!(backfilled.charges_enabled());
        assert!(backfilled.payouts_enabled());
    }

    #[test]
    fn test_backfill_is_idempotent() {
        let account = complete(false, false);
        let once = account.with_backfilled_capabilities(true, true);
        let twice = once.with_backfilled_capabilities(true, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_backfill_leaves_non_complete_untouched() {
        assert_eq!(
            pending().with_backfilled_capabilities(true, true),
            pending()
        );
    }

    #[test]
    fn test_serde_tagged_representation() {
        let json = serde_json::to_value(&complete(true, true)).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["account_id"], "acct_123");
        assert_eq!(json["charges_enabled"], true);

        let none: PaymentAccount = serde_json::from_value(serde_json::json!({
            "status": "none"
        }))
        .unwrap();
        assert_eq!(none, PaymentAccount::None);
    }

    #[test]
    fn test_user_patch_skips_absent_fields() {
        let empty = serde_json::to_value(UserPatch::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));

        let patch = serde_json::to_value(UserPatch::payment_account(pending())).unwrap();
        assert_eq!(patch["paymentAccount"]["status"], "pending");
    }
}
