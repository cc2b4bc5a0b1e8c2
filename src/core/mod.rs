//! Business logic components
//!
//! - [`lifecycle`] - payment-account state machine and persistence
//! - [`reconcile`] - pure earnings aggregation over payment records
//! - [`filter`] - composable client-facing payment filters

pub mod filter;
pub mod lifecycle;
pub mod reconcile;

pub use filter::{DateWindow, PaymentFilter};
pub use lifecycle::{AccountLifecycleManager, VerifyOutcome};
pub use reconcile::reconcile;
