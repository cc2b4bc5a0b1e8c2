//! Payment records read from the ledger store
//!
//! Payments are written by the billing subsystem and are immutable here:
//! the engine only reads them to derive earnings aggregates. Monetary
//! fields use `Decimal` so aggregation stays exact.

use crate::types::account::InstructorId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment document identifier
pub type PaymentId = String;

/// Course document identifier
pub type CourseId = String;

/// Student document identifier
pub type StudentId = String;

/// Charge outcome reported by the billing subsystem
///
/// Only `Completed` payments participate in earnings aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Charge initiated but not yet confirmed
    Pending,
    /// Charge succeeded
    Completed,
    /// Charge failed
    Failed,
}

/// Whether the instructor's share has been transferred to their sub-account
///
/// Splits a completed payment between available funds (`Completed`) and
/// pending funds (`Pending`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Funds not yet transferred to the instructor
    Pending,
    /// Funds transferred to the instructor's sub-account
    Completed,
}

/// Immutable payment record
///
/// `instructor_amount` is the instructor's share of `base_price`; the
/// platform fee is the non-negative difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Ledger document identifier
    pub id: PaymentId,
    /// The paying student
    pub student_id: StudentId,
    /// The instructor who owns the course
    pub instructor_id: InstructorId,
    /// The purchased course
    pub course_id: CourseId,
    /// Course display name at time of purchase
    pub course_name: String,
    /// Student display name at time of purchase
    pub student_name: String,
    /// Full price charged to the student
    pub base_price: Decimal,
    /// The instructor's share of the price
    pub instructor_amount: Decimal,
    /// Charge outcome
    pub status: PaymentStatus,
    /// Transfer state of the instructor's share
    pub transfer_status: TransferStatus,
    /// Payment method label (e.g. "card")
    pub payment_method: String,
    /// When the charge was created
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// The platform's share: `base_price - instructor_amount`
    ///
    /// Non-negative by the record invariant `instructor_amount <= base_price`.
    pub fn platform_fee(&self) -> Decimal {
        self.base_price - self.instructor_amount
    }

    /// Whether this payment counts toward earnings for the given instructor
    pub fn is_completed_for(&self, instructor_id: &str) -> bool {
        self.status == PaymentStatus::Completed && self.instructor_id == instructor_id
    }
}
