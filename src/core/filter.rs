//! Client-facing payment filters
//!
//! Pure post-filters over an already-fetched completed-payment set. Each
//! predicate is optional and they compose with AND semantics, so the
//! dashboard can refine a view without re-querying the store.

use crate::types::{CourseId, EngineError, Payment, TransferStatus};
use chrono::{DateTime, Utc};

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateWindow {
    /// Create a window; `from` must not be after `to`
    ///
    /// # Errors
    ///
    /// Returns a validation error for an inverted window.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, EngineError> {
        if from > to {
            return Err(EngineError::validation(format!(
                "invalid time window: {} is after {}",
                from, to
            )));
        }
        Ok(DateWindow { from, to })
    }

    /// Whether a timestamp falls inside the window (inclusive both ends)
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Composable predicate filter over payment records
///
/// All criteria are ANDed; an empty filter matches every payment.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Case-insensitive substring matched against student and course name
    pub search: Option<String>,
    /// Restrict to one transfer state
    pub transfer_status: Option<TransferStatus>,
    /// Restrict to one course
    pub course_id: Option<CourseId>,
    /// Restrict to an inclusive date range
    pub window: Option<DateWindow>,
}

impl PaymentFilter {
    /// A filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-text criterion
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Add a transfer-status criterion
    pub fn with_transfer_status(mut self, status: TransferStatus) -> Self {
        self.transfer_status = Some(status);
        self
    }

    /// Add a course criterion
    pub fn with_course(mut self, course_id: impl Into<CourseId>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    /// Add a date-range criterion
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Whether a payment satisfies every present criterion
    pub fn matches(&self, payment: &Payment) -> bool {
        if let Some(text) = &self.search {
            let needle = text.to_lowercase();
            let in_student = payment.student_name.to_lowercase().contains(&needle);
            let in_course = payment.course_name.to_lowercase().contains(&needle);
            if !in_student && !in_course {
                return false;
            }
        }
        if let Some(status) = self.transfer_status {
            if payment.transfer_status != status {
                return false;
            }
        }
        if let Some(course_id) = &self.course_id {
            if &payment.course_id != course_id {
                return false;
            }
        }
        if let Some(window) = &self.window {
            if !window.contains(payment.created_at) {
                return false;
            }
        }
        true
    }

    /// Filter a payment slice, preserving order
    pub fn apply<'a>(&self, payments: &'a [Payment]) -> Vec<&'a Payment> {
        payments.iter().filter(|p| self.matches(p)).collect()
    }
}
