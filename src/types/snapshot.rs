//! Derived earnings aggregates
//!
//! An `EarningsSnapshot` is recomputed per query from the completed
//! payments of one instructor and is never persisted. It backs the
//! earnings dashboard and the report exporter.

use rust_decimal::Decimal;
use serde::Serialize;

/// Fixed palette for course-ranking display colors, assigned by rank
/// index modulo the palette size.
pub const COURSE_COLOR_PALETTE: [&str; 5] =
    ["#4CAF50", "#2196F3", "#FF9800", "#9C27B0", "#F44336"];

/// Number of courses kept in the revenue ranking
pub const COURSE_RANKING_SIZE: usize = 5;

/// Earnings of one calendar month within the current year
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// Calendar month, 1 (January) through 12 (December)
    pub month: u32,
    /// Sum of instructor shares for completed payments in this month
    pub earnings: Decimal,
    /// Number of distinct paying students in this month
    pub student_count: usize,
}

/// One entry of the per-course revenue ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRevenue {
    /// Course display name
    pub course_name: String,
    /// Sum of instructor shares for this course
    pub earnings: Decimal,
    /// Display color assigned by rank
    pub color: String,
}

/// Derived financial aggregates for one instructor
///
/// Invariants (checked at construction):
/// - `available_funds + pending_funds == total_earnings` exactly
/// - `top_courses` is sorted descending and holds at most
///   [`COURSE_RANKING_SIZE`] entries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSnapshot {
    /// Sum of instructor shares over all completed payments
    pub total_earnings: Decimal,
    /// Sum over completed payments created in the current calendar month
    pub monthly_earnings: Decimal,
    /// Portion already transferred to the instructor's sub-account
    pub available_funds: Decimal,
    /// Portion awaiting transfer
    pub pending_funds: Decimal,
    /// Month-over-month growth, rounded to the nearest whole percent
    ///
    /// `+100` when the previous month was zero and the current month is
    /// positive; `0` when both are zero.
    pub monthly_growth_percent: Decimal,
    /// All 12 calendar months of the current year, in order, zero-filled
    pub per_month: Vec<MonthBucket>,
    /// Top courses by revenue, descending
    pub top_courses: Vec<CourseRevenue>,
    /// Number of distinct paying students overall
    pub student_count: usize,
}

impl EarningsSnapshot {
    /// An empty snapshot: all amounts zero, 12 zero-filled month buckets
    pub fn empty() -> Self {
        EarningsSnapshot {
            total_earnings: Decimal::ZERO,
            monthly_earnings: Decimal::ZERO,
            available_funds: Decimal::ZERO,
            pending_funds: Decimal::ZERO,
            monthly_growth_percent: Decimal::ZERO,
            per_month: (1..=12)
                .map(|month| MonthBucket {
                    month,
                    earnings: Decimal::ZERO,
                    student_count: 0,
                })
                .collect(),
            top_courses: Vec::new(),
            student_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_twelve_ordered_buckets() {
        let snapshot = EarningsSnapshot::empty();
        assert_eq!(snapshot.per_month.len(), 12);
        for (i, bucket) in snapshot.per_month.iter().enumerate() {
            assert_eq!(bucket.month, i as u32 + 1);
            assert_eq!(bucket.earnings, Decimal::ZERO);
            assert_eq!(bucket.student_count, 0);
        }
        assert_eq!(
            snapshot.available_funds + snapshot.pending_funds,
            snapshot.total_earnings
        );
    }

    #[test]
    fn test_palette_matches_ranking_size() {
        assert_eq!(COURSE_COLOR_PALETTE.len(), COURSE_RANKING_SIZE);
    }
}
