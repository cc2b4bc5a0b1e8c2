//! Earnings reconciliation engine
//!
//! A pure function of `(instructor, now, window, payments)` - no store or
//! network access, fully deterministic, so every financial aggregate can
//! be unit tested in memory. The caller loads the completed-payment set
//! once and computes as many derived views as it needs.
//!
//! All monetary accumulation uses exact decimal arithmetic so the
//! `available + pending == total` identity holds bit-for-bit.

use crate::core::filter::DateWindow;
use crate::types::{
    CourseRevenue, EarningsSnapshot, EngineError, MonthBucket, Payment, TransferStatus,
    COURSE_COLOR_PALETTE, COURSE_RANKING_SIZE,
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{HashMap, HashSet};

/// Reconcile one instructor's completed payments into an earnings snapshot
///
/// Only payments with `status == Completed` and a matching instructor
/// participate. The optional window restricts the set by `created_at`
/// (inclusive). Month buckets cover the current calendar year only;
/// payments from prior years count toward totals but not the series.
///
/// # Errors
///
/// Returns a validation error if accumulation overflows (malformed
/// amounts), and [`EngineError::ReconciliationInconsistency`] if the
/// available/pending split fails to add up to the total - a programming
/// error that cannot occur with exact arithmetic.
pub fn reconcile(
    instructor_id: &str,
    now: DateTime<Utc>,
    window: Option<DateWindow>,
    payments: &[Payment],
) -> Result<EarningsSnapshot, EngineError> {
    let mut total = Decimal::ZERO;
    let mut available = Decimal::ZERO;
    let mut pending = Decimal::ZERO;

    let mut month_earnings = [Decimal::ZERO; 12];
    let mut month_students: [HashSet<&str>; 12] = std::array::from_fn(|_| HashSet::new());
    let mut course_totals: HashMap<&str, Decimal> = HashMap::new();
    let mut students: HashSet<&str> = HashSet::new();

    let in_window = |p: &Payment| window.map_or(true, |w| w.contains(p.created_at));

    for payment in payments
        .iter()
        .filter(|p| p.is_completed_for(instructor_id) && in_window(p))
    {
        let amount = payment.instructor_amount;

        total = checked_add(total, amount, instructor_id)?;
        match payment.transfer_status {
            TransferStatus::Completed => available = checked_add(available, amount, instructor_id)?,
            TransferStatus::Pending => pending = checked_add(pending, amount, instructor_id)?,
        }

        students.insert(&payment.student_id);

        let course = course_totals
            .entry(payment.course_name.as_str())
            .or_insert(Decimal::ZERO);
        *course = checked_add(*course, amount, instructor_id)?;

        // Month-of-year series is scoped to the current calendar year
        if payment.created_at.year() == now.year() {
            let index = payment.created_at.month0() as usize;
            month_earnings[index] = checked_add(month_earnings[index], amount, instructor_id)?;
            month_students[index].insert(&payment.student_id);
        }
    }

    if available + pending != total {
        debug_assert_eq!(available + pending, total);
        return Err(EngineError::ReconciliationInconsistency {
            total,
            available,
            pending,
        });
    }

    let current_index = now.month0() as usize;
    let current_month = month_earnings[current_index];
    let previous_month = if current_index == 0 {
        Decimal::ZERO
    } else {
        month_earnings[current_index - 1]
    };

    Ok(EarningsSnapshot {
        total_earnings: total,
        monthly_earnings: current_month,
        available_funds: available,
        pending_funds: pending,
        monthly_growth_percent: growth_percent(previous_month, current_month),
        per_month: month_earnings
            .iter()
            .zip(month_students.iter())
            .enumerate()
            .map(|(i, (earnings, student_set))| MonthBucket {
                month: i as u32 + 1,
                earnings: *earnings,
                student_count: student_set.len(),
            })
            .collect(),
        top_courses: rank_courses(course_totals),
        student_count: students.len(),
    })
}

/// Month-over-month growth, rounded to the nearest whole percent with
/// midpoints away from zero
///
/// Boundary rules: previous 0 and current positive is +100; both zero is 0.
fn growth_percent(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    } else {
        ((current - previous) / previous * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Sort course totals descending and keep the top entries
///
/// Ties break by course name ascending so ranking and palette colors are
/// deterministic. The display color is assigned by rank index modulo the
/// palette size.
fn rank_courses(course_totals: HashMap<&str, Decimal>) -> Vec<CourseRevenue> {
    let mut ranked: Vec<(&str, Decimal)> = course_totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(COURSE_RANKING_SIZE);

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (course_name, earnings))| CourseRevenue {
            course_name: course_name.to_string(),
            earnings,
            color: COURSE_COLOR_PALETTE[rank % COURSE_COLOR_PALETTE.len()].to_string(),
        })
        .collect()
}

fn checked_add(
    accumulator: Decimal,
    amount: Decimal,
    instructor_id: &str,
) -> Result<Decimal, EngineError> {
    accumulator.checked_add(amount).ok_or_else(|| {
        EngineError::validation(format!(
            "earnings accumulation overflowed for instructor {}",
            instructor_id
        ))
    })
}
