//! CSV format handling for exported payment records and report output
//!
//! Billing exports payment records as CSV; this module converts rows into
//! domain [`Payment`] values and renders an [`EarningsSnapshot`] for the
//! report binary. Conversion is pure (no I/O) for easy testing.

use crate::types::{EarningsSnapshot, EngineError, Payment, PaymentStatus, TransferStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV row structure for deserialization
///
/// Matches the billing export columns. Amounts and timestamps arrive as
/// strings and are validated during conversion.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PaymentCsvRecord {
    pub id: String,
    pub student_id: String,
    pub instructor_id: String,
    pub course_id: String,
    pub course_name: String,
    pub student_name: String,
    pub base_price: String,
    pub instructor_amount: String,
    pub status: String,
    pub transfer_status: String,
    pub payment_method: String,
    pub created_at: String,
}

/// Convert a CSV row into a domain [`Payment`]
///
/// Validates amounts (including the `instructor_amount <= base_price`
/// record invariant), enum fields, and the RFC 3339 timestamp.
///
/// # Errors
///
/// Returns a parse error describing the offending field; the caller skips
/// the row and continues.
pub fn convert_payment_record(record: PaymentCsvRecord) -> Result<Payment, EngineError> {
    let parse_error = |message: String| EngineError::Parse {
        line: None,
        message,
    };

    let status = match record.status.to_lowercase().as_str() {
        "pending" => PaymentStatus::Pending,
        "completed" => PaymentStatus::Completed,
        "failed" => PaymentStatus::Failed,
        other => {
            return Err(parse_error(format!(
                "invalid payment status '{}' for payment {}",
                other, record.id
            )))
        }
    };

    let transfer_status = match record.transfer_status.to_lowercase().as_str() {
        "pending" => TransferStatus::Pending,
        "completed" => TransferStatus::Completed,
        other => {
            return Err(parse_error(format!(
                "invalid transfer status '{}' for payment {}",
                other, record.id
            )))
        }
    };

    let base_price = Decimal::from_str(record.base_price.trim()).map_err(|_| {
        parse_error(format!(
            "invalid base price '{}' for payment {}",
            record.base_price, record.id
        ))
    })?;

    let instructor_amount = Decimal::from_str(record.instructor_amount.trim()).map_err(|_| {
        parse_error(format!(
            "invalid instructor amount '{}' for payment {}",
            record.instructor_amount, record.id
        ))
    })?;

    if instructor_amount < Decimal::ZERO || instructor_amount > base_price {
        return Err(parse_error(format!(
            "instructor amount {} outside [0, {}] for payment {}",
            instructor_amount, base_price, record.id
        )));
    }

    let created_at = DateTime::parse_from_rfc3339(record.created_at.trim())
        .map_err(|_| {
            parse_error(format!(
                "invalid timestamp '{}' for payment {}",
                record.created_at, record.id
            ))
        })?
        .with_timezone(&Utc);

    Ok(Payment {
        id: record.id,
        student_id: record.student_id,
        instructor_id: record.instructor_id,
        course_id: record.course_id,
        course_name: record.course_name,
        student_name: record.student_name,
        base_price,
        instructor_amount,
        status,
        transfer_status,
        payment_method: record.payment_method,
        created_at,
    })
}

/// Write an earnings report
///
/// A summary block followed by the per-month series and the course
/// ranking as CSV tables.
pub fn write_earnings_report(
    instructor_id: &str,
    snapshot: &EarningsSnapshot,
    output: &mut dyn Write,
) -> Result<(), EngineError> {
    writeln!(output, "# Earnings report for {}", instructor_id)?;
    writeln!(output, "total_earnings,{}", snapshot.total_earnings)?;
    writeln!(output, "monthly_earnings,{}", snapshot.monthly_earnings)?;
    writeln!(output, "available_funds,{}", snapshot.available_funds)?;
    writeln!(output, "pending_funds,{}", snapshot.pending_funds)?;
    writeln!(
        output,
        "monthly_growth_percent,{}",
        snapshot.monthly_growth_percent
    )?;
    writeln!(output, "students,{}", snapshot.student_count)?;

    writeln!(output)?;
    writeln!(output, "month,earnings,students")?;
    for bucket in &snapshot.per_month {
        writeln!(
            output,
            "{},{},{}",
            bucket.month, bucket.earnings, bucket.student_count
        )?;
    }

    writeln!(output)?;
    writeln!(output, "rank,course,earnings,color")?;
    {
        let mut writer = csv::Writer::from_writer(&mut *output);
        for (rank, course) in snapshot.top_courses.iter().enumerate() {
            writer.write_record(&[
                (rank + 1).to_string(),
                course.course_name.clone(),
                course.earnings.to_string(),
                course.color.clone(),
            ])?;
        }
        writer.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> PaymentCsvRecord {
        PaymentCsvRecord {
            id: "pay_1".to_string(),
            student_id: "stu_1".to_string(),
            instructor_id: "inst_1".to_string(),
            course_id: "course_1".to_string(),
            course_name: "Rust Fundamentals".to_string(),
            student_name: "Ada".to_string(),
            base_price: "100.00".to_string(),
            instructor_amount: "80.00".to_string(),
            status: "completed".to_string(),
            transfer_status: "pending".to_string(),
            payment_method: "card".to_string(),
            created_at: "2026-03-15T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_convert_valid_record() {
        let payment = convert_payment_record(record()).unwrap();

        assert_eq!(payment.id, "pay_1");
        assert_eq!(payment.base_price, Decimal::new(10000, 2));
        assert_eq!(payment.instructor_amount, Decimal::new(8000, 2));
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.transfer_status, TransferStatus::Pending);
        assert_eq!(payment.platform_fee(), Decimal::new(2000, 2));
    }

    #[test]
    fn test_convert_is_case_insensitive_on_enums() {
        let mut r = record();
        r.status = "COMPLETED".to_string();
        r.transfer_status = "Pending".to_string();
        assert!(convert_payment_record(r).is_ok());
    }

    #[rstest]
    #[case::bad_status("status")]
    #[case::bad_transfer("transfer_status")]
    #[case::bad_price("base_price")]
    #[case::bad_amount("instructor_amount")]
    #[case::bad_timestamp("created_at")]
    fn test_convert_rejects_malformed_fields(#[case] field: &str) {
        let mut r = record();
        match field {
            "status" => r.status = "refunded".to_string(),
            "transfer_status" => r.transfer_status = "done".to_string(),
            "base_price" => r.base_price = "lots".to_string(),
            "instructor_amount" => r.instructor_amount = "-1".to_string(),
            "created_at" => r.created_at = "yesterday".to_string(),
            _ => unreachable!(),
        }

        let result = convert_payment_record(r);
        assert!(matches!(result.unwrap_err(), EngineError::Parse { .. }));
    }

    #[test]
    fn test_convert_rejects_share_exceeding_price() {
        let mut r = record();
        r.instructor_amount = "120.00".to_string();

        let result = convert_payment_record(r);
        assert!(matches!(result.unwrap_err(), EngineError::Parse { .. }));
    }

    #[test]
    fn test_report_contains_summary_and_tables() {
        let snapshot = EarningsSnapshot::empty();
        let mut output = Vec::new();

        write_earnings_report("inst_1", &snapshot, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("# Earnings report for inst_1"));
        assert!(text.contains("total_earnings,0"));
        assert!(text.contains("month,earnings,students"));
        assert!(text.contains("12,0,0"));
        assert!(text.contains("rank,course,earnings,color"));
    }
}
