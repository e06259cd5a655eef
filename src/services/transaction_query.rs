//! Read-side filtering of the ledger by date.
//!
//! Dates arrive as `YYYY-MM-DD` strings. A range is rejected before any
//! storage call when it cannot be parsed, when only one bound is given, when
//! the start is not strictly before the end, or when it spans more than
//! [`MAX_RANGE_DAYS`] days.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::AppError,
    models::transaction::{Transaction, TransactionQuery},
};

/// Longest interval a single history query may cover.
pub const MAX_RANGE_DAYS: i64 = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated closed date interval.
///
/// Covers `start` from midnight UTC through the whole of the `end` day; it is
/// held as the half-open instant interval `[start, end_exclusive)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end_exclusive: DateTime<Utc>,
}

impl DateRange {
    /// Build a range from two calendar dates.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `start >= end` or the span exceeds [`MAX_RANGE_DAYS`].
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::InvalidInput(
                "Start date must be less than end date".to_string(),
            ));
        }

        if (end - start).num_days() > MAX_RANGE_DAYS {
            return Err(AppError::InvalidInput(format!(
                "Difference between the start date and end date must be less than or equal to {MAX_RANGE_DAYS} days"
            )));
        }

        let day_after_end = end
            .succ_opt()
            .ok_or_else(|| AppError::InvalidInput("End date is out of range".to_string()))?;

        Ok(Self {
            start: midnight(start)?,
            end_exclusive: midnight(day_after_end)?,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end_exclusive
    }
}

fn midnight(date: NaiveDate) -> Result<DateTime<Utc>, AppError> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::InvalidInput("Invalid date".to_string()))
}

fn parse_date(value: &str, which: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| AppError::InvalidInput(format!("Invalid {which} date format")))
}

/// Turn query-string dates into an optional validated range.
///
/// No dates means the full history (`Ok(None)`).
pub fn parse_range(query: &TransactionQuery) -> Result<Option<DateRange>, AppError> {
    match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_date(start, "start")?;
            let end = parse_date(end, "end")?;
            DateRange::from_dates(start, end).map(Some)
        }
        _ => Err(AppError::InvalidInput(
            "Both start_date and end_date must be provided".to_string(),
        )),
    }
}

/// Keep the entries inside `range`, ordered by insertion sequence.
pub fn filter_by_range<I>(transactions: I, range: Option<&DateRange>) -> Vec<Transaction>
where
    I: IntoIterator<Item = Transaction>,
{
    let mut selected: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| range.is_none_or(|r| r.contains(t.created_at)))
        .collect();
    selected.sort_by_key(|t| t.seq);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionType;
    use chrono::TimeZone;
    use rstest::rstest;
    use uuid::Uuid;

    fn query(start: Option<&str>, end: Option<&str>) -> TransactionQuery {
        TransactionQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    fn entry(seq: i64, at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            seq,
            account_id: Uuid::nil(),
            transaction_type: TransactionType::Credit,
            amount_cents: 100,
            balance_cents: 100 * seq,
            created_at: at,
        }
    }

    #[test]
    fn no_dates_means_full_history() {
        assert_eq!(parse_range(&query(None, None)).unwrap(), None);
    }

    #[rstest]
    #[case(Some("2024-01-10"), None)]
    #[case(None, Some("2024-01-10"))]
    #[case(Some("2024-01-10"), Some("2024-01-10"))]
    #[case(Some("2024-01-20"), Some("2024-01-10"))]
    #[case(Some("2024-01-01"), Some("2024-02-15"))]
    #[case(Some("10-01-2024"), Some("2024-01-20"))]
    #[case(Some("2024-01-01"), Some("not-a-date"))]
    fn invalid_ranges_are_rejected(#[case] start: Option<&str>, #[case] end: Option<&str>) {
        assert!(matches!(
            parse_range(&query(start, end)),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn thirty_day_span_is_allowed() {
        let range = parse_range(&query(Some("2024-01-01"), Some("2024-01-31")))
            .unwrap()
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            range.end_exclusive,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn range_includes_both_boundary_days() {
        let range = parse_range(&query(Some("2024-01-05"), Some("2024-01-10")))
            .unwrap()
            .unwrap();

        let history = vec![
            entry(1, Utc.with_ymd_and_hms(2024, 1, 4, 23, 59, 59).unwrap()),
            entry(2, Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
            entry(3, Utc.with_ymd_and_hms(2024, 1, 10, 18, 30, 0).unwrap()),
            entry(4, Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap()),
        ];

        let seqs: Vec<i64> = filter_by_range(history, Some(&range))
            .iter()
            .map(|t| t.seq)
            .collect();
        assert_eq!(seqs, vec![2, 3]);
    }

    #[test]
    fn filter_orders_by_sequence() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let history = vec![entry(3, at), entry(1, at), entry(2, at)];
        let seqs: Vec<i64> = filter_by_range(history, None).iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}
