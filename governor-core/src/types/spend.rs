//! Realized Spend Statements
//!
//! Historical per-(ad group, source, date) net spend, supplied read-only by
//! the analytics collaborator and used to detect non-performing sources.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{AdGroupId, SourceId};

/// Realized net spend for one (ad group, source, date)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailySpendStatement {
    pub ad_group_id: AdGroupId,
    pub source_id: SourceId,
    pub date: NaiveDate,
    /// Net of fee and margin, campaign currency
    pub amount: Decimal,
}

impl DailySpendStatement {
    pub fn new(
        ad_group_id: AdGroupId,
        source_id: SourceId,
        date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        Self {
            ad_group_id,
            source_id,
            date,
            amount,
        }
    }
}

/// A set of spend statements with aggregation helpers
///
/// A legitimate zero-spend day simply produces no statements, so all
/// lookups default to zero.
#[derive(Clone, Debug, Default)]
pub struct SpendHistory {
    statements: Vec<DailySpendStatement>,
}

impl SpendHistory {
    pub fn new(statements: Vec<DailySpendStatement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[DailySpendStatement] {
        &self.statements
    }

    /// Spend of one source within one ad group on one date
    pub fn source_spend_on(
        &self,
        ad_group_id: &AdGroupId,
        source_id: &SourceId,
        date: NaiveDate,
    ) -> Decimal {
        self.statements
            .iter()
            .filter(|s| {
                &s.ad_group_id == ad_group_id && &s.source_id == source_id && s.date == date
            })
            .map(|s| s.amount)
            .sum()
    }

    /// Total spend of an ad group on one date, across all sources
    pub fn ad_group_spend_on(&self, ad_group_id: &AdGroupId, date: NaiveDate) -> Decimal {
        self.statements
            .iter()
            .filter(|s| &s.ad_group_id == ad_group_id && s.date == date)
            .map(|s| s.amount)
            .sum()
    }

    /// Total spend across all statements
    pub fn total(&self) -> Decimal {
        self.statements.iter().map(|s| s.amount).sum()
    }

    /// Average daily spend assuming the history covers exactly `days` days
    pub fn daily_average(&self, days: i64) -> Decimal {
        if days <= 0 {
            return Decimal::ZERO;
        }
        self.total() / Decimal::from(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn history() -> SpendHistory {
        SpendHistory::new(vec![
            DailySpendStatement::new(
                AdGroupId::new("ag1"),
                SourceId::new("s1"),
                date(14),
                Decimal::new(40, 0),
            ),
            DailySpendStatement::new(
                AdGroupId::new("ag1"),
                SourceId::new("s2"),
                date(14),
                Decimal::new(10, 0),
            ),
            DailySpendStatement::new(
                AdGroupId::new("ag2"),
                SourceId::new("s1"),
                date(13),
                Decimal::new(20, 0),
            ),
        ])
    }

    #[test]
    fn test_source_spend_on() {
        let history = history();
        assert_eq!(
            history.source_spend_on(&AdGroupId::new("ag1"), &SourceId::new("s1"), date(14)),
            Decimal::new(40, 0)
        );
        // no data for that day means zero, not an error
        assert_eq!(
            history.source_spend_on(&AdGroupId::new("ag1"), &SourceId::new("s1"), date(13)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_ad_group_spend_on() {
        let history = history();
        assert_eq!(
            history.ad_group_spend_on(&AdGroupId::new("ag1"), date(14)),
            Decimal::new(50, 0)
        );
    }

    #[test]
    fn test_daily_average() {
        let history = history();
        assert_eq!(history.total(), Decimal::new(70, 0));
        assert_eq!(history.daily_average(7), Decimal::new(10, 0));
        assert_eq!(history.daily_average(0), Decimal::ZERO);
    }
}
