//! Campaigns, credits and budget line items

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{BudgetItemId, CampaignId, CreditId, Currency};

/// A campaign whose spend the governor bounds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    /// Campaign-local currency; all projections are reported in it
    pub currency: Currency,
    /// Campaign-local timezone, minutes east of UTC
    pub utc_offset_minutes: i32,
}

impl Campaign {
    pub fn new(id: CampaignId, name: impl Into<String>, currency: Currency) -> Self {
        Self {
            id,
            name: name.into(),
            currency,
            utc_offset_minutes: 0,
        }
    }

    /// Set the campaign-local timezone offset
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Today's calendar date in the campaign-local timezone
    pub fn local_today(&self, now: chrono::DateTime<chrono::Utc>) -> NaiveDate {
        (now + chrono::Duration::minutes(self.utc_offset_minutes as i64)).date_naive()
    }
}

/// An account-level pool of money from which budget line items are drawn,
/// carrying the license fee and optional margin percentages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub id: CreditId,
    pub currency: Currency,
    /// License fee as a fraction, e.g. 0.20
    pub license_fee_pct: Decimal,
    /// Optional margin as a fraction
    pub margin_pct: Option<Decimal>,
}

impl Credit {
    pub fn new(id: CreditId, currency: Currency, license_fee_pct: Decimal) -> Self {
        Self {
            id,
            currency,
            license_fee_pct,
            margin_pct: None,
        }
    }

    /// Set the margin percentage
    pub fn with_margin_pct(mut self, margin_pct: Decimal) -> Self {
        self.margin_pct = Some(margin_pct);
        self
    }

    /// Fraction of a gross amount that is spendable media money once the
    /// license fee and margin are netted out
    pub fn spend_multiplier(&self) -> Decimal {
        let fee_part = Decimal::ONE - self.license_fee_pct;
        match self.margin_pct {
            Some(margin) => fee_part * (Decimal::ONE - margin),
            None => fee_part,
        }
    }

    /// Both percentages must lie in [0, 1)
    pub fn percentages_valid(&self) -> bool {
        let in_range = |v: Decimal| v >= Decimal::ZERO && v < Decimal::ONE;
        in_range(self.license_fee_pct) && self.margin_pct.map_or(true, in_range)
    }
}

/// Lifecycle phase of a budget line item on a given day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetItemPhase {
    /// Start date not yet reached
    Pending,
    /// Within the window with money left
    Active,
    /// Within the window but the available amount has reached zero
    Depleted,
    /// End date has passed
    Inactive,
}

/// A time-boxed allocation of money, drawn from a credit, available to one
/// campaign. Overlapping items for the same campaign are permitted and are
/// summed, never merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetLineItem {
    pub id: BudgetItemId,
    pub campaign_id: CampaignId,
    pub credit_id: CreditId,
    /// Inclusive, campaign-local
    pub start_date: NaiveDate,
    /// Inclusive, campaign-local
    pub end_date: NaiveDate,
    /// Allocated amount in credit currency, gross of fee and margin
    pub amount: Decimal,
    /// Portion released back to the credit early; monotonically non-decreasing
    pub freed_amount: Decimal,
    /// Accumulated spend in the same gross units as `amount`
    pub spend_to_date: Decimal,
}

impl BudgetLineItem {
    pub fn new(
        id: BudgetItemId,
        campaign_id: CampaignId,
        credit_id: CreditId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        Self {
            id,
            campaign_id,
            credit_id,
            start_date,
            end_date,
            amount,
            freed_amount: Decimal::ZERO,
            spend_to_date: Decimal::ZERO,
        }
    }

    /// `amount − freed_amount − spend_to_date`; negative only when the
    /// upstream ledger is inconsistent
    pub fn available_amount(&self) -> Decimal {
        self.amount - self.freed_amount - self.spend_to_date
    }

    /// Whether the item's window covers the given date
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether the item's last covered day is the given date
    pub fn expires_on(&self, date: NaiveDate) -> bool {
        self.end_date == date
    }

    pub fn phase(&self, today: NaiveDate) -> BudgetItemPhase {
        if today < self.start_date {
            BudgetItemPhase::Pending
        } else if today > self.end_date {
            BudgetItemPhase::Inactive
        } else if self.available_amount() <= Decimal::ZERO {
            BudgetItemPhase::Depleted
        } else {
            BudgetItemPhase::Active
        }
    }

    /// Items are editable only while pending or active
    pub fn is_editable(&self, today: NaiveDate) -> bool {
        matches!(
            self.phase(today),
            BudgetItemPhase::Pending | BudgetItemPhase::Active
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn item() -> BudgetLineItem {
        BudgetLineItem::new(
            BudgetItemId::new("item:1"),
            CampaignId::new("campaign:1"),
            CreditId::new("credit:1"),
            date(10),
            date(20),
            Decimal::new(2000, 0),
        )
    }

    #[test]
    fn test_available_amount() {
        let mut item = item();
        assert_eq!(item.available_amount(), Decimal::new(2000, 0));

        item.freed_amount = Decimal::new(300, 0);
        item.spend_to_date = Decimal::new(500, 0);
        assert_eq!(item.available_amount(), Decimal::new(1200, 0));
    }

    #[test]
    fn test_phase_transitions() {
        let mut item = item();
        assert_eq!(item.phase(date(9)), BudgetItemPhase::Pending);
        assert_eq!(item.phase(date(10)), BudgetItemPhase::Active);
        assert_eq!(item.phase(date(20)), BudgetItemPhase::Active);
        assert_eq!(item.phase(date(21)), BudgetItemPhase::Inactive);

        item.spend_to_date = item.amount;
        assert_eq!(item.phase(date(15)), BudgetItemPhase::Depleted);
    }

    #[test]
    fn test_editable_only_pending_or_active() {
        let item = item();
        assert!(item.is_editable(date(9)));
        assert!(item.is_editable(date(15)));
        assert!(!item.is_editable(date(21)));
    }

    #[test]
    fn test_spend_multiplier() {
        let credit = Credit::new(
            CreditId::new("credit:1"),
            Currency::new("USD"),
            Decimal::new(2, 1), // 0.2
        );
        assert_eq!(credit.spend_multiplier(), Decimal::new(8, 1));

        let with_margin = credit.with_margin_pct(Decimal::new(1, 1)); // 0.1
        assert_eq!(with_margin.spend_multiplier(), Decimal::new(72, 2));
    }

    #[test]
    fn test_percentages_valid() {
        let mut credit = Credit::new(
            CreditId::new("credit:1"),
            Currency::new("USD"),
            Decimal::new(2, 1),
        );
        assert!(credit.percentages_valid());

        credit.license_fee_pct = Decimal::ONE;
        assert!(!credit.percentages_valid());
    }
}
