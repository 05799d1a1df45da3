//! Budget Ledger
//!
//! Aggregates a campaign's possibly-overlapping budget line items into the
//! live remaining-budget projection for today and tomorrow. Spend capacity
//! already committed for today is drawn from the soonest-to-expire items
//! first: any remainder left in an item that expires tonight is forfeited,
//! so longer-lived items are only touched once the expiring ones are
//! exhausted. The waterfall is an explicit ordered list consumed against a
//! running capacity accumulator, ordered by ascending end date then
//! ascending item id.
//!
//! All projection figures are media-side: fee and margin netted out,
//! converted to the campaign currency.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{GovernorError, GovernorResult};
use crate::providers::ExchangeRateProvider;
use crate::types::{BudgetItemId, BudgetLineItem, CampaignId, Credit, CreditId};

/// Result of `remaining_budget`
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetProjection {
    /// Ceiling sum of available amounts over items covering today, not yet
    /// reduced by today's planned spend
    pub remaining_today: Decimal,
    /// Sum over items covering tomorrow, reduced by the portion of today's
    /// committed capacity the waterfall must draw from them
    pub available_tomorrow: Decimal,
    /// Ledger slack not yet reflected in any entity's daily cap; negative
    /// when configured caps overcommit the ledger
    pub unattributed: Decimal,
}

impl BudgetProjection {
    pub fn zero() -> Self {
        Self {
            remaining_today: Decimal::ZERO,
            available_tomorrow: Decimal::ZERO,
            unattributed: Decimal::ZERO,
        }
    }
}

/// One budget line item as seen by the waterfall
#[derive(Clone, Debug, PartialEq)]
pub struct WaterfallDraw {
    pub item_id: BudgetItemId,
    pub end_date: NaiveDate,
    /// Spendable media value of the item on the query date
    pub spendable: Decimal,
    /// Portion of today's committed capacity drawn from this item
    pub draw: Decimal,
}

/// Planned consumption of today's committed capacity across the pool
#[derive(Clone, Debug, Default)]
pub struct WaterfallAllocation {
    pub draws: Vec<WaterfallDraw>,
    /// Capacity left after the whole pool is exhausted
    pub undrawn_capacity: Decimal,
}

impl WaterfallAllocation {
    pub fn draw_for(&self, item_id: &BudgetItemId) -> Decimal {
        self.draws
            .iter()
            .find(|d| &d.item_id == item_id)
            .map(|d| d.draw)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_drawn(&self) -> Decimal {
        self.draws.iter().map(|d| d.draw).sum()
    }
}

/// The campaign budget ledger: credits, line items and projections
pub struct BudgetLedger {
    credits: HashMap<CreditId, Credit>,
    items: HashMap<BudgetItemId, BudgetLineItem>,
    by_campaign: HashMap<CampaignId, BTreeSet<BudgetItemId>>,
    rates: Arc<dyn ExchangeRateProvider>,
}

impl BudgetLedger {
    pub fn new(rates: Arc<dyn ExchangeRateProvider>) -> Self {
        Self {
            credits: HashMap::new(),
            items: HashMap::new(),
            by_campaign: HashMap::new(),
            rates,
        }
    }

    pub fn register_credit(&mut self, credit: Credit) -> GovernorResult<()> {
        if !credit.percentages_valid() {
            return Err(GovernorError::InvalidFeePercentage {
                credit_id: credit.id.to_string(),
            });
        }
        self.credits.insert(credit.id.clone(), credit);
        Ok(())
    }

    pub fn register_line_item(&mut self, item: BudgetLineItem) -> GovernorResult<()> {
        if item.start_date > item.end_date {
            return Err(GovernorError::InvalidItemWindow {
                item_id: item.id.to_string(),
            });
        }
        if !self.credits.contains_key(&item.credit_id) {
            return Err(GovernorError::UnknownCredit {
                credit_id: item.credit_id.to_string(),
            });
        }
        self.by_campaign
            .entry(item.campaign_id.clone())
            .or_default()
            .insert(item.id.clone());
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn item(&self, item_id: &BudgetItemId) -> Option<&BudgetLineItem> {
        self.items.get(item_id)
    }

    pub fn credit(&self, credit_id: &CreditId) -> Option<&Credit> {
        self.credits.get(credit_id)
    }

    /// Line items of a campaign, ascending by id
    pub fn line_items(&self, campaign_id: &CampaignId) -> Vec<&BudgetLineItem> {
        self.by_campaign
            .get(campaign_id)
            .map(|ids| ids.iter().filter_map(|id| self.items.get(id)).collect())
            .unwrap_or_default()
    }

    /// Accrue realized spend against an item. Statements are facts, so the
    /// accrual is never rejected; an inconsistency surfaces as a loud
    /// projection error instead of being silently coerced.
    pub fn record_spend(&mut self, item_id: &BudgetItemId, amount: Decimal) -> GovernorResult<()> {
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| GovernorError::UnknownBudgetItem {
                item_id: item_id.to_string(),
            })?;
        item.spend_to_date += amount;
        Ok(())
    }

    /// Release part of an item's allocation back to its credit;
    /// `freed_amount` only ever grows
    pub fn free_amount(&mut self, item_id: &BudgetItemId, amount: Decimal) -> GovernorResult<()> {
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| GovernorError::UnknownBudgetItem {
                item_id: item_id.to_string(),
            })?;
        if amount < Decimal::ZERO || amount > item.available_amount() {
            return Err(GovernorError::OverRelease {
                item_id: item_id.to_string(),
                requested: amount,
                available: item.available_amount(),
            });
        }
        item.freed_amount += amount;
        Ok(())
    }

    /// Spendable media value of an item: available amount net of fee and
    /// margin, converted to campaign currency at the given date's rate
    fn spendable_value(&self, item: &BudgetLineItem, rate_date: NaiveDate) -> GovernorResult<Decimal> {
        let available = item.available_amount();
        if available < Decimal::ZERO {
            return Err(GovernorError::NegativeAvailableAmount {
                item_id: item.id.to_string(),
                available,
            });
        }
        let credit =
            self.credits
                .get(&item.credit_id)
                .ok_or_else(|| GovernorError::UnknownCredit {
                    credit_id: item.credit_id.to_string(),
                })?;
        let rate = self.rates.rate(rate_date, &credit.currency)?;
        Ok(available * credit.spend_multiplier() * rate)
    }

    /// Items covering `coverage_date` with spendable value > 0, valued at
    /// `rate_date`, ordered for the waterfall: ascending end date, then
    /// ascending item id
    fn pool(
        &self,
        campaign_id: &CampaignId,
        coverage_date: NaiveDate,
        rate_date: NaiveDate,
    ) -> GovernorResult<Vec<WaterfallDraw>> {
        let mut pool = Vec::new();
        for item in self.line_items(campaign_id) {
            if !item.covers(coverage_date) {
                continue;
            }
            let spendable = self.spendable_value(item, rate_date)?;
            if spendable <= Decimal::ZERO {
                continue;
            }
            pool.push(WaterfallDraw {
                item_id: item.id.clone(),
                end_date: item.end_date,
                spendable,
                draw: Decimal::ZERO,
            });
        }
        pool.sort_by(|a, b| {
            a.end_date
                .cmp(&b.end_date)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        Ok(pool)
    }

    /// Consume `capacity` across today's pool in waterfall order
    pub fn waterfall(
        &self,
        campaign_id: &CampaignId,
        date: NaiveDate,
        capacity: Decimal,
    ) -> GovernorResult<WaterfallAllocation> {
        let mut draws = self.pool(campaign_id, date, date)?;
        let mut remaining_capacity = capacity.max(Decimal::ZERO);
        for entry in &mut draws {
            let draw = entry.spendable.min(remaining_capacity);
            entry.draw = draw;
            remaining_capacity -= draw;
        }
        Ok(WaterfallAllocation {
            draws,
            undrawn_capacity: remaining_capacity,
        })
    }

    /// Project remaining budget for today and tomorrow.
    ///
    /// `max_daily_budget` is the campaign's already-committed spend capacity
    /// for today; `committed_daily_budget` is the sum of currently
    /// configured per-entity caps, used for the unattributed figure.
    pub fn remaining_budget(
        &self,
        campaign_id: &CampaignId,
        date: NaiveDate,
        max_daily_budget: Decimal,
        committed_daily_budget: Decimal,
    ) -> GovernorResult<BudgetProjection> {
        let allocation = self.waterfall(campaign_id, date, max_daily_budget)?;
        let remaining_today: Decimal = allocation.draws.iter().map(|d| d.spendable).sum();

        let tomorrow = date + chrono::Duration::days(1);
        let tomorrow_pool = self.pool(campaign_id, tomorrow, date)?;
        let available_tomorrow: Decimal = tomorrow_pool
            .iter()
            .map(|entry| entry.spendable - allocation.draw_for(&entry.item_id))
            .sum();

        let projection = BudgetProjection {
            remaining_today,
            available_tomorrow,
            unattributed: remaining_today - committed_daily_budget,
        };

        debug!(
            campaign_id = %campaign_id,
            remaining_today = %projection.remaining_today,
            available_tomorrow = %projection.available_tomorrow,
            unattributed = %projection.unattributed,
            "Projected remaining budget"
        );

        Ok(projection)
    }

    /// License fee blended across today's pool, weighted by available
    /// amount; zero for an empty pool
    pub fn blended_license_fee(
        &self,
        campaign_id: &CampaignId,
        date: NaiveDate,
    ) -> GovernorResult<Decimal> {
        let mut weighted = Decimal::ZERO;
        let mut total = Decimal::ZERO;
        for item in self.line_items(campaign_id) {
            if !item.covers(date) {
                continue;
            }
            let available = item.available_amount();
            if available <= Decimal::ZERO {
                continue;
            }
            let credit =
                self.credits
                    .get(&item.credit_id)
                    .ok_or_else(|| GovernorError::UnknownCredit {
                        credit_id: item.credit_id.to_string(),
                    })?;
            weighted += credit.license_fee_pct * available;
            total += available;
        }
        if total.is_zero() {
            Ok(Decimal::ZERO)
        } else {
            Ok(weighted / total)
        }
    }
}
