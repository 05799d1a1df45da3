//! Edit Guard
//!
//! Pure bound queries consumed synchronously by edit validation: how high a
//! bid, daily cap, autopilot cap or budget amount may be set at this
//! instant. The guard never rejects anything itself; it reports a bound and
//! the caller decides. No query here performs writes, so these may run
//! concurrently with governor sweeps; the accepted race against a
//! concurrent landing entry resolves by last-writer-wins on the revision
//! log, because the caller re-validates against the ledger at save time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::ReconciliationCutover;
use crate::directory::SettingsDirectory;
use crate::error::{GovernorError, GovernorResult};
use crate::ledger::BudgetLedger;
use crate::planner::SpendCapPlanner;
use crate::types::{AdGroupId, BudgetItemId, BudgetItemPhase, Campaign, SourceId};

/// Maximum/minimum settable value queries for operator edits
pub struct EditGuard {
    cutover: ReconciliationCutover,
}

impl EditGuard {
    pub fn new(cutover: ReconciliationCutover) -> Self {
        Self { cutover }
    }

    /// Upper bound for a source's daily cap; `None` when the guard does not
    /// apply, zero while the campaign is landing
    pub fn max_settable_source_daily_budget(
        &self,
        directory: &SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        ad_group_id: &AdGroupId,
        source_id: &SourceId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let already_committed = directory
            .source_settings(ad_group_id, source_id)
            .map(|s| s.daily_budget)
            .unwrap_or(Decimal::ZERO);
        self.max_settable_cap(directory, ledger, planner, campaign, ad_group_id, already_committed, now)
    }

    /// Upper bound for the grouped "all sources" bucket cap
    pub fn max_settable_source_group_daily_budget(
        &self,
        directory: &SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        ad_group_id: &AdGroupId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let already_committed = directory
            .ad_group_settings(ad_group_id)
            .and_then(|s| s.grouped_daily_budget)
            .unwrap_or(Decimal::ZERO);
        self.max_settable_cap(directory, ledger, planner, campaign, ad_group_id, already_committed, now)
    }

    /// Upper bound for the autopilot daily cap
    pub fn max_settable_autopilot_daily_budget(
        &self,
        directory: &SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        ad_group_id: &AdGroupId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let already_committed = directory
            .ad_group_settings(ad_group_id)
            .and_then(|s| s.autopilot_daily_budget)
            .unwrap_or(Decimal::ZERO);
        self.max_settable_cap(directory, ledger, planner, campaign, ad_group_id, already_committed, now)
    }

    /// Shared contract for every cap bound.
    ///
    /// Before the reconciliation cutover today's plan is not yet finalized,
    /// so the whole of today's headroom is offered; after it, extra room is
    /// granted only as far as tomorrow's budget independently proves it.
    #[allow(clippy::too_many_arguments)]
    fn max_settable_cap(
        &self,
        directory: &SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        ad_group_id: &AdGroupId,
        already_committed: Decimal,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let settings = match directory.campaign_settings(&campaign.id) {
            Some(settings) if settings.automatic_stop_enabled => settings,
            _ => return Ok(None),
        };

        let today = campaign.local_today(now);
        let running = directory
            .ad_group_settings(ad_group_id)
            .map(|s| s.is_running_on(today))
            .unwrap_or(false);
        if !running {
            return Ok(None);
        }

        if settings.landing_mode {
            return Ok(Some(Decimal::ZERO));
        }

        let max_daily_budget = planner.max_daily_budget(directory, &campaign.id, today)?;
        let user_daily_budget = planner.user_daily_budget(directory, &campaign.id, today)?;
        let projection =
            ledger.remaining_budget(&campaign.id, today, max_daily_budget, user_daily_budget)?;

        let extra_today = (projection.remaining_today - user_daily_budget).max(Decimal::ZERO);
        let extra_tomorrow =
            (projection.available_tomorrow - user_daily_budget).max(Decimal::ZERO);

        let bound = if self.cutover.has_run_by(now) {
            already_committed + extra_today.min(extra_tomorrow)
        } else {
            already_committed + extra_today
        };
        Ok(Some(bound))
    }

    /// Minimum top-up to a budget or credit that would avert landing mode,
    /// grossed up by the campaign's blended license fee
    pub fn min_budget_increase(
        &self,
        directory: &SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> GovernorResult<Decimal> {
        let today = campaign.local_today(now);
        let max_daily_budget = planner.max_daily_budget(directory, &campaign.id, today)?;
        let user_daily_budget = planner.user_daily_budget(directory, &campaign.id, today)?;
        let projection =
            ledger.remaining_budget(&campaign.id, today, max_daily_budget, user_daily_budget)?;

        let shortfall_today =
            (max_daily_budget - projection.remaining_today).max(Decimal::ZERO);
        let shortfall_tomorrow =
            (user_daily_budget - projection.available_tomorrow).max(Decimal::ZERO);
        // configured caps can overcommit the ledger even when today's
        // high-water plan fits
        let overcommitted = (-projection.unattributed).max(Decimal::ZERO);

        let net = shortfall_today.max(shortfall_tomorrow).max(overcommitted);
        if net.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let fee = ledger.blended_license_fee(&campaign.id, today)?;
        Ok(net / (Decimal::ONE - fee))
    }

    /// Lower bound an operator may shrink a budget line item's amount to:
    /// money already obligated plus the item's share of the committed daily
    /// caps for each remaining day of its window
    pub fn minimum_budget_amount(
        &self,
        directory: &SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        item_id: &BudgetItemId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let automatic_stop = directory
            .campaign_settings(&campaign.id)
            .map(|s| s.automatic_stop_enabled)
            .unwrap_or(false);
        if !automatic_stop {
            return Ok(None);
        }

        let item = ledger
            .item(item_id)
            .ok_or_else(|| GovernorError::UnknownBudgetItem {
                item_id: item_id.to_string(),
            })?;
        let today = campaign.local_today(now);
        if item.phase(today) != BudgetItemPhase::Active {
            return Ok(None);
        }
        let credit =
            ledger
                .credit(&item.credit_id)
                .ok_or_else(|| GovernorError::UnknownCredit {
                    credit_id: item.credit_id.to_string(),
                })?;

        let pool_total: Decimal = ledger
            .line_items(&campaign.id)
            .iter()
            .filter(|i| i.covers(today) && i.available_amount() > Decimal::ZERO)
            .map(|i| i.available_amount())
            .sum();
        let share = if pool_total.is_zero() {
            Decimal::ONE
        } else {
            item.available_amount() / pool_total
        };

        let user_daily_budget = planner.user_daily_budget(directory, &campaign.id, today)?;
        let remaining_days = Decimal::from((item.end_date - today).num_days() + 1);
        let future_net = user_daily_budget * share * remaining_days;

        let multiplier = credit.spend_multiplier();
        let future_gross = if multiplier.is_zero() {
            future_net
        } else {
            future_net / multiplier
        };

        Ok(Some(item.freed_amount + item.spend_to_date + future_gross))
    }

    /// Amount edits are blocked while the daily reconciliation job is
    /// presumed not yet to have run: valid only from the cutover until the
    /// campaign-local midnight that follows it
    pub fn is_current_time_valid_for_amount_editing(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> bool {
        let cut = self.cutover.instant_on(now.date_naive());
        if now < cut {
            return false;
        }

        let offset = chrono::Duration::minutes(campaign.utc_offset_minutes as i64);
        let local_cut_date = (cut + offset).date_naive();
        let close = (local_cut_date + chrono::Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight")
            .and_utc()
            - offset;

        now < close
    }
}
