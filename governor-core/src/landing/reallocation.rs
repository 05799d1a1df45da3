//! Daily Cap Reallocation
//!
//! While a campaign is landing, its per-source daily caps are recomputed
//! once per day so spend is drawn down to exactly zero without
//! overspending: the remaining budget is split evenly across the active ad
//! groups, non-spending sources are deactivated rather than shrunk, and
//! each ad group's share is redistributed across its surviving sources in
//! proportion to their prior cap share. Caps are planned in whole currency
//! units, with the division remainder assigned to the last entity in
//! ascending-id order, so per-source caps never sum above the ad group's
//! assignment.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::GovernorConfig;
use crate::directory::{SettingsDirectory, SettingsTransaction};
use crate::error::{GovernorError, GovernorResult};
use crate::logging::operations;
use crate::types::{
    AdGroupId, AdGroupSourceSpendSettings, CampaignId, EntityState, SourceId, SpendHistory,
    SystemUser,
};

/// Recomputes and shrinks per-source caps for landing campaigns
#[derive(Clone, Debug)]
pub struct DailyCapReallocator {
    non_spending_spend_ratio: Decimal,
    min_ad_group_daily_cap: Decimal,
}

impl DailyCapReallocator {
    pub fn new(config: &GovernorConfig) -> Self {
        Self {
            non_spending_spend_ratio: config.non_spending_spend_ratio,
            min_ad_group_daily_cap: config.min_ad_group_daily_cap,
        }
    }

    /// Even split of the remaining budget across ad groups, in whole
    /// currency units; the division remainder goes to the last ad group in
    /// ascending-id order
    pub fn calculate_daily_caps(
        &self,
        remaining_today: Decimal,
        ad_groups: &[AdGroupId],
    ) -> BTreeMap<AdGroupId, Decimal> {
        let mut caps = BTreeMap::new();
        if ad_groups.is_empty() {
            return caps;
        }

        let total = remaining_today.floor().max(Decimal::ZERO);
        let count = Decimal::from(ad_groups.len() as u64);
        let base = (total / count).floor();

        let mut assigned = Decimal::ZERO;
        for (idx, ad_group_id) in ad_groups.iter().enumerate() {
            let cap = if idx == ad_groups.len() - 1 {
                total - assigned
            } else {
                base
            };
            assigned += cap;
            caps.insert(ad_group_id.clone(), cap);
        }
        caps
    }

    /// Recompute today's caps for one landing campaign and write them as a
    /// single settings transaction. Returns the mutated ad groups.
    pub fn update_landing_campaign(
        &self,
        directory: &mut SettingsDirectory,
        campaign_id: &CampaignId,
        remaining_today: Decimal,
        today: NaiveDate,
        yesterday_spend: &SpendHistory,
        now: DateTime<Utc>,
    ) -> GovernorResult<Vec<AdGroupId>> {
        let yesterday = today - chrono::Duration::days(1);

        let active_ad_groups: Vec<AdGroupId> = directory
            .ad_groups_of(campaign_id)
            .into_iter()
            .filter(|id| {
                directory
                    .ad_group_settings(id)
                    .map(|s| s.is_running_on(today))
                    .unwrap_or(false)
            })
            .collect();

        if active_ad_groups.is_empty() {
            return Ok(Vec::new());
        }

        let caps = self.calculate_daily_caps(remaining_today, &active_ad_groups);
        let mut transaction = SettingsTransaction::new();

        for ad_group_id in &active_ad_groups {
            let settings = directory
                .ad_group_settings(ad_group_id)
                .ok_or_else(|| GovernorError::AdGroupSettingsMissing {
                    ad_group_id: ad_group_id.to_string(),
                })?
                .clone();
            let new_cap = caps.get(ad_group_id).copied().unwrap_or(Decimal::ZERO);

            if settings.sources_grouped() {
                let bucket_cap = settings.grouped_daily_budget.unwrap_or(Decimal::ZERO);
                let bucket_spend = yesterday_spend.ad_group_spend_on(ad_group_id, yesterday);

                if self.is_non_spending(bucket_spend, bucket_cap)
                    || new_cap < self.min_ad_group_daily_cap
                {
                    // the bucket is the ad group's only spender
                    transaction.push_ad_group(
                        settings
                            .next(now)
                            .with_state(EntityState::Inactive)
                            .with_landing_mode(true)
                            .with_system_user(SystemUser::CampaignStop),
                    );
                } else {
                    transaction.push_ad_group(
                        settings
                            .next(now)
                            .with_daily_budget(Some(new_cap))
                            .with_grouped_bucket(new_cap, EntityState::Active)
                            .with_landing_mode(true)
                            .with_system_user(SystemUser::CampaignStop),
                    );
                }
                continue;
            }

            let mut survivors: Vec<(SourceId, AdGroupSourceSpendSettings)> = Vec::new();
            let mut deactivated: Vec<AdGroupSourceSpendSettings> = Vec::new();
            for source_id in directory.sources_of(ad_group_id) {
                let source = match directory.source_settings(ad_group_id, &source_id) {
                    Some(source) if source.state.is_active() => source.clone(),
                    _ => continue,
                };
                let spent =
                    yesterday_spend.source_spend_on(ad_group_id, &source_id, yesterday);
                if self.is_non_spending(spent, source.daily_budget) {
                    deactivated.push(source);
                } else {
                    survivors.push((source_id, source));
                }
            }

            if survivors.is_empty() || new_cap < self.min_ad_group_daily_cap {
                info!(
                    ad_group_id = %ad_group_id,
                    operation = operations::REALLOCATE_CAPS,
                    "Deactivating ad group with no usable allocation"
                );
                transaction.push_ad_group(
                    settings
                        .next(now)
                        .with_state(EntityState::Inactive)
                        .with_landing_mode(true)
                        .with_system_user(SystemUser::CampaignStop),
                );
                continue;
            }

            transaction.push_ad_group(
                settings
                    .next(now)
                    .with_daily_budget(Some(new_cap))
                    .with_landing_mode(true)
                    .with_system_user(SystemUser::CampaignStop),
            );
            for source in deactivated {
                transaction.push_source(
                    source
                        .next(now)
                        .with_state(EntityState::Inactive)
                        .with_landing_mode(true)
                        .with_system_user(SystemUser::CampaignStop),
                );
            }
            for (idx, (source_id, source)) in survivors.iter().enumerate() {
                let share = self.source_share(new_cap, &survivors, idx);
                debug!(
                    ad_group_id = %ad_group_id,
                    source_id = %source_id,
                    amount = %share,
                    operation = operations::REALLOCATE_CAPS,
                    "Reallocated source daily cap"
                );
                transaction.push_source(
                    source
                        .next(now)
                        .with_daily_budget(share)
                        .with_landing_mode(true)
                        .with_system_user(SystemUser::CampaignStop),
                );
            }
        }

        directory.apply(transaction)
    }

    fn is_non_spending(&self, spent: Decimal, cap: Decimal) -> bool {
        spent < cap * self.non_spending_spend_ratio
    }

    /// Share of the ad group cap for the survivor at `idx`, proportional to
    /// its prior cap among the survivors, floored to whole units; the last
    /// survivor absorbs the remainder
    fn source_share(
        &self,
        ad_group_cap: Decimal,
        survivors: &[(SourceId, AdGroupSourceSpendSettings)],
        idx: usize,
    ) -> Decimal {
        let prior_total: Decimal = survivors.iter().map(|(_, s)| s.daily_budget).sum();
        let count = Decimal::from(survivors.len() as u64);

        let flat_share = |i: usize| -> Decimal {
            let base = (ad_group_cap / count).floor();
            if i == survivors.len() - 1 {
                ad_group_cap - base * (count - Decimal::ONE)
            } else {
                base
            }
        };

        if prior_total.is_zero() {
            return flat_share(idx);
        }

        if idx == survivors.len() - 1 {
            let assigned: Decimal = (0..idx)
                .map(|i| (ad_group_cap * survivors[i].1.daily_budget / prior_total).floor())
                .sum();
            ad_group_cap - assigned
        } else {
            (ad_group_cap * survivors[idx].1.daily_budget / prior_total).floor()
        }
    }
}
