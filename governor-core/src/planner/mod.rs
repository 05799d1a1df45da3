//! Spend Cap Planner
//!
//! Computes the maximum theoretical daily spend a campaign's active
//! entities could commit on a date (`max_daily_budget`, a per-day
//! high-water mark over the settings revisions in force during that day)
//! and the spend they have actually committed through their currently
//! configured caps (`user_daily_budget`). A cap raised mid-day still counts
//! at its highest value for that day; a cap whose entity was deactivated
//! mid-day contributes nothing for the remainder, so the high-water mark
//! considers a deactivated revision as zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::directory::SettingsDirectory;
use crate::error::GovernorResult;
use crate::types::{AdGroupId, CampaignId, SourceId};

/// Per-entity daily cap breakdown
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyCapBreakdown {
    /// Caps of individually managed sources
    pub per_source: BTreeMap<(AdGroupId, SourceId), Decimal>,
    /// Caps of grouped "all sources" buckets, one per grouped ad group
    pub grouped: BTreeMap<AdGroupId, Decimal>,
}

impl DailyCapBreakdown {
    pub fn total(&self) -> Decimal {
        let sources: Decimal = self.per_source.values().copied().sum();
        let grouped: Decimal = self.grouped.values().copied().sum();
        sources + grouped
    }

    /// Combined cap committed within one ad group
    pub fn ad_group_total(&self, ad_group_id: &AdGroupId) -> Decimal {
        let sources: Decimal = self
            .per_source
            .iter()
            .filter(|((ag, _), _)| ag == ad_group_id)
            .map(|(_, cap)| *cap)
            .sum();
        sources
            + self
                .grouped
                .get(ad_group_id)
                .copied()
                .unwrap_or(Decimal::ZERO)
    }
}

/// Planner over the settings directory
#[derive(Clone, Debug, Default)]
pub struct SpendCapPlanner;

impl SpendCapPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Maximum spend the campaign's entities could commit on `date`
    pub fn max_daily_budget(
        &self,
        directory: &SettingsDirectory,
        campaign_id: &CampaignId,
        date: NaiveDate,
    ) -> GovernorResult<Decimal> {
        Ok(self
            .max_daily_budget_per_source(directory, campaign_id, date)?
            .total())
    }

    /// Per-entity breakdown of the per-day high-water caps
    pub fn max_daily_budget_per_source(
        &self,
        directory: &SettingsDirectory,
        campaign_id: &CampaignId,
        date: NaiveDate,
    ) -> GovernorResult<DailyCapBreakdown> {
        let mut breakdown = DailyCapBreakdown::default();

        for ad_group_id in directory.ad_groups_of(campaign_id) {
            let revisions = match directory.ad_group_log(&ad_group_id) {
                Some(log) => log.in_force_on(date),
                None => continue,
            };
            if revisions.is_empty() {
                continue;
            }
            if !revisions.iter().any(|r| r.is_running_on(date)) {
                continue;
            }

            let grouped_now = revisions
                .last()
                .map(|r| r.sources_grouped())
                .unwrap_or(false);

            if grouped_now {
                let cap = revisions
                    .iter()
                    .filter_map(|r| match (r.grouped_daily_budget, r.grouped_state) {
                        (Some(cap), Some(state)) if state.is_active() => Some(cap),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(Decimal::ZERO);
                if cap > Decimal::ZERO {
                    breakdown.grouped.insert(ad_group_id.clone(), cap);
                }
            } else {
                for source_id in directory.sources_of(&ad_group_id) {
                    let cap = directory
                        .source_log(&ad_group_id, &source_id)
                        .map(|log| {
                            log.in_force_on(date)
                                .iter()
                                .map(|r| {
                                    if r.state.is_active() {
                                        r.daily_budget
                                    } else {
                                        Decimal::ZERO
                                    }
                                })
                                .max()
                                .unwrap_or(Decimal::ZERO)
                        })
                        .unwrap_or(Decimal::ZERO);
                    if cap > Decimal::ZERO {
                        breakdown
                            .per_source
                            .insert((ad_group_id.clone(), source_id), cap);
                    }
                }
            }
        }

        Ok(breakdown)
    }

    /// Spend committed through currently configured caps
    pub fn user_daily_budget(
        &self,
        directory: &SettingsDirectory,
        campaign_id: &CampaignId,
        date: NaiveDate,
    ) -> GovernorResult<Decimal> {
        Ok(self
            .user_daily_budget_per_source(directory, campaign_id, date)?
            .total())
    }

    /// Per-entity breakdown of the currently configured caps
    pub fn user_daily_budget_per_source(
        &self,
        directory: &SettingsDirectory,
        campaign_id: &CampaignId,
        date: NaiveDate,
    ) -> GovernorResult<DailyCapBreakdown> {
        let mut breakdown = DailyCapBreakdown::default();

        for ad_group_id in directory.ad_groups_of(campaign_id) {
            let settings = match directory.ad_group_settings(&ad_group_id) {
                Some(settings) => settings,
                None => continue,
            };
            if !settings.is_running_on(date) {
                continue;
            }

            if settings.sources_grouped() {
                let active = settings
                    .grouped_state
                    .map(|state| state.is_active())
                    .unwrap_or(false);
                let cap = settings.grouped_daily_budget.unwrap_or(Decimal::ZERO);
                if active && cap > Decimal::ZERO {
                    breakdown.grouped.insert(ad_group_id.clone(), cap);
                }
            } else {
                for source_id in directory.sources_of(&ad_group_id) {
                    if let Some(source) = directory.source_settings(&ad_group_id, &source_id) {
                        if source.state.is_active() && source.daily_budget > Decimal::ZERO {
                            breakdown
                                .per_source
                                .insert((ad_group_id.clone(), source_id), source.daily_budget);
                        }
                    }
                }
            }
        }

        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AdGroupSourceSpendSettings, AdGroupSpendSettings, CampaignSpendSettings, EntityState,
    };
    use chrono::{DateTime, Utc};

    fn dt(day: u32, hour: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn directory_with_source(cap: i64) -> SettingsDirectory {
        let mut dir = SettingsDirectory::new();
        dir.record_campaign_settings(CampaignSpendSettings::initial(
            CampaignId::new("c1"),
            true,
            dt(1, 8),
        ))
        .unwrap();
        dir.register_ad_group(CampaignId::new("c1"), AdGroupId::new("ag1"));
        dir.record_ad_group_settings(AdGroupSpendSettings::initial(
            AdGroupId::new("ag1"),
            date(1),
            dt(1, 8),
        ))
        .unwrap();
        dir.record_source_settings(AdGroupSourceSpendSettings::initial(
            AdGroupId::new("ag1"),
            SourceId::new("s1"),
            Decimal::new(cap, 0),
            dt(1, 8),
        ))
        .unwrap();
        dir
    }

    #[test]
    fn test_mid_day_raise_counts_at_highest_value() {
        let mut dir = directory_with_source(50);
        let raised = dir
            .source_settings(&AdGroupId::new("ag1"), &SourceId::new("s1"))
            .unwrap()
            .next(dt(15, 10))
            .with_daily_budget(Decimal::new(80, 0));
        dir.record_source_settings(raised).unwrap();

        let planner = SpendCapPlanner::new();
        assert_eq!(
            planner
                .max_daily_budget(&dir, &CampaignId::new("c1"), date(15))
                .unwrap(),
            Decimal::new(80, 0)
        );
        // the current configuration is also 80
        assert_eq!(
            planner
                .user_daily_budget(&dir, &CampaignId::new("c1"), date(15))
                .unwrap(),
            Decimal::new(80, 0)
        );
    }

    #[test]
    fn test_mid_day_deactivation_keeps_morning_high_water() {
        let mut dir = directory_with_source(50);
        let deactivated = dir
            .source_settings(&AdGroupId::new("ag1"), &SourceId::new("s1"))
            .unwrap()
            .next(dt(15, 12))
            .with_state(EntityState::Inactive);
        dir.record_source_settings(deactivated).unwrap();

        let planner = SpendCapPlanner::new();
        // the source could spend 50 in the morning
        assert_eq!(
            planner
                .max_daily_budget(&dir, &CampaignId::new("c1"), date(15))
                .unwrap(),
            Decimal::new(50, 0)
        );
        // but commits nothing going forward
        assert_eq!(
            planner
                .user_daily_budget(&dir, &CampaignId::new("c1"), date(15))
                .unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_not_running_ad_group_excluded() {
        let mut dir = directory_with_source(50);
        let stopped = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(14, 8))
            .with_state(EntityState::Inactive);
        dir.record_ad_group_settings(stopped).unwrap();

        let planner = SpendCapPlanner::new();
        assert_eq!(
            planner
                .max_daily_budget(&dir, &CampaignId::new("c1"), date(15))
                .unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_grouped_bucket_replaces_per_source_caps() {
        let mut dir = directory_with_source(50);
        let grouped = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(14, 8))
            .with_grouped_bucket(Decimal::new(120, 0), EntityState::Active);
        dir.record_ad_group_settings(grouped).unwrap();

        let planner = SpendCapPlanner::new();
        let breakdown = planner
            .max_daily_budget_per_source(&dir, &CampaignId::new("c1"), date(15))
            .unwrap();

        assert!(breakdown.per_source.is_empty());
        assert_eq!(
            breakdown.grouped.get(&AdGroupId::new("ag1")),
            Some(&Decimal::new(120, 0))
        );
        assert_eq!(breakdown.total(), Decimal::new(120, 0));
        assert_eq!(
            breakdown.ad_group_total(&AdGroupId::new("ag1")),
            Decimal::new(120, 0)
        );
    }

    #[test]
    fn test_end_dated_ad_group_not_running_after_end() {
        let mut dir = directory_with_source(50);
        let bounded = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(14, 8))
            .with_end_date(Some(date(14)));
        dir.record_ad_group_settings(bounded).unwrap();

        let planner = SpendCapPlanner::new();
        assert_eq!(
            planner
                .max_daily_budget(&dir, &CampaignId::new("c1"), date(15))
                .unwrap(),
            Decimal::ZERO
        );
    }
}
