//! Landing Mode Controller
//!
//! Two-state machine per campaign: NORMAL and LANDING. Entry happens when
//! the ledger can no longer sustain the spend the campaign's entities have
//! committed; while landing, caps are drawn down daily and ad groups past
//! their forced end date are hard-stopped; once nothing is left that could
//! spend and resumption is not warranted, the campaign wraps up back to
//! NORMAL. Neither state is terminal.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::GovernorConfig;
use crate::directory::{SettingsDirectory, SettingsTransaction};
use crate::error::{GovernorError, GovernorResult};
use crate::ledger::{BudgetLedger, BudgetProjection};
use crate::logging::operations;
use crate::planner::SpendCapPlanner;
use crate::providers::{ConfigSyncSignal, LandingEvent, LandingNotifier, SpendProvider};
use crate::types::{AdGroupId, Campaign, CampaignId, SpendHistory, SystemUser};

use super::reallocation::DailyCapReallocator;

/// Decision taken by a single landing-mode check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandingCheckOutcome {
    /// The governor is not allowed to act on this campaign
    AutomaticStopDisabled,
    /// Already landing; checking again performs no further writes
    AlreadyLanding,
    /// Every active ad group's forced end date has passed; nothing left
    /// that could spend, so the check is a no-op
    NothingLeftToSpend,
    /// The ledger sustains the committed spend
    BudgetSufficient,
    /// The campaign was switched to landing mode
    SwitchedToLanding,
}

/// Outcome of one scheduled sweep over many campaigns
#[derive(Debug, Default)]
pub struct SweepReport {
    pub processed: usize,
    pub changed: usize,
    /// Campaigns skipped this cycle; they are retried on the next run
    pub skipped: Vec<(CampaignId, GovernorError)>,
}

/// Campaign-level throttling state machine
pub struct LandingModeController {
    config: GovernorConfig,
    reallocator: DailyCapReallocator,
}

impl LandingModeController {
    pub fn new(config: GovernorConfig) -> Self {
        let reallocator = DailyCapReallocator::new(&config);
        Self {
            config,
            reallocator,
        }
    }

    /// Decide whether a campaign must enter landing mode, and enter it if so
    #[allow(clippy::too_many_arguments)]
    pub fn perform_landing_mode_check(
        &self,
        directory: &mut SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        today: NaiveDate,
        now: DateTime<Utc>,
        sync: &dyn ConfigSyncSignal,
        notifier: &dyn LandingNotifier,
    ) -> GovernorResult<LandingCheckOutcome> {
        let settings = directory
            .campaign_settings(&campaign.id)
            .ok_or_else(|| GovernorError::CampaignSettingsMissing {
                campaign_id: campaign.id.to_string(),
            })?
            .clone();

        if !settings.automatic_stop_enabled {
            return Ok(LandingCheckOutcome::AutomaticStopDisabled);
        }
        if settings.landing_mode {
            return Ok(LandingCheckOutcome::AlreadyLanding);
        }

        let active_ad_groups: Vec<AdGroupId> = directory
            .ad_groups_of(&campaign.id)
            .into_iter()
            .filter(|id| {
                directory
                    .ad_group_settings(id)
                    .map(|s| s.state.is_active())
                    .unwrap_or(false)
            })
            .collect();

        if !active_ad_groups.is_empty() {
            let stale: Vec<&AdGroupId> = active_ad_groups
                .iter()
                .filter(|id| {
                    directory
                        .ad_group_settings(id)
                        .and_then(|s| s.end_date)
                        .map_or(false, |end| end < today)
                })
                .collect();
            if stale.len() == active_ad_groups.len() {
                // everything already stopped naturally; flapping guard
                return Ok(LandingCheckOutcome::NothingLeftToSpend);
            }
            if let Some(ad_group_id) = stale.first() {
                let end_date = directory
                    .ad_group_settings(ad_group_id)
                    .and_then(|s| s.end_date)
                    .expect("stale ad group has end date");
                return Err(GovernorError::StaleForcedEndDate {
                    ad_group_id: ad_group_id.to_string(),
                    end_date,
                });
            }
        }

        let max_daily_budget = planner.max_daily_budget(directory, &campaign.id, today)?;
        let user_daily_budget = planner.user_daily_budget(directory, &campaign.id, today)?;
        let projection =
            ledger.remaining_budget(&campaign.id, today, max_daily_budget, user_daily_budget)?;

        if projection.remaining_today < max_daily_budget
            || projection.available_tomorrow < user_daily_budget
        {
            self.switch_to_landing_mode(
                directory,
                campaign,
                today,
                now,
                &projection,
                max_daily_budget,
                user_daily_budget,
                sync,
                notifier,
            )?;
            return Ok(LandingCheckOutcome::SwitchedToLanding);
        }

        Ok(LandingCheckOutcome::BudgetSufficient)
    }

    /// Enter landing mode as one settings transaction: the campaign flags
    /// landing, every running ad group is force-stopped at the end of
    /// today, every other ad group merely mirrors the landing flag. The
    /// config-sync signal and the notification fire only after the
    /// transaction has committed and never roll it back.
    #[allow(clippy::too_many_arguments)]
    pub fn switch_to_landing_mode(
        &self,
        directory: &mut SettingsDirectory,
        campaign: &Campaign,
        today: NaiveDate,
        now: DateTime<Utc>,
        projection: &BudgetProjection,
        max_daily_budget: Decimal,
        user_daily_budget: Decimal,
        sync: &dyn ConfigSyncSignal,
        notifier: &dyn LandingNotifier,
    ) -> GovernorResult<Vec<AdGroupId>> {
        let campaign_revision = directory
            .campaign_settings(&campaign.id)
            .ok_or_else(|| GovernorError::CampaignSettingsMissing {
                campaign_id: campaign.id.to_string(),
            })?
            .next(now)
            .with_landing_mode(true)
            .with_system_user(SystemUser::CampaignStop);

        let mut transaction = SettingsTransaction::new().with_campaign(campaign_revision);
        let mut stopped = Vec::new();

        for ad_group_id in directory.ad_groups_of(&campaign.id) {
            let settings = directory
                .ad_group_settings(&ad_group_id)
                .ok_or_else(|| GovernorError::AdGroupSettingsMissing {
                    ad_group_id: ad_group_id.to_string(),
                })?
                .clone();
            if settings.is_running_on(today) {
                transaction.push_ad_group(
                    settings
                        .next(now)
                        .with_end_date(Some(today))
                        .with_landing_mode(true)
                        .with_system_user(SystemUser::CampaignStop),
                );
                stopped.push(ad_group_id);
            } else {
                // not the governor's decision to stop something not running
                transaction.push_ad_group(settings.next(now).with_landing_mode(true));
            }
        }

        let mutated = directory.apply(transaction)?;

        for ad_group_id in &mutated {
            sync.ad_group_settings_changed(ad_group_id);
        }
        notifier.landing_mode_entered(&LandingEvent {
            campaign_id: campaign.id.clone(),
            date: today,
            remaining_today: projection.remaining_today,
            available_tomorrow: projection.available_tomorrow,
            max_daily_budget,
            user_daily_budget,
            stopped_ad_groups: stopped,
        });

        info!(
            campaign_id = %campaign.id,
            count = mutated.len(),
            operation = operations::SWITCH_TO_LANDING,
            "Campaign switched to landing mode"
        );

        Ok(mutated)
    }

    /// Scheduled sweep deciding landing entry for every campaign; each
    /// campaign is checked independently and a failing campaign is skipped
    /// for the cycle and retried on the next run
    pub fn switch_low_budget_campaigns_to_landing_mode(
        &self,
        directory: &mut SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaigns: &[Campaign],
        now: DateTime<Utc>,
        sync: &dyn ConfigSyncSignal,
        notifier: &dyn LandingNotifier,
    ) -> SweepReport {
        let mut report = SweepReport::default();

        for campaign in campaigns {
            report.processed += 1;
            let today = campaign.local_today(now);
            match self.perform_landing_mode_check(
                directory, ledger, planner, campaign, today, now, sync, notifier,
            ) {
                Ok(LandingCheckOutcome::SwitchedToLanding) => report.changed += 1,
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        campaign_id = %campaign.id,
                        error = %error,
                        operation = operations::SWEEP_LOW_BUDGET,
                        "Skipping campaign for this cycle"
                    );
                    report.skipped.push((campaign.id.clone(), error));
                }
            }
        }

        report
    }

    /// Scheduled sweep over campaigns currently landing: reallocate today's
    /// caps, hard-stop ad groups past their forced end date, and wrap up
    /// back to NORMAL once nothing is left that could spend
    #[allow(clippy::too_many_arguments)]
    pub fn update_campaigns_in_landing(
        &self,
        directory: &mut SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaigns: &[Campaign],
        now: DateTime<Utc>,
        spend_provider: &dyn SpendProvider,
        sync: &dyn ConfigSyncSignal,
    ) -> SweepReport {
        let mut report = SweepReport::default();

        for campaign in campaigns {
            let landing = directory
                .campaign_settings(&campaign.id)
                .map(|s| s.landing_mode)
                .unwrap_or(false);
            if !landing {
                continue;
            }
            report.processed += 1;

            match self.update_landing_campaign(
                directory,
                ledger,
                planner,
                campaign,
                now,
                spend_provider,
                sync,
            ) {
                Ok(exited) => {
                    if exited {
                        report.changed += 1;
                    }
                }
                Err(error) => {
                    warn!(
                        campaign_id = %campaign.id,
                        error = %error,
                        operation = operations::SWEEP_LANDING_UPDATE,
                        "Skipping landing campaign for this cycle"
                    );
                    report.skipped.push((campaign.id.clone(), error));
                }
            }
        }

        report
    }

    /// One landing campaign's daily update; returns whether the campaign
    /// exited landing mode
    fn update_landing_campaign(
        &self,
        directory: &mut SettingsDirectory,
        ledger: &BudgetLedger,
        planner: &SpendCapPlanner,
        campaign: &Campaign,
        now: DateTime<Utc>,
        spend_provider: &dyn SpendProvider,
        sync: &dyn ConfigSyncSignal,
    ) -> GovernorResult<bool> {
        let today = campaign.local_today(now);
        let yesterday = today - chrono::Duration::days(1);
        let pairs = directory.source_pairs_of(&campaign.id);

        let yesterday_spend =
            SpendHistory::new(spend_provider.daily_spend(&pairs, yesterday)?);
        let history = SpendHistory::new(spend_provider.spend_history(
            &pairs,
            today - chrono::Duration::days(self.config.landing_history_days),
            yesterday,
        )?);

        let max_daily_budget = planner.max_daily_budget(directory, &campaign.id, today)?;
        let user_daily_budget = planner.user_daily_budget(directory, &campaign.id, today)?;
        let projection =
            ledger.remaining_budget(&campaign.id, today, max_daily_budget, user_daily_budget)?;

        let reallocated = self.reallocator.update_landing_campaign(
            directory,
            &campaign.id,
            projection.remaining_today,
            today,
            &yesterday_spend,
            now,
        )?;
        for ad_group_id in &reallocated {
            sync.ad_group_settings_changed(ad_group_id);
        }

        let hard_stopped = self.check_ad_groups_end_date(directory, &campaign.id, today, now)?;
        for ad_group_id in &hard_stopped {
            sync.ad_group_settings_changed(ad_group_id);
        }

        let any_eligible = directory.ad_groups_of(&campaign.id).iter().any(|id| {
            directory
                .ad_group_settings(id)
                .map(|s| s.is_running_on(today))
                .unwrap_or(false)
        });

        if !any_eligible && !self.can_resume_campaign(projection.remaining_today, &history) {
            let exited = self.exit_landing_mode(directory, &campaign.id, now)?;
            for ad_group_id in &exited {
                sync.ad_group_settings_changed(ad_group_id);
            }
            info!(
                campaign_id = %campaign.id,
                operation = operations::EXIT_LANDING,
                "Campaign wrapped up and left landing mode"
            );
            return Ok(true);
        }

        Ok(false)
    }

    /// Hard-stop ad groups whose forced end date has passed, regardless of
    /// spend state
    fn check_ad_groups_end_date(
        &self,
        directory: &mut SettingsDirectory,
        campaign_id: &CampaignId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> GovernorResult<Vec<AdGroupId>> {
        let mut transaction = SettingsTransaction::new();

        for ad_group_id in directory.ad_groups_of(campaign_id) {
            let settings = match directory.ad_group_settings(&ad_group_id) {
                Some(settings) => settings,
                None => continue,
            };
            let past_end = settings.end_date.map_or(false, |end| end < today);
            if settings.state.is_active() && past_end {
                info!(
                    ad_group_id = %ad_group_id,
                    operation = operations::HARD_STOP,
                    "Hard-stopping ad group past its forced end date"
                );
                transaction.push_ad_group(
                    settings
                        .next(now)
                        .with_state(crate::types::EntityState::Inactive)
                        .with_system_user(SystemUser::CampaignStop),
                );
            }
        }

        if transaction.is_empty() {
            return Ok(Vec::new());
        }
        directory.apply(transaction)
    }

    /// Whether recent spend justifies keeping the campaign in landing so it
    /// can resume: the trailing average must be positive and covered by at
    /// least one more day of remaining budget
    fn can_resume_campaign(&self, remaining_today: Decimal, history: &SpendHistory) -> bool {
        let average = history.daily_average(self.config.landing_history_days);
        average > Decimal::ZERO && remaining_today >= average
    }

    /// Wrap up: clear the landing flag on the campaign, every ad group and
    /// every source. No forced-stop side effects on exit.
    fn exit_landing_mode(
        &self,
        directory: &mut SettingsDirectory,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Vec<AdGroupId>> {
        let campaign_revision = directory
            .campaign_settings(campaign_id)
            .ok_or_else(|| GovernorError::CampaignSettingsMissing {
                campaign_id: campaign_id.to_string(),
            })?
            .next(now)
            .with_landing_mode(false)
            .with_system_user(SystemUser::CampaignStop);

        let mut transaction = SettingsTransaction::new().with_campaign(campaign_revision);

        for ad_group_id in directory.ad_groups_of(campaign_id) {
            if let Some(settings) = directory.ad_group_settings(&ad_group_id) {
                if settings.landing_mode {
                    transaction.push_ad_group(
                        settings
                            .next(now)
                            .with_landing_mode(false)
                            .with_system_user(SystemUser::CampaignStop),
                    );
                }
            }
            for source_id in directory.sources_of(&ad_group_id) {
                if let Some(source) = directory.source_settings(&ad_group_id, &source_id) {
                    if source.landing_mode {
                        transaction.push_source(
                            source
                                .next(now)
                                .with_landing_mode(false)
                                .with_system_user(SystemUser::CampaignStop),
                        );
                    }
                }
            }
        }

        directory.apply(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FixedExchangeRates, RecordingConfigSync, RecordingNotifier};
    use crate::types::{
        AdGroupSourceSpendSettings, AdGroupSpendSettings, BudgetItemId, BudgetLineItem,
        CampaignSpendSettings, Credit, CreditId, Currency, EntityState, SourceId,
    };
    use std::sync::Arc;

    fn dt(day: u32, hour: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn date(day: u32) -> NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn campaign() -> Campaign {
        Campaign::new(CampaignId::new("c1"), "Spring push", Currency::new("USD"))
    }

    fn directory() -> SettingsDirectory {
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
            Decimal::new(100, 0),
            dt(1, 8),
        ))
        .unwrap();
        dir
    }

    fn ledger_with_budget(amount: i64) -> BudgetLedger {
        let mut ledger = BudgetLedger::new(Arc::new(FixedExchangeRates::identity()));
        ledger
            .register_credit(Credit::new(
                CreditId::new("cr1"),
                Currency::new("USD"),
                Decimal::ZERO,
            ))
            .unwrap();
        ledger
            .register_line_item(BudgetLineItem::new(
                BudgetItemId::new("b1"),
                CampaignId::new("c1"),
                CreditId::new("cr1"),
                date(1),
                date(31),
                Decimal::new(amount, 0),
            ))
            .unwrap();
        ledger
    }

    #[test]
    fn test_sufficient_budget_leaves_campaign_alone() {
        let mut dir = directory();
        let ledger = ledger_with_budget(1000);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();

        let outcome = LandingModeController::new(GovernorConfig::default())
            .perform_landing_mode_check(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &campaign(),
                date(15),
                dt(15, 9),
                &sync,
                &notifier,
            )
            .unwrap();

        assert_eq!(outcome, LandingCheckOutcome::BudgetSufficient);
        assert!(!dir.campaign_settings(&CampaignId::new("c1")).unwrap().landing_mode);
        assert!(sync.signaled().is_empty());
    }

    #[test]
    fn test_low_budget_switches_to_landing() {
        let mut dir = directory();
        // remaining 50 cannot sustain the committed cap of 100
        let ledger = ledger_with_budget(50);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();
        let controller = LandingModeController::new(GovernorConfig::default());

        let outcome = controller
            .perform_landing_mode_check(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &campaign(),
                date(15),
                dt(15, 9),
                &sync,
                &notifier,
            )
            .unwrap();
        assert_eq!(outcome, LandingCheckOutcome::SwitchedToLanding);

        let campaign_settings = dir.campaign_settings(&CampaignId::new("c1")).unwrap();
        assert!(campaign_settings.landing_mode);
        assert_eq!(campaign_settings.system_user, Some(SystemUser::CampaignStop));

        let ad_group = dir.ad_group_settings(&AdGroupId::new("ag1")).unwrap();
        assert!(ad_group.landing_mode);
        assert_eq!(ad_group.end_date, Some(date(15)));
        assert_eq!(ad_group.system_user, Some(SystemUser::CampaignStop));

        assert_eq!(sync.signaled(), vec![AdGroupId::new("ag1")]);
        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stopped_ad_groups, vec![AdGroupId::new("ag1")]);
    }

    #[test]
    fn test_check_is_idempotent_once_landing() {
        let mut dir = directory();
        let ledger = ledger_with_budget(50);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();
        let controller = LandingModeController::new(GovernorConfig::default());
        let planner = SpendCapPlanner::new();

        controller
            .perform_landing_mode_check(
                &mut dir, &ledger, &planner, &campaign(), date(15), dt(15, 9), &sync, &notifier,
            )
            .unwrap();
        let revisions_after_first = dir.campaign_log(&CampaignId::new("c1")).unwrap().len();

        let outcome = controller
            .perform_landing_mode_check(
                &mut dir, &ledger, &planner, &campaign(), date(15), dt(15, 10), &sync, &notifier,
            )
            .unwrap();

        assert_eq!(outcome, LandingCheckOutcome::AlreadyLanding);
        assert_eq!(
            dir.campaign_log(&CampaignId::new("c1")).unwrap().len(),
            revisions_after_first
        );
        assert_eq!(notifier.events().len(), 1);
    }

    #[test]
    fn test_automatic_stop_disabled_is_noop() {
        let mut dir = SettingsDirectory::new();
        dir.record_campaign_settings(CampaignSpendSettings::initial(
            CampaignId::new("c1"),
            false,
            dt(1, 8),
        ))
        .unwrap();
        let ledger = ledger_with_budget(0);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();

        let outcome = LandingModeController::new(GovernorConfig::default())
            .perform_landing_mode_check(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &campaign(),
                date(15),
                dt(15, 9),
                &sync,
                &notifier,
            )
            .unwrap();
        assert_eq!(outcome, LandingCheckOutcome::AutomaticStopDisabled);
    }

    #[test]
    fn test_non_running_ad_group_mirrors_flag_without_stop() {
        let mut dir = directory();
        dir.register_ad_group(CampaignId::new("c1"), AdGroupId::new("ag2"));
        dir.record_ad_group_settings(
            AdGroupSpendSettings::initial(AdGroupId::new("ag2"), date(1), dt(1, 8))
                .with_state(EntityState::Inactive),
        )
        .unwrap();

        let ledger = ledger_with_budget(50);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();

        LandingModeController::new(GovernorConfig::default())
            .perform_landing_mode_check(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &campaign(),
                date(15),
                dt(15, 9),
                &sync,
                &notifier,
            )
            .unwrap();

        let paused = dir.ad_group_settings(&AdGroupId::new("ag2")).unwrap();
        assert!(paused.landing_mode);
        assert_eq!(paused.end_date, None);
        assert_eq!(paused.system_user, None);

        // both ad groups were mutated, so both are signaled
        assert_eq!(
            sync.signaled(),
            vec![AdGroupId::new("ag1"), AdGroupId::new("ag2")]
        );
        // only the running one was stopped
        assert_eq!(
            notifier.events()[0].stopped_ad_groups,
            vec![AdGroupId::new("ag1")]
        );
    }

    #[test]
    fn test_all_end_dates_past_is_noop() {
        let mut dir = directory();
        let ended = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(10, 8))
            .with_end_date(Some(date(12)));
        dir.record_ad_group_settings(ended).unwrap();

        let ledger = ledger_with_budget(50);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();

        let outcome = LandingModeController::new(GovernorConfig::default())
            .perform_landing_mode_check(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &campaign(),
                date(15),
                dt(15, 9),
                &sync,
                &notifier,
            )
            .unwrap();

        assert_eq!(outcome, LandingCheckOutcome::NothingLeftToSpend);
        assert!(!dir.campaign_settings(&CampaignId::new("c1")).unwrap().landing_mode);
    }

    #[test]
    fn test_partially_stale_end_dates_surface_loudly() {
        let mut dir = directory();
        let ended = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(10, 8))
            .with_end_date(Some(date(12)));
        dir.record_ad_group_settings(ended).unwrap();

        // a second, healthy ad group keeps the campaign spendable
        dir.register_ad_group(CampaignId::new("c1"), AdGroupId::new("ag2"));
        dir.record_ad_group_settings(AdGroupSpendSettings::initial(
            AdGroupId::new("ag2"),
            date(1),
            dt(1, 8),
        ))
        .unwrap();

        let ledger = ledger_with_budget(1000);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();

        let result = LandingModeController::new(GovernorConfig::default())
            .perform_landing_mode_check(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &campaign(),
                date(15),
                dt(15, 9),
                &sync,
                &notifier,
            );
        assert!(matches!(
            result,
            Err(GovernorError::StaleForcedEndDate { .. })
        ));
    }

    #[test]
    fn test_sweep_skips_failing_campaign_and_continues() {
        let mut dir = directory();
        // second campaign with no settings at all
        let broken = Campaign::new(CampaignId::new("c0"), "Broken", Currency::new("USD"));

        let ledger = ledger_with_budget(50);
        let sync = RecordingConfigSync::new();
        let notifier = RecordingNotifier::new();

        let report = LandingModeController::new(GovernorConfig::default())
            .switch_low_budget_campaigns_to_landing_mode(
                &mut dir,
                &ledger,
                &SpendCapPlanner::new(),
                &[broken, campaign()],
                dt(15, 9),
                &sync,
                &notifier,
            );

        assert_eq!(report.processed, 2);
        assert_eq!(report.changed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, CampaignId::new("c0"));
        assert!(dir.campaign_settings(&CampaignId::new("c1")).unwrap().landing_mode);
    }
}
