//! Governor Facade
//!
//! Wires the directory, ledger, planner, controller and guard together and
//! exposes the scheduled sweeps and edit-bound queries against registered
//! campaigns. Campaigns are processed sequentially and independently; no
//! ordering between them is assumed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::GovernorConfig;
use crate::directory::SettingsDirectory;
use crate::error::{GovernorError, GovernorResult};
use crate::guard::EditGuard;
use crate::landing::{LandingCheckOutcome, LandingModeController, SweepReport};
use crate::ledger::BudgetLedger;
use crate::planner::SpendCapPlanner;
use crate::providers::{
    ConfigSyncSignal, ExchangeRateProvider, LandingNotifier, SpendProvider,
};
use crate::types::{
    AdGroupId, BudgetItemId, Campaign, CampaignId, CampaignSpendSettings, SourceId,
};

/// The budget governor for one deployment
pub struct Governor {
    config: GovernorConfig,
    directory: SettingsDirectory,
    ledger: BudgetLedger,
    planner: SpendCapPlanner,
    controller: LandingModeController,
    guard: EditGuard,
    campaigns: BTreeMap<CampaignId, Campaign>,
    spend_provider: Arc<dyn SpendProvider>,
    config_sync: Arc<dyn ConfigSyncSignal>,
    notifier: Arc<dyn LandingNotifier>,
}

impl Governor {
    pub fn new(
        config: GovernorConfig,
        rates: Arc<dyn ExchangeRateProvider>,
        spend_provider: Arc<dyn SpendProvider>,
        config_sync: Arc<dyn ConfigSyncSignal>,
        notifier: Arc<dyn LandingNotifier>,
    ) -> Self {
        let controller = LandingModeController::new(config.clone());
        let guard = EditGuard::new(config.cutover);
        Self {
            config,
            directory: SettingsDirectory::new(),
            ledger: BudgetLedger::new(rates),
            planner: SpendCapPlanner::new(),
            controller,
            guard,
            campaigns: BTreeMap::new(),
            spend_provider,
            config_sync,
            notifier,
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn directory(&self) -> &SettingsDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut SettingsDirectory {
        &mut self.directory
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut BudgetLedger {
        &mut self.ledger
    }

    pub fn campaign(&self, campaign_id: &CampaignId) -> Option<&Campaign> {
        self.campaigns.get(campaign_id)
    }

    /// Register a campaign together with its initial spend settings
    pub fn register_campaign(
        &mut self,
        campaign: Campaign,
        settings: CampaignSpendSettings,
    ) -> GovernorResult<()> {
        self.directory.record_campaign_settings(settings)?;
        self.campaigns.insert(campaign.id.clone(), campaign);
        Ok(())
    }

    fn known_campaign(&self, campaign_id: &CampaignId) -> GovernorResult<&Campaign> {
        self.campaigns
            .get(campaign_id)
            .ok_or_else(|| GovernorError::CampaignSettingsMissing {
                campaign_id: campaign_id.to_string(),
            })
    }

    /// Decide landing entry for one campaign
    pub fn perform_landing_mode_check(
        &mut self,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> GovernorResult<LandingCheckOutcome> {
        let campaign = self.known_campaign(campaign_id)?.clone();
        let today = campaign.local_today(now);
        self.controller.perform_landing_mode_check(
            &mut self.directory,
            &self.ledger,
            &self.planner,
            &campaign,
            today,
            now,
            self.config_sync.as_ref(),
            self.notifier.as_ref(),
        )
    }

    /// Scheduled sweep: landing entry for all registered campaigns
    pub fn switch_low_budget_campaigns_to_landing_mode(
        &mut self,
        now: DateTime<Utc>,
    ) -> SweepReport {
        let campaigns: Vec<Campaign> = self.campaigns.values().cloned().collect();
        self.controller.switch_low_budget_campaigns_to_landing_mode(
            &mut self.directory,
            &self.ledger,
            &self.planner,
            &campaigns,
            now,
            self.config_sync.as_ref(),
            self.notifier.as_ref(),
        )
    }

    /// Scheduled sweep: daily update for all campaigns currently landing
    pub fn update_campaigns_in_landing(&mut self, now: DateTime<Utc>) -> SweepReport {
        let campaigns: Vec<Campaign> = self.campaigns.values().cloned().collect();
        self.controller.update_campaigns_in_landing(
            &mut self.directory,
            &self.ledger,
            &self.planner,
            &campaigns,
            now,
            self.spend_provider.as_ref(),
            self.config_sync.as_ref(),
        )
    }

    pub fn max_settable_source_daily_budget(
        &self,
        campaign_id: &CampaignId,
        ad_group_id: &AdGroupId,
        source_id: &SourceId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let campaign = self.known_campaign(campaign_id)?;
        self.guard.max_settable_source_daily_budget(
            &self.directory,
            &self.ledger,
            &self.planner,
            campaign,
            ad_group_id,
            source_id,
            now,
        )
    }

    pub fn max_settable_source_group_daily_budget(
        &self,
        campaign_id: &CampaignId,
        ad_group_id: &AdGroupId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let campaign = self.known_campaign(campaign_id)?;
        self.guard.max_settable_source_group_daily_budget(
            &self.directory,
            &self.ledger,
            &self.planner,
            campaign,
            ad_group_id,
            now,
        )
    }

    pub fn max_settable_autopilot_daily_budget(
        &self,
        campaign_id: &CampaignId,
        ad_group_id: &AdGroupId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let campaign = self.known_campaign(campaign_id)?;
        self.guard.max_settable_autopilot_daily_budget(
            &self.directory,
            &self.ledger,
            &self.planner,
            campaign,
            ad_group_id,
            now,
        )
    }

    pub fn min_budget_increase(
        &self,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Decimal> {
        let campaign = self.known_campaign(campaign_id)?;
        self.guard
            .min_budget_increase(&self.directory, &self.ledger, &self.planner, campaign, now)
    }

    pub fn minimum_budget_amount(
        &self,
        campaign_id: &CampaignId,
        item_id: &BudgetItemId,
        now: DateTime<Utc>,
    ) -> GovernorResult<Option<Decimal>> {
        let campaign = self.known_campaign(campaign_id)?;
        self.guard.minimum_budget_amount(
            &self.directory,
            &self.ledger,
            &self.planner,
            campaign,
            item_id,
            now,
        )
    }

    pub fn is_current_time_valid_for_amount_editing(
        &self,
        campaign_id: &CampaignId,
        now: DateTime<Utc>,
    ) -> GovernorResult<bool> {
        let campaign = self.known_campaign(campaign_id)?;
        Ok(self
            .guard
            .is_current_time_valid_for_amount_editing(campaign, now))
    }
}
