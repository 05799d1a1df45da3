//! Service Builder
//!
//! Composes a governor with its collaborators. Collaborators default to
//! the in-memory implementations so a service can be assembled in tests
//! and development without external wiring.

use std::sync::Arc;

use tokio::sync::RwLock;

use governor_core::providers::{
    FixedExchangeRates, MemorySpendProvider, RecordingConfigSync, RecordingNotifier,
};
use governor_core::{
    ConfigSyncSignal, ExchangeRateProvider, Governor, GovernorConfig, LandingNotifier,
    SpendProvider,
};

use crate::config::ServiceConfig;
use crate::runner::{BackgroundRunner, RunnerHandle};

/// Builder for [`GovernorService`]
pub struct GovernorServiceBuilder {
    service_config: ServiceConfig,
    governor_config: GovernorConfig,
    rates: Option<Arc<dyn ExchangeRateProvider>>,
    spend_provider: Option<Arc<dyn SpendProvider>>,
    config_sync: Option<Arc<dyn ConfigSyncSignal>>,
    notifier: Option<Arc<dyn LandingNotifier>>,
}

impl GovernorServiceBuilder {
    pub fn new() -> Self {
        Self {
            service_config: ServiceConfig::default(),
            governor_config: GovernorConfig::default(),
            rates: None,
            spend_provider: None,
            config_sync: None,
            notifier: None,
        }
    }

    pub fn with_service_config(mut self, config: ServiceConfig) -> Self {
        self.service_config = config;
        self
    }

    pub fn with_governor_config(mut self, config: GovernorConfig) -> Self {
        self.governor_config = config;
        self
    }

    pub fn with_exchange_rates(mut self, rates: Arc<dyn ExchangeRateProvider>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn with_spend_provider(mut self, provider: Arc<dyn SpendProvider>) -> Self {
        self.spend_provider = Some(provider);
        self
    }

    pub fn with_config_sync(mut self, sync: Arc<dyn ConfigSyncSignal>) -> Self {
        self.config_sync = Some(sync);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LandingNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> GovernorService {
        let governor = Governor::new(
            self.governor_config,
            self.rates
                .unwrap_or_else(|| Arc::new(FixedExchangeRates::identity())),
            self.spend_provider
                .unwrap_or_else(|| Arc::new(MemorySpendProvider::new())),
            self.config_sync
                .unwrap_or_else(|| Arc::new(RecordingConfigSync::new())),
            self.notifier
                .unwrap_or_else(|| Arc::new(RecordingNotifier::new())),
        );
        GovernorService {
            governor: Arc::new(RwLock::new(governor)),
            config: self.service_config,
        }
    }
}

impl Default for GovernorServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An assembled governor plus its sweep scheduling
pub struct GovernorService {
    governor: Arc<RwLock<Governor>>,
    config: ServiceConfig,
}

impl GovernorService {
    pub fn builder() -> GovernorServiceBuilder {
        GovernorServiceBuilder::new()
    }

    /// Shared handle to the governor, for registration and edit queries
    pub fn governor(&self) -> Arc<RwLock<Governor>> {
        self.governor.clone()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Start the background sweeps
    pub async fn start(&self) -> RunnerHandle {
        BackgroundRunner::new(self.governor.clone(), self.config.clone())
            .start()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use governor_core::{Campaign, CampaignId, CampaignSpendSettings, Currency};

    #[tokio::test]
    async fn test_build_and_register() {
        let service = GovernorService::builder()
            .with_service_config(ServiceConfig::development())
            .build();

        let governor = service.governor();
        let campaign_id = CampaignId::new("c1");
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        governor
            .write()
            .await
            .register_campaign(
                Campaign::new(campaign_id.clone(), "Spring push", Currency::new("USD")),
                CampaignSpendSettings::initial(campaign_id.clone(), true, created),
            )
            .unwrap();

        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_utc();
        let report = governor
            .write()
            .await
            .switch_low_budget_campaigns_to_landing_mode(now);
        assert_eq!(report.processed, 1);
    }

    #[tokio::test]
    async fn test_runner_start_and_stop() {
        let service = GovernorService::builder()
            .with_service_config(ServiceConfig::development())
            .build();

        let handle = service.start().await;
        assert!(handle.is_running().await);
        handle.stop().await;
    }
}
