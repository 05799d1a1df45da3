//! External Collaborator Interfaces
//!
//! In the source system these are in-process calls; they are modeled as
//! synchronous trait boundaries. The config-sync and notification
//! collaborators are fire-and-forget, at-least-once side effects invoked
//! after a governor write transaction commits; their failures must never
//! roll back the settings write, so their methods return nothing and
//! implementations handle their own retries and logging.

pub mod memory;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::GovernorResult;
use crate::types::{AdGroupId, CampaignId, Currency, DailySpendStatement, SourceId};

pub use memory::{
    FixedExchangeRates, MemorySpendProvider, RecordingConfigSync, RecordingNotifier,
    UnavailableSpendProvider,
};

/// Historical realized net spend, fee and margin already applied
///
/// May return an empty result for dates with no data; a legitimate
/// zero-spend day is not an error.
pub trait SpendProvider: Send + Sync {
    /// Spend for each pair on a single date
    fn daily_spend(
        &self,
        pairs: &[(AdGroupId, SourceId)],
        date: NaiveDate,
    ) -> GovernorResult<Vec<DailySpendStatement>>;

    /// Spend for each pair over an inclusive date range
    fn spend_history(
        &self,
        pairs: &[(AdGroupId, SourceId)],
        from: NaiveDate,
        to: NaiveDate,
    ) -> GovernorResult<Vec<DailySpendStatement>>;
}

/// Multiplicative rate from the given currency into the campaign-local
/// currency; a pure function of (date, currency)
pub trait ExchangeRateProvider: Send + Sync {
    fn rate(&self, date: NaiveDate, currency: &Currency) -> GovernorResult<Decimal>;
}

/// Downstream configuration sync, signaled once per mutated ad group after
/// a governor transaction commits
pub trait ConfigSyncSignal: Send + Sync {
    fn ad_group_settings_changed(&self, ad_group_id: &AdGroupId);
}

/// Summary of a landing-mode entry, rendered into the notification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandingEvent {
    pub campaign_id: CampaignId,
    pub date: NaiveDate,
    pub remaining_today: Decimal,
    pub available_tomorrow: Decimal,
    pub max_daily_budget: Decimal,
    pub user_daily_budget: Decimal,
    /// Ad groups that received a forced end date
    pub stopped_ad_groups: Vec<AdGroupId>,
}

/// Outbound notification about governor decisions
pub trait LandingNotifier: Send + Sync {
    fn landing_mode_entered(&self, event: &LandingEvent);
}
