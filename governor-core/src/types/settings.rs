//! Append-Only Spend Settings
//!
//! Settings are never mutated: every change is a new revision and "current"
//! is always the most recent committed revision. The governor exclusively
//! owns the `landing_mode`, forced `end_date` and cap/state fields; all
//! other fields are owned by the editing surface and only read here.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{AdGroupId, CampaignId, EntityState, SourceId, SystemUser};

/// Campaign-level spend settings revision
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpendSettings {
    pub campaign_id: CampaignId,
    /// Whether the governor is allowed to act on this campaign at all
    pub automatic_stop_enabled: bool,
    pub landing_mode: bool,
    /// Set when the governor itself authored the revision
    pub system_user: Option<SystemUser>,
    pub created_dt: DateTime<Utc>,
}

impl CampaignSpendSettings {
    pub fn initial(
        campaign_id: CampaignId,
        automatic_stop_enabled: bool,
        created_dt: DateTime<Utc>,
    ) -> Self {
        Self {
            campaign_id,
            automatic_stop_enabled,
            landing_mode: false,
            system_user: None,
            created_dt,
        }
    }

    /// Copy-on-write successor revision; the system user tag is not inherited
    pub fn next(&self, created_dt: DateTime<Utc>) -> Self {
        Self {
            system_user: None,
            created_dt,
            ..self.clone()
        }
    }

    pub fn with_landing_mode(mut self, landing_mode: bool) -> Self {
        self.landing_mode = landing_mode;
        self
    }

    pub fn with_system_user(mut self, user: SystemUser) -> Self {
        self.system_user = Some(user);
        self
    }
}

/// Ad-group-level spend settings revision
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdGroupSpendSettings {
    pub ad_group_id: AdGroupId,
    pub state: EntityState,
    pub start_date: NaiveDate,
    /// None means no forced stop
    pub end_date: Option<NaiveDate>,
    /// Ad-group daily cap, set by the reallocator during landing
    pub daily_budget: Option<Decimal>,
    /// Cap for the grouped "all sources" bucket; presence means the ad
    /// group's sources are managed as one bucket
    pub grouped_daily_budget: Option<Decimal>,
    pub grouped_state: Option<EntityState>,
    /// Cap the autopilot is allowed to spend, bounded by the edit guard
    pub autopilot_daily_budget: Option<Decimal>,
    pub landing_mode: bool,
    pub system_user: Option<SystemUser>,
    pub created_dt: DateTime<Utc>,
}

impl AdGroupSpendSettings {
    pub fn initial(
        ad_group_id: AdGroupId,
        start_date: NaiveDate,
        created_dt: DateTime<Utc>,
    ) -> Self {
        Self {
            ad_group_id,
            state: EntityState::Active,
            start_date,
            end_date: None,
            daily_budget: None,
            grouped_daily_budget: None,
            grouped_state: None,
            autopilot_daily_budget: None,
            landing_mode: false,
            system_user: None,
            created_dt,
        }
    }

    /// Copy-on-write successor revision; the system user tag is not inherited
    pub fn next(&self, created_dt: DateTime<Utc>) -> Self {
        Self {
            system_user: None,
            created_dt,
            ..self.clone()
        }
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    pub fn with_end_date(mut self, end_date: Option<NaiveDate>) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_daily_budget(mut self, daily_budget: Option<Decimal>) -> Self {
        self.daily_budget = daily_budget;
        self
    }

    pub fn with_grouped_bucket(mut self, daily_budget: Decimal, state: EntityState) -> Self {
        self.grouped_daily_budget = Some(daily_budget);
        self.grouped_state = Some(state);
        self
    }

    pub fn with_autopilot_daily_budget(mut self, cap: Decimal) -> Self {
        self.autopilot_daily_budget = Some(cap);
        self
    }

    pub fn with_landing_mode(mut self, landing_mode: bool) -> Self {
        self.landing_mode = landing_mode;
        self
    }

    pub fn with_system_user(mut self, user: SystemUser) -> Self {
        self.system_user = Some(user);
        self
    }

    /// Whether sources are managed as one grouped bucket
    pub fn sources_grouped(&self) -> bool {
        self.grouped_daily_budget.is_some()
    }

    /// ACTIVE and the date lies within `[start_date, end_date]`
    /// (no end date means unbounded)
    pub fn is_running_on(&self, date: NaiveDate) -> bool {
        self.state.is_active()
            && self.start_date <= date
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// Per-source spend settings revision, one per source per ad group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdGroupSourceSpendSettings {
    pub ad_group_id: AdGroupId,
    pub source_id: SourceId,
    pub state: EntityState,
    pub daily_budget: Decimal,
    /// Cap on the bid price an operator may set for this source
    pub bid_price_cap: Option<Decimal>,
    pub landing_mode: bool,
    pub system_user: Option<SystemUser>,
    pub created_dt: DateTime<Utc>,
}

impl AdGroupSourceSpendSettings {
    pub fn initial(
        ad_group_id: AdGroupId,
        source_id: SourceId,
        daily_budget: Decimal,
        created_dt: DateTime<Utc>,
    ) -> Self {
        Self {
            ad_group_id,
            source_id,
            state: EntityState::Active,
            daily_budget,
            bid_price_cap: None,
            landing_mode: false,
            system_user: None,
            created_dt,
        }
    }

    /// Copy-on-write successor revision; the system user tag is not inherited
    pub fn next(&self, created_dt: DateTime<Utc>) -> Self {
        Self {
            system_user: None,
            created_dt,
            ..self.clone()
        }
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    pub fn with_daily_budget(mut self, daily_budget: Decimal) -> Self {
        self.daily_budget = daily_budget;
        self
    }

    pub fn with_landing_mode(mut self, landing_mode: bool) -> Self {
        self.landing_mode = landing_mode;
        self
    }

    pub fn with_system_user(mut self, user: SystemUser) -> Self {
        self.system_user = Some(user);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_next_clears_system_user() {
        let first = CampaignSpendSettings::initial(CampaignId::new("c1"), true, dt(8))
            .with_landing_mode(true)
            .with_system_user(SystemUser::CampaignStop);

        let second = first.next(dt(9));
        assert!(second.landing_mode);
        assert_eq!(second.system_user, None);
        assert_eq!(second.created_dt, dt(9));
    }

    #[test]
    fn test_ad_group_running_window() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let settings = AdGroupSpendSettings::initial(AdGroupId::new("ag1"), date, dt(8));

        assert!(settings.is_running_on(date));
        assert!(settings.is_running_on(date + chrono::Duration::days(100)));
        assert!(!settings.is_running_on(date - chrono::Duration::days(1)));

        let bounded = settings.clone().with_end_date(Some(date));
        assert!(bounded.is_running_on(date));
        assert!(!bounded.is_running_on(date + chrono::Duration::days(1)));

        let inactive = settings.with_state(EntityState::Inactive);
        assert!(!inactive.is_running_on(date));
    }

    #[test]
    fn test_sources_grouped() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let settings = AdGroupSpendSettings::initial(AdGroupId::new("ag1"), date, dt(8));
        assert!(!settings.sources_grouped());

        let grouped =
            settings.with_grouped_bucket(Decimal::new(100, 0), EntityState::Active);
        assert!(grouped.sources_grouped());
    }
}
