//! Governor Configuration
//!
//! The reconciliation cutover and the reallocation thresholds are injected
//! configuration, not literals scattered through callers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{GovernorError, GovernorResult};

/// The fixed time of day after which the current day's spend plan is
/// treated as finalized.
///
/// Before the cutover the daily reconciliation job is presumed not yet to
/// have run, so edit bounds are generous; after it they are conservative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationCutover {
    /// Hour of day, UTC
    pub utc_hour: u32,
}

impl ReconciliationCutover {
    /// Create a cutover at the given UTC hour
    pub fn new(utc_hour: u32) -> GovernorResult<Self> {
        if utc_hour >= 24 {
            return Err(GovernorError::InvalidConfiguration {
                reason: format!("cutover hour {utc_hour} out of range"),
            });
        }
        Ok(Self { utc_hour })
    }

    /// The cutover instant on a given day
    pub fn instant_on(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_hms_opt(self.utc_hour, 0, 0)
            .expect("validated hour")
            .and_utc()
    }

    /// Whether the cutover for the caller's current day has passed
    pub fn has_run_by(&self, now: DateTime<Utc>) -> bool {
        now >= self.instant_on(now.date_naive())
    }
}

impl Default for ReconciliationCutover {
    fn default() -> Self {
        Self { utc_hour: 12 }
    }
}

/// Governor tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Daily reconciliation cutover
    pub cutover: ReconciliationCutover,
    /// A source whose yesterday spend is below this fraction of its current
    /// cap is classified as non-spending during landing reallocation
    pub non_spending_spend_ratio: Decimal,
    /// An ad group whose reallocated daily cap falls below this amount is
    /// deactivated instead of left with an unusable cap
    pub min_ad_group_daily_cap: Decimal,
    /// Days of spend history consulted by the landing update sweep
    pub landing_history_days: i64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            cutover: ReconciliationCutover::default(),
            non_spending_spend_ratio: Decimal::new(5, 2), // 0.05
            min_ad_group_daily_cap: Decimal::new(5, 0),
            landing_history_days: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutover_rejects_invalid_hour() {
        assert!(ReconciliationCutover::new(24).is_err());
        assert!(ReconciliationCutover::new(12).is_ok());
    }

    #[test]
    fn test_cutover_has_run_by() {
        let cutover = ReconciliationCutover::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let before = date.and_hms_opt(11, 10, 0).unwrap().and_utc();
        let after = date.and_hms_opt(12, 10, 0).unwrap().and_utc();

        assert!(!cutover.has_run_by(before));
        assert!(cutover.has_run_by(after));
    }

    #[test]
    fn test_config_defaults() {
        let config = GovernorConfig::default();
        assert_eq!(config.cutover.utc_hour, 12);
        assert_eq!(config.non_spending_spend_ratio, Decimal::new(5, 2));
        assert_eq!(config.landing_history_days, 7);
    }
}
