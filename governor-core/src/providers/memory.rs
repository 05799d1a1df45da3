//! In-Memory Collaborators
//!
//! Thread-safe in-memory implementations, used by tests and as service
//! defaults when no real collaborator is wired in.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{ConfigSyncSignal, ExchangeRateProvider, LandingEvent, LandingNotifier, SpendProvider};
use crate::error::{GovernorError, GovernorResult};
use crate::types::{AdGroupId, Currency, DailySpendStatement, SourceId};

/// Spend provider backed by a fixed statement list
#[derive(Debug, Default)]
pub struct MemorySpendProvider {
    statements: Vec<DailySpendStatement>,
}

impl MemorySpendProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(mut self, statement: DailySpendStatement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn record(&mut self, statement: DailySpendStatement) {
        self.statements.push(statement);
    }
}

impl SpendProvider for MemorySpendProvider {
    fn daily_spend(
        &self,
        pairs: &[(AdGroupId, SourceId)],
        date: NaiveDate,
    ) -> GovernorResult<Vec<DailySpendStatement>> {
        Ok(self
            .statements
            .iter()
            .filter(|s| {
                s.date == date
                    && pairs
                        .iter()
                        .any(|(ag, src)| ag == &s.ad_group_id && src == &s.source_id)
            })
            .cloned()
            .collect())
    }

    fn spend_history(
        &self,
        pairs: &[(AdGroupId, SourceId)],
        from: NaiveDate,
        to: NaiveDate,
    ) -> GovernorResult<Vec<DailySpendStatement>> {
        Ok(self
            .statements
            .iter()
            .filter(|s| {
                from <= s.date
                    && s.date <= to
                    && pairs
                        .iter()
                        .any(|(ag, src)| ag == &s.ad_group_id && src == &s.source_id)
            })
            .cloned()
            .collect())
    }
}

/// Spend provider that is always down; exercises the skip-and-retry path
#[derive(Debug, Default)]
pub struct UnavailableSpendProvider;

impl SpendProvider for UnavailableSpendProvider {
    fn daily_spend(
        &self,
        _pairs: &[(AdGroupId, SourceId)],
        _date: NaiveDate,
    ) -> GovernorResult<Vec<DailySpendStatement>> {
        Err(GovernorError::CollaboratorUnavailable {
            name: "analytics".to_string(),
            detail: "spend provider offline".to_string(),
        })
    }

    fn spend_history(
        &self,
        _pairs: &[(AdGroupId, SourceId)],
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> GovernorResult<Vec<DailySpendStatement>> {
        Err(GovernorError::CollaboratorUnavailable {
            name: "analytics".to_string(),
            detail: "spend provider offline".to_string(),
        })
    }
}

/// Exchange rates from a fixed table; unknown currencies either fall back
/// to the identity rate or are reported missing
#[derive(Debug, Default)]
pub struct FixedExchangeRates {
    rates: HashMap<String, Decimal>,
    strict: bool,
}

impl FixedExchangeRates {
    /// Every currency converts at rate 1
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: Currency, rate: Decimal) -> Self {
        self.rates.insert(currency.0, rate);
        self
    }

    /// Report unknown currencies instead of assuming rate 1
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

impl ExchangeRateProvider for FixedExchangeRates {
    fn rate(&self, date: NaiveDate, currency: &Currency) -> GovernorResult<Decimal> {
        match self.rates.get(currency.as_str()) {
            Some(rate) => Ok(*rate),
            None if self.strict => Err(GovernorError::ExchangeRateMissing {
                currency: currency.to_string(),
                date,
            }),
            None => Ok(Decimal::ONE),
        }
    }
}

/// Records config-sync signals for inspection
#[derive(Debug, Default)]
pub struct RecordingConfigSync {
    signals: Mutex<Vec<AdGroupId>>,
}

impl RecordingConfigSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signaled(&self) -> Vec<AdGroupId> {
        self.signals.lock().expect("signal lock").clone()
    }
}

impl ConfigSyncSignal for RecordingConfigSync {
    fn ad_group_settings_changed(&self, ad_group_id: &AdGroupId) {
        self.signals
            .lock()
            .expect("signal lock")
            .push(ad_group_id.clone());
    }
}

/// Records landing notifications for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LandingEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LandingEvent> {
        self.events.lock().expect("event lock").clone()
    }
}

impl LandingNotifier for RecordingNotifier {
    fn landing_mode_entered(&self, event: &LandingEvent) {
        self.events.lock().expect("event lock").push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_memory_spend_provider_filters() {
        let provider = MemorySpendProvider::new()
            .with_statement(DailySpendStatement::new(
                AdGroupId::new("ag1"),
                SourceId::new("s1"),
                date(14),
                Decimal::new(40, 0),
            ))
            .with_statement(DailySpendStatement::new(
                AdGroupId::new("ag2"),
                SourceId::new("s1"),
                date(14),
                Decimal::new(25, 0),
            ));

        let pairs = vec![(AdGroupId::new("ag1"), SourceId::new("s1"))];
        let spend = provider.daily_spend(&pairs, date(14)).unwrap();
        assert_eq!(spend.len(), 1);
        assert_eq!(spend[0].amount, Decimal::new(40, 0));

        // empty result for a day with no data
        assert!(provider.daily_spend(&pairs, date(13)).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_rates_identity_and_strict() {
        let identity = FixedExchangeRates::identity();
        assert_eq!(
            identity.rate(date(14), &Currency::new("EUR")).unwrap(),
            Decimal::ONE
        );

        let strict = FixedExchangeRates::identity().strict();
        assert!(matches!(
            strict.rate(date(14), &Currency::new("EUR")),
            Err(GovernorError::ExchangeRateMissing { .. })
        ));

        let table = FixedExchangeRates::identity()
            .with_rate(Currency::new("EUR"), Decimal::new(11, 1));
        assert_eq!(
            table.rate(date(14), &Currency::new("EUR")).unwrap(),
            Decimal::new(11, 1)
        );
    }

    #[test]
    fn test_recording_config_sync() {
        let sync = RecordingConfigSync::new();
        sync.ad_group_settings_changed(&AdGroupId::new("ag1"));
        sync.ad_group_settings_changed(&AdGroupId::new("ag2"));
        assert_eq!(
            sync.signaled(),
            vec![AdGroupId::new("ag1"), AdGroupId::new("ag2")]
        );
    }
}
