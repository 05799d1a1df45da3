//! Settings Directory
//!
//! Owns the append-only revision logs for every campaign, ad group and
//! source, plus the campaign → ad group → source registry. All settings
//! writes triggered by a single governor decision arrive here as one
//! `SettingsTransaction` and are validated before the first append, so a
//! reader never observes a campaign marked landing while an ad group it
//! owns still shows the pre-landing state. Processing is single-threaded
//! per campaign; that, plus the validate-then-append batch, is the entire
//! atomicity story.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{GovernorError, GovernorResult};
use crate::revision::{RevisionLog, SettingsRevisioned};
use crate::types::{
    AdGroupId, AdGroupSourceSpendSettings, AdGroupSpendSettings, CampaignId,
    CampaignSpendSettings, SourceId,
};

impl SettingsRevisioned for CampaignSpendSettings {
    fn entity_label(&self) -> String {
        format!("campaign:{}", self.campaign_id)
    }

    fn created_dt(&self) -> DateTime<Utc> {
        self.created_dt
    }
}

impl SettingsRevisioned for AdGroupSpendSettings {
    fn entity_label(&self) -> String {
        format!("ad_group:{}", self.ad_group_id)
    }

    fn created_dt(&self) -> DateTime<Utc> {
        self.created_dt
    }
}

impl SettingsRevisioned for AdGroupSourceSpendSettings {
    fn entity_label(&self) -> String {
        format!("ad_group:{}:source:{}", self.ad_group_id, self.source_id)
    }

    fn created_dt(&self) -> DateTime<Utc> {
        self.created_dt
    }
}

/// All settings revisions authored by one governor decision
#[derive(Clone, Debug)]
pub struct SettingsTransaction {
    pub transaction_id: String,
    pub campaign: Option<CampaignSpendSettings>,
    pub ad_groups: Vec<AdGroupSpendSettings>,
    pub sources: Vec<AdGroupSourceSpendSettings>,
}

impl SettingsTransaction {
    pub fn new() -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            campaign: None,
            ad_groups: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn with_campaign(mut self, revision: CampaignSpendSettings) -> Self {
        self.campaign = Some(revision);
        self
    }

    pub fn push_ad_group(&mut self, revision: AdGroupSpendSettings) {
        self.ad_groups.push(revision);
    }

    pub fn push_source(&mut self, revision: AdGroupSourceSpendSettings) {
        self.sources.push(revision);
    }

    pub fn is_empty(&self) -> bool {
        self.campaign.is_none() && self.ad_groups.is_empty() && self.sources.is_empty()
    }

    /// Ad groups touched by this transaction, directly or through a source
    /// revision, ascending and deduplicated
    pub fn mutated_ad_groups(&self) -> Vec<AdGroupId> {
        let mut ids: BTreeSet<AdGroupId> = BTreeSet::new();
        for revision in &self.ad_groups {
            ids.insert(revision.ad_group_id.clone());
        }
        for revision in &self.sources {
            ids.insert(revision.ad_group_id.clone());
        }
        ids.into_iter().collect()
    }
}

/// Revision logs and entity registry for one deployment
#[derive(Clone, Debug, Default)]
pub struct SettingsDirectory {
    campaigns: HashMap<CampaignId, RevisionLog<CampaignSpendSettings>>,
    ad_groups: HashMap<AdGroupId, RevisionLog<AdGroupSpendSettings>>,
    sources: HashMap<(AdGroupId, SourceId), RevisionLog<AdGroupSourceSpendSettings>>,
    campaign_ad_groups: HashMap<CampaignId, BTreeSet<AdGroupId>>,
    ad_group_campaign: HashMap<AdGroupId, CampaignId>,
    ad_group_sources: HashMap<AdGroupId, BTreeSet<SourceId>>,
}

impl SettingsDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate an ad group with its campaign; required before any of its
    /// settings can be recorded
    pub fn register_ad_group(&mut self, campaign_id: CampaignId, ad_group_id: AdGroupId) {
        self.campaign_ad_groups
            .entry(campaign_id.clone())
            .or_default()
            .insert(ad_group_id.clone());
        self.ad_group_campaign.insert(ad_group_id, campaign_id);
    }

    pub fn record_campaign_settings(
        &mut self,
        revision: CampaignSpendSettings,
    ) -> GovernorResult<()> {
        self.campaigns
            .entry(revision.campaign_id.clone())
            .or_default()
            .append(revision)
    }

    pub fn record_ad_group_settings(
        &mut self,
        revision: AdGroupSpendSettings,
    ) -> GovernorResult<()> {
        if !self.ad_group_campaign.contains_key(&revision.ad_group_id) {
            return Err(GovernorError::AdGroupNotRegistered {
                ad_group_id: revision.ad_group_id.to_string(),
            });
        }
        self.ad_groups
            .entry(revision.ad_group_id.clone())
            .or_default()
            .append(revision)
    }

    pub fn record_source_settings(
        &mut self,
        revision: AdGroupSourceSpendSettings,
    ) -> GovernorResult<()> {
        if !self.ad_group_campaign.contains_key(&revision.ad_group_id) {
            return Err(GovernorError::AdGroupNotRegistered {
                ad_group_id: revision.ad_group_id.to_string(),
            });
        }
        self.ad_group_sources
            .entry(revision.ad_group_id.clone())
            .or_default()
            .insert(revision.source_id.clone());
        self.sources
            .entry((revision.ad_group_id.clone(), revision.source_id.clone()))
            .or_default()
            .append(revision)
    }

    /// Current campaign settings
    pub fn campaign_settings(&self, campaign_id: &CampaignId) -> Option<&CampaignSpendSettings> {
        self.campaigns.get(campaign_id).and_then(|log| log.current())
    }

    /// Current ad group settings
    pub fn ad_group_settings(&self, ad_group_id: &AdGroupId) -> Option<&AdGroupSpendSettings> {
        self.ad_groups.get(ad_group_id).and_then(|log| log.current())
    }

    /// Current source settings
    pub fn source_settings(
        &self,
        ad_group_id: &AdGroupId,
        source_id: &SourceId,
    ) -> Option<&AdGroupSourceSpendSettings> {
        self.sources
            .get(&(ad_group_id.clone(), source_id.clone()))
            .and_then(|log| log.current())
    }

    pub fn campaign_log(
        &self,
        campaign_id: &CampaignId,
    ) -> Option<&RevisionLog<CampaignSpendSettings>> {
        self.campaigns.get(campaign_id)
    }

    pub fn ad_group_log(
        &self,
        ad_group_id: &AdGroupId,
    ) -> Option<&RevisionLog<AdGroupSpendSettings>> {
        self.ad_groups.get(ad_group_id)
    }

    pub fn source_log(
        &self,
        ad_group_id: &AdGroupId,
        source_id: &SourceId,
    ) -> Option<&RevisionLog<AdGroupSourceSpendSettings>> {
        self.sources.get(&(ad_group_id.clone(), source_id.clone()))
    }

    /// Ad groups of a campaign, ascending by id
    pub fn ad_groups_of(&self, campaign_id: &CampaignId) -> Vec<AdGroupId> {
        self.campaign_ad_groups
            .get(campaign_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sources of an ad group, ascending by id
    pub fn sources_of(&self, ad_group_id: &AdGroupId) -> Vec<SourceId> {
        self.ad_group_sources
            .get(ad_group_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn campaign_of(&self, ad_group_id: &AdGroupId) -> Option<&CampaignId> {
        self.ad_group_campaign.get(ad_group_id)
    }

    /// All (ad group, source) pairs of a campaign, ascending
    pub fn source_pairs_of(&self, campaign_id: &CampaignId) -> Vec<(AdGroupId, SourceId)> {
        let mut pairs = Vec::new();
        for ad_group_id in self.ad_groups_of(campaign_id) {
            for source_id in self.sources_of(&ad_group_id) {
                pairs.push((ad_group_id.clone(), source_id));
            }
        }
        pairs
    }

    /// Apply a whole transaction: every append is validated before the
    /// first one is committed, so a failed transaction leaves no partial
    /// state behind. Returns the mutated ad groups for config-sync
    /// signaling.
    pub fn apply(&mut self, transaction: SettingsTransaction) -> GovernorResult<Vec<AdGroupId>> {
        if let Some(revision) = &transaction.campaign {
            self.check_ordering(
                self.campaigns.get(&revision.campaign_id),
                revision.entity_label(),
                revision.created_dt,
            )?;
        }
        for revision in &transaction.ad_groups {
            if !self.ad_group_campaign.contains_key(&revision.ad_group_id) {
                return Err(GovernorError::AdGroupNotRegistered {
                    ad_group_id: revision.ad_group_id.to_string(),
                });
            }
            self.check_ordering(
                self.ad_groups.get(&revision.ad_group_id),
                revision.entity_label(),
                revision.created_dt,
            )?;
        }
        for revision in &transaction.sources {
            if !self.ad_group_campaign.contains_key(&revision.ad_group_id) {
                return Err(GovernorError::AdGroupNotRegistered {
                    ad_group_id: revision.ad_group_id.to_string(),
                });
            }
            self.check_ordering(
                self.sources
                    .get(&(revision.ad_group_id.clone(), revision.source_id.clone())),
                revision.entity_label(),
                revision.created_dt,
            )?;
        }

        let mutated = transaction.mutated_ad_groups();

        if let Some(revision) = transaction.campaign {
            self.record_campaign_settings(revision)?;
        }
        for revision in transaction.ad_groups {
            self.record_ad_group_settings(revision)?;
        }
        for revision in transaction.sources {
            self.record_source_settings(revision)?;
        }

        Ok(mutated)
    }

    fn check_ordering<T: SettingsRevisioned>(
        &self,
        log: Option<&RevisionLog<T>>,
        entity: String,
        attempted: DateTime<Utc>,
    ) -> GovernorResult<()> {
        if let Some(last) = log.and_then(|l| l.last_created_dt()) {
            if attempted < last {
                return Err(GovernorError::RevisionOutOfOrder {
                    entity,
                    last,
                    attempted,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityState, SystemUser};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

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

    fn directory() -> SettingsDirectory {
        let mut dir = SettingsDirectory::new();
        let campaign_id = CampaignId::new("c1");
        dir.record_campaign_settings(CampaignSpendSettings::initial(
            campaign_id.clone(),
            true,
            dt(1, 8),
        ))
        .unwrap();
        dir.register_ad_group(campaign_id, AdGroupId::new("ag1"));
        dir.record_ad_group_settings(AdGroupSpendSettings::initial(
            AdGroupId::new("ag1"),
            date(1),
            dt(1, 8),
        ))
        .unwrap();
        dir.record_source_settings(AdGroupSourceSpendSettings::initial(
            AdGroupId::new("ag1"),
            SourceId::new("s1"),
            Decimal::new(50, 0),
            dt(1, 8),
        ))
        .unwrap();
        dir
    }

    #[test]
    fn test_record_and_lookup() {
        let dir = directory();
        assert!(dir.campaign_settings(&CampaignId::new("c1")).is_some());
        assert!(dir.ad_group_settings(&AdGroupId::new("ag1")).is_some());
        assert_eq!(
            dir.source_settings(&AdGroupId::new("ag1"), &SourceId::new("s1"))
                .unwrap()
                .daily_budget,
            Decimal::new(50, 0)
        );
        assert_eq!(
            dir.source_pairs_of(&CampaignId::new("c1")),
            vec![(AdGroupId::new("ag1"), SourceId::new("s1"))]
        );
    }

    #[test]
    fn test_unregistered_ad_group_rejected() {
        let mut dir = SettingsDirectory::new();
        let result = dir.record_ad_group_settings(AdGroupSpendSettings::initial(
            AdGroupId::new("ghost"),
            date(1),
            dt(1, 8),
        ));
        assert!(matches!(
            result,
            Err(GovernorError::AdGroupNotRegistered { .. })
        ));
    }

    #[test]
    fn test_apply_transaction_atomic() {
        let mut dir = directory();

        let campaign_rev = dir
            .campaign_settings(&CampaignId::new("c1"))
            .unwrap()
            .next(dt(2, 9))
            .with_landing_mode(true)
            .with_system_user(SystemUser::CampaignStop);
        let ad_group_rev = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(2, 9))
            .with_landing_mode(true)
            .with_end_date(Some(date(2)));

        let mut txn = SettingsTransaction::new().with_campaign(campaign_rev);
        txn.push_ad_group(ad_group_rev);

        let mutated = dir.apply(txn).unwrap();
        assert_eq!(mutated, vec![AdGroupId::new("ag1")]);
        assert!(dir.campaign_settings(&CampaignId::new("c1")).unwrap().landing_mode);
        assert!(dir.ad_group_settings(&AdGroupId::new("ag1")).unwrap().landing_mode);
    }

    #[test]
    fn test_apply_rejects_whole_transaction_on_bad_revision() {
        let mut dir = directory();

        // an out-of-order ad group revision must prevent the campaign
        // revision from landing too
        let campaign_rev = dir
            .campaign_settings(&CampaignId::new("c1"))
            .unwrap()
            .next(dt(2, 9))
            .with_landing_mode(true);
        let stale_ad_group_rev = dir
            .ad_group_settings(&AdGroupId::new("ag1"))
            .unwrap()
            .next(dt(1, 7))
            .with_state(EntityState::Inactive);

        let mut txn = SettingsTransaction::new().with_campaign(campaign_rev);
        txn.push_ad_group(stale_ad_group_rev);

        assert!(dir.apply(txn).is_err());
        assert!(!dir.campaign_settings(&CampaignId::new("c1")).unwrap().landing_mode);
        assert_eq!(
            dir.ad_group_settings(&AdGroupId::new("ag1")).unwrap().state,
            EntityState::Active
        );
    }
}
