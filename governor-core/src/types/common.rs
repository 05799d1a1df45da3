//! Basic Types
//!
//! Naming conventions:
//! - `_id` suffix: Primary key identifiers
//! - `_dt` suffix: Revision timestamps
//! - `_date` suffix: Inclusive calendar dates in the campaign-local timezone

use serde::{Deserialize, Serialize};

// ============================================================
// ID Types (newtype pattern, non-interchangeable)
// ============================================================

/// Campaign ID
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

impl CampaignId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ad group ID
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdGroupId(pub String);

impl AdGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AdGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media source ID
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Budget line item ID
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BudgetItemId(pub String);

impl BudgetItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BudgetItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credit ID
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreditId(pub String);

impl CreditId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CreditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================
// Core Enums
// ============================================================

/// Entity activation state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    Active,
    Inactive,
}

impl EntityState {
    pub fn is_active(&self) -> bool {
        matches!(self, EntityState::Active)
    }
}

impl Default for EntityState {
    fn default() -> Self {
        Self::Active
    }
}

/// Tag recorded on settings revisions authored by the governor itself,
/// distinguishing automated writes from human edits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemUser {
    /// The automatic campaign stop governor
    CampaignStop,
}

impl SystemUser {
    pub fn name(&self) -> &'static str {
        match self {
            SystemUser::CampaignStop => "campaign_stop",
        }
    }
}

impl std::fmt::Display for SystemUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// ISO currency code
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = CampaignId::new("campaign:1");
        assert_eq!(id.as_str(), "campaign:1");
        assert_eq!(format!("{id}"), "campaign:1");
    }

    #[test]
    fn test_entity_state() {
        assert!(EntityState::Active.is_active());
        assert!(!EntityState::Inactive.is_active());
        assert_eq!(EntityState::default(), EntityState::Active);
    }

    #[test]
    fn test_system_user_name() {
        assert_eq!(SystemUser::CampaignStop.name(), "campaign_stop");
    }
}
