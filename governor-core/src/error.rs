//! Governor Error Codes Registry
//!
//! Error code format: GOV-{module}-{sequence}
//! - GOV-LEDGER: Budget ledger errors
//! - GOV-SETTINGS: Settings revision log errors
//! - GOV-LANDING: Landing mode errors
//! - GOV-EXT: External collaborator errors
//!
//! Guard rejections are not errors: the edit guard reports bounds and the
//! caller decides. Errors here cover configuration invariant violations
//! (fatal to the offending campaign's processing cycle) and collaborator
//! unavailability (the cycle is skipped and retried).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Governor Result type
pub type GovernorResult<T> = Result<T, GovernorError>;

/// Governor Error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernorError {
    // ============================================================
    // Ledger Errors (GOV-LEDGER-*)
    // ============================================================
    /// [GOV-LEDGER-001] Budget line item with negative available amount
    #[error("[GOV-LEDGER-001] Budget item {item_id} has negative available amount {available}")]
    NegativeAvailableAmount { item_id: String, available: Decimal },

    /// [GOV-LEDGER-002] Budget line item references an unknown credit
    #[error("[GOV-LEDGER-002] Credit {credit_id} not registered")]
    UnknownCredit { credit_id: String },

    /// [GOV-LEDGER-003] Budget line item window is inverted
    #[error("[GOV-LEDGER-003] Budget item {item_id} has start date after end date")]
    InvalidItemWindow { item_id: String },

    /// [GOV-LEDGER-004] Budget line item not registered
    #[error("[GOV-LEDGER-004] Budget item {item_id} not registered")]
    UnknownBudgetItem { item_id: String },

    /// [GOV-LEDGER-005] Release exceeds the item's available amount
    #[error("[GOV-LEDGER-005] Cannot free {requested} from item {item_id}: only {available} available")]
    OverRelease {
        item_id: String,
        requested: Decimal,
        available: Decimal,
    },

    /// [GOV-LEDGER-006] Fee or margin percentage outside [0, 1)
    #[error("[GOV-LEDGER-006] Credit {credit_id} has invalid fee or margin percentage")]
    InvalidFeePercentage { credit_id: String },

    // ============================================================
    // Settings Errors (GOV-SETTINGS-*)
    // ============================================================
    /// [GOV-SETTINGS-001] Revision would break append-only ordering
    #[error("[GOV-SETTINGS-001] Revision for {entity} at {attempted} is older than current revision at {last}")]
    RevisionOutOfOrder {
        entity: String,
        last: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// [GOV-SETTINGS-002] Campaign has no spend settings revision
    #[error("[GOV-SETTINGS-002] Campaign {campaign_id} has no spend settings")]
    CampaignSettingsMissing { campaign_id: String },

    /// [GOV-SETTINGS-003] Ad group is not registered with any campaign
    #[error("[GOV-SETTINGS-003] Ad group {ad_group_id} not registered")]
    AdGroupNotRegistered { ad_group_id: String },

    /// [GOV-SETTINGS-004] Ad group has no spend settings revision
    #[error("[GOV-SETTINGS-004] Ad group {ad_group_id} has no spend settings")]
    AdGroupSettingsMissing { ad_group_id: String },

    // ============================================================
    // Landing Errors (GOV-LANDING-*)
    // ============================================================
    /// [GOV-LANDING-001] Active ad group carries a forced end date in the past
    /// outside landing mode; upstream data is inconsistent
    #[error("[GOV-LANDING-001] Ad group {ad_group_id} is active with forced end date {end_date} in the past")]
    StaleForcedEndDate {
        ad_group_id: String,
        end_date: NaiveDate,
    },

    // ============================================================
    // Collaborator Errors (GOV-EXT-*)
    // ============================================================
    /// [GOV-EXT-001] External collaborator unavailable; skip cycle and retry
    #[error("[GOV-EXT-001] Collaborator {name} unavailable: {detail}")]
    CollaboratorUnavailable { name: String, detail: String },

    /// [GOV-EXT-002] Exchange rate missing for a currency/date pair
    #[error("[GOV-EXT-002] No exchange rate for {currency} on {date}")]
    ExchangeRateMissing { currency: String, date: NaiveDate },

    // ============================================================
    // General Errors
    // ============================================================
    /// Invalid configuration value
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invariant violation
    #[error("Invariant violation: {invariant} - {details}")]
    InvariantViolation { invariant: String, details: String },
}

impl From<serde_json::Error> for GovernorError {
    fn from(err: serde_json::Error) -> Self {
        GovernorError::SerializationError(err.to_string())
    }
}
