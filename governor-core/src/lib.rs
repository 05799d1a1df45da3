//! Budget Governor - Campaign Spend Governance
//!
//! Keeps advertising campaign spend within the money actually allocated to
//! it. Budget line items drawn against credits are aggregated into a live
//! remaining-budget projection for today and tomorrow; campaigns whose
//! ledger can no longer sustain their committed daily caps enter a
//! throttled landing mode whose per-source caps are drawn down to exactly
//! zero; and every operator edit of a bid, cap or budget amount is bounded
//! against the same projection.
//!
//! # Components
//!
//! - [`BudgetLedger`]: remaining-today / available-tomorrow projection with
//!   waterfall consumption of soonest-to-expire items
//! - [`SpendCapPlanner`]: per-day high-water and currently-configured daily
//!   spend caps per source, ad group and campaign
//! - [`LandingModeController`]: the NORMAL/LANDING state machine and the
//!   two scheduled sweeps
//! - [`DailyCapReallocator`]: daily cap shrinking and non-spending source
//!   deactivation while landing
//! - [`EditGuard`]: maximum/minimum settable value queries for edits
//!
//! # Invariants
//!
//! - Settings are append-only: a new revision per change, "current" is the
//!   most recent committed revision, past revisions are never mutated
//! - All writes of one governor decision form one atomic transaction
//! - No error path ever widens a cap or exits landing mode; on uncertainty
//!   the conservative branch is taken

pub mod config;
pub mod directory;
pub mod error;
pub mod governor;
pub mod guard;
pub mod landing;
pub mod ledger;
pub mod logging;
pub mod planner;
pub mod providers;
pub mod revision;
pub mod types;

// Re-export error types
pub use error::{GovernorError, GovernorResult};

// Re-export configuration
pub use config::{GovernorConfig, ReconciliationCutover};

// Re-export all domain types
pub use types::*;

// Re-export the revision model
pub use revision::{RevisionLog, SettingsRevisioned};
pub use directory::{SettingsDirectory, SettingsTransaction};

// Re-export engines
pub use governor::Governor;
pub use guard::EditGuard;
pub use landing::{DailyCapReallocator, LandingCheckOutcome, LandingModeController, SweepReport};
pub use ledger::{BudgetLedger, BudgetProjection, WaterfallAllocation, WaterfallDraw};
pub use planner::{DailyCapBreakdown, SpendCapPlanner};

// Re-export collaborator interfaces
pub use providers::{
    ConfigSyncSignal, ExchangeRateProvider, LandingEvent, LandingNotifier, SpendProvider,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
