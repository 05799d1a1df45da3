//! Logging Conventions
//!
//! All governor modules log through `tracing` with structured fields.
//!
//! # Log Levels
//!
//! | Level | Usage | Examples |
//! |-------|-------|----------|
//! | ERROR | Upstream data inconsistency, fatal cycle errors | Negative available amount |
//! | WARN  | Skipped campaign cycle, collaborator unavailable | Analytics provider down |
//! | INFO  | Governor decisions and settings writes | Landing mode entered |
//! | DEBUG | Projection and planning intermediates | Waterfall draws |
//!
//! Always use structured fields for key information rather than formatting
//! identifiers into the message.

/// Standard log field names
pub mod fields {
    /// Campaign identifier
    pub const CAMPAIGN_ID: &str = "campaign_id";
    /// Ad group identifier
    pub const AD_GROUP_ID: &str = "ad_group_id";
    /// Media source identifier
    pub const SOURCE_ID: &str = "source_id";
    /// Budget line item identifier
    pub const BUDGET_ITEM_ID: &str = "budget_item_id";
    /// Operation name
    pub const OPERATION: &str = "operation";
    /// Monetary amount
    pub const AMOUNT: &str = "amount";
    /// Item count
    pub const COUNT: &str = "count";
    /// Error message
    pub const ERROR: &str = "error";
}

/// Operation names used in the `operation` field
pub mod operations {
    pub const LANDING_CHECK: &str = "landing_check";
    pub const SWITCH_TO_LANDING: &str = "switch_to_landing";
    pub const EXIT_LANDING: &str = "exit_landing";
    pub const REALLOCATE_CAPS: &str = "reallocate_caps";
    pub const HARD_STOP: &str = "hard_stop";
    pub const SWEEP_LOW_BUDGET: &str = "sweep_low_budget";
    pub const SWEEP_LANDING_UPDATE: &str = "sweep_landing_update";
}
