//! Landing Mode
//!
//! Campaign-level throttling: the controller decides when a campaign must
//! enter the landing state and when it wraps up, and the reallocator draws
//! per-source caps down to zero while it lasts.

mod controller;
mod reallocation;

pub use controller::{LandingCheckOutcome, LandingModeController, SweepReport};
pub use reallocation::DailyCapReallocator;
