//! Append-Only Revision Log
//!
//! The source pattern is "current settings = latest row": every settings
//! entity keeps an immutable, timestamp-ordered log of revisions, and
//! "current" is always the most recent committed revision. A past revision
//! is never mutated.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{GovernorError, GovernorResult};

/// A settings revision belonging to one entity
///
/// Implemented per entity kind so each kind gets a typed log instead of a
/// dynamically dispatched accessor.
pub trait SettingsRevisioned {
    /// Identifies the entity this revision belongs to, rendered into
    /// ordering errors
    fn entity_label(&self) -> String;

    /// Commit timestamp; also the instant the revision became current
    fn created_dt(&self) -> DateTime<Utc>;
}

/// Immutable log of revisions for one entity, newest last
#[derive(Clone, Debug)]
pub struct RevisionLog<T: SettingsRevisioned> {
    revisions: Vec<T>,
}

impl<T: SettingsRevisioned> Default for RevisionLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SettingsRevisioned> RevisionLog<T> {
    pub fn new() -> Self {
        Self {
            revisions: Vec::new(),
        }
    }

    /// Append a revision; timestamps must be non-decreasing
    pub fn append(&mut self, revision: T) -> GovernorResult<()> {
        if let Some(last) = self.revisions.last() {
            if revision.created_dt() < last.created_dt() {
                return Err(GovernorError::RevisionOutOfOrder {
                    entity: revision.entity_label(),
                    last: last.created_dt(),
                    attempted: revision.created_dt(),
                });
            }
        }
        self.revisions.push(revision);
        Ok(())
    }

    /// The revision that would be appended next can only be ordered after
    /// this instant
    pub fn last_created_dt(&self) -> Option<DateTime<Utc>> {
        self.revisions.last().map(|r| r.created_dt())
    }

    /// Most recent committed revision
    pub fn current(&self) -> Option<&T> {
        self.revisions.last()
    }

    /// Most recent revision committed at or before the given instant
    pub fn current_as_of(&self, instant: DateTime<Utc>) -> Option<&T> {
        self.revisions
            .iter()
            .rev()
            .find(|r| r.created_dt() <= instant)
    }

    /// All revisions that were current at some instant of the given UTC day:
    /// the one current at the start of the day plus every revision committed
    /// during it
    pub fn in_force_on(&self, date: NaiveDate) -> Vec<&T> {
        let day_start = date.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
        let day_end = day_start + chrono::Duration::days(1);

        let mut in_force = Vec::new();
        for (idx, revision) in self.revisions.iter().enumerate() {
            if revision.created_dt() >= day_end {
                break;
            }
            let superseded_at = self.revisions.get(idx + 1).map(|next| next.created_dt());
            let still_current_in_day = superseded_at.map_or(true, |t| t > day_start);
            if still_current_in_day {
                in_force.push(revision);
            }
        }
        in_force
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.revisions.iter()
    }
}
