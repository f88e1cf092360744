// libs/scheduling-cell/src/services/suggestion.rs
use chrono::Duration;
use tracing::debug;

use crate::models::{Appointment, Interval, SuggestedSlot};
use crate::services::overlap;

pub const LABEL_BEFORE: &str = "one hour before";
pub const LABEL_AFTER: &str = "one hour after";

/// Proposes nearby alternatives for a conflicting booking attempt. Pure: the
/// candidates are checked against the conflict set the store already fetched,
/// never against a fresh query, so a booking attempt costs exactly one store
/// round trip. The ±1h candidates stay well inside the ±24h fetched window,
/// which is what makes the reuse sound.
pub struct SuggestionPlanner {
    offset: Duration,
}

impl SuggestionPlanner {
    pub fn new() -> Self {
        Self {
            offset: Duration::hours(1),
        }
    }

    /// Up to two suggestions with the requested duration, in fixed order:
    /// one offset before the requested start, then one after.
    pub fn propose(&self, requested: Interval, conflict_set: &[Appointment]) -> Vec<SuggestedSlot> {
        let candidates = [
            (requested.shifted(-self.offset), LABEL_BEFORE),
            (requested.shifted(self.offset), LABEL_AFTER),
        ];

        let mut suggestions = Vec::with_capacity(candidates.len());
        for (candidate, label) in candidates {
            if !overlap::has_conflict(candidate, conflict_set) {
                suggestions.push(SuggestedSlot {
                    start: candidate.start,
                    label: label.to_string(),
                });
            }
        }

        debug!(
            "Proposed {} alternative(s) for conflicting window starting {}",
            suggestions.len(),
            requested.start
        );
        suggestions
    }
}

impl Default for SuggestionPlanner {
    fn default() -> Self {
        Self::new()
    }
}
