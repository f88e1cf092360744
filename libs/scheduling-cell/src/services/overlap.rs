// libs/scheduling-cell/src/services/overlap.rs
use chrono::Duration;

use crate::models::{Appointment, Interval};

/// Margin added on both sides of a candidate interval when fetching the
/// conflict set. Must stay at least as wide as the 480-minute duration cap:
/// an appointment starting outside the widened window cannot reach into the
/// candidate.
const SCAN_MARGIN_HOURS: i64 = 24;

/// Two half-open intervals `[s1,e1)` and `[s2,e2)` overlap iff
/// `s1 < e2 && s2 < e1`. Strict inequality makes back-to-back slots legal:
/// `[9:00,10:00)` and `[10:00,11:00)` do not conflict.
pub fn overlaps(a: Interval, b: Interval) -> bool {
    a.start < b.end && b.start < a.end
}

/// The bounded window of appointment `start` values worth fetching when
/// checking `candidate` for conflicts.
pub fn conflict_scan_window(candidate: Interval) -> Interval {
    Interval {
        start: candidate.start - Duration::hours(SCAN_MARGIN_HOURS),
        end: candidate.end + Duration::hours(SCAN_MARGIN_HOURS),
    }
}

/// Whether any appointment in the (already slot-blocking) conflict set
/// occupies part of `candidate`.
pub fn has_conflict(candidate: Interval, conflict_set: &[Appointment]) -> bool {
    conflict_set
        .iter()
        .any(|existing| overlaps(candidate, existing.interval()))
}
