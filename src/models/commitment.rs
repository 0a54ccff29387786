//! Commitment model.
//!
//! A commitment is an entry already booked on one person's calendar.
//! Rescheduling may move it, but never changes its length.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// Highest-priority rank accepted by the disruption weighting.
pub const MIN_RANK: i32 = 1;
/// Lowest-priority rank accepted by the disruption weighting.
pub const MAX_RANK: i32 = 5;

/// An existing calendar entry owned by one person.
///
/// `rank` is the commitment's priority: lower value = more important,
/// so moving it costs more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Original start.
    pub start: DateTime<Utc>,
    /// Original end.
    pub end: DateTime<Utc>,
    /// Human-readable title.
    pub title: String,
    /// Identifier of the owning person.
    pub owner_id: String,
    /// Priority rank (lower = higher priority).
    pub rank: i32,
}

impl Commitment {
    /// Creates a commitment with the lowest priority rank.
    pub fn new(
        title: impl Into<String>,
        owner_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            start,
            end,
            title: title.into(),
            owner_id: owner_id.into(),
            rank: MAX_RANK,
        }
    }

    /// Sets the priority rank.
    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }

    /// Original length.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Original length in whole minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Original placement.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_commitment_builder() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap();
        let c = Commitment::new("1:1", "alice", start, end).with_rank(2);

        assert_eq!(c.title, "1:1");
        assert_eq!(c.owner_id, "alice");
        assert_eq!(c.rank, 2);
        assert_eq!(c.duration_minutes(), 90);
        assert_eq!(c.window(), TimeWindow::new(start, end));
    }

    #[test]
    fn test_default_rank_is_lowest_priority() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let c = Commitment::new("Gym", "bob", t, t + Duration::minutes(45));
        assert_eq!(c.rank, MAX_RANK);
    }
}
