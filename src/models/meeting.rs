//! Meeting request model.
//!
//! A meeting request asks for one contiguous block of `duration_minutes`
//! inside `[earliest, latest)` on the calendars of every required person.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::TimeWindow;
use crate::error::{Result, ScheduleError};

/// A meeting to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    /// Meeting title (unique within one request batch).
    pub title: String,
    /// Required length in minutes.
    pub duration_minutes: i64,
    /// Earliest allowed start.
    pub earliest: DateTime<Utc>,
    /// Latest allowed end.
    pub latest: DateTime<Utc>,
    /// Identifiers of the people who must attend.
    pub required_person_ids: BTreeSet<String>,
}

impl MeetingRequest {
    /// Creates a meeting request with no required people.
    pub fn new(
        title: impl Into<String>,
        duration_minutes: i64,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            duration_minutes,
            earliest,
            latest,
            required_person_ids: BTreeSet::new(),
        }
    }

    /// Parses a request from RFC 3339 timestamps.
    ///
    /// # Errors
    /// `ScheduleError::Configuration` if either timestamp is malformed.
    pub fn from_iso(
        title: impl Into<String>,
        duration_minutes: i64,
        earliest: &str,
        latest: &str,
    ) -> Result<Self> {
        Ok(Self::new(
            title,
            duration_minutes,
            parse_timestamp(earliest)?,
            parse_timestamp(latest)?,
        ))
    }

    /// Adds a required person.
    pub fn with_required(mut self, person_id: impl Into<String>) -> Self {
        self.required_person_ids.insert(person_id.into());
        self
    }

    /// Adds several required people.
    pub fn with_required_people<I, S>(mut self, person_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_person_ids
            .extend(person_ids.into_iter().map(Into::into));
        self
    }

    /// Whether `person_id` must attend.
    pub fn requires(&self, person_id: &str) -> bool {
        self.required_person_ids.contains(person_id)
    }

    /// Required length, saturating at `Duration::MAX` for lengths chrono
    /// cannot represent.
    #[inline]
    pub fn duration(&self) -> Duration {
        Duration::try_minutes(self.duration_minutes).unwrap_or(Duration::MAX)
    }

    /// The feasible window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.earliest, self.latest)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ScheduleError::Configuration(format!("invalid timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meeting_builder() {
        let earliest = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let latest = Utc.with_ymd_and_hms(2024, 3, 4, 17, 0, 0).unwrap();
        let m = MeetingRequest::new("Planning", 30, earliest, latest)
            .with_required("bob")
            .with_required_people(["alice", "bob"]);

        assert_eq!(m.duration(), Duration::minutes(30));
        assert_eq!(m.required_person_ids.len(), 2);
        assert!(m.requires("alice"));
        assert!(!m.requires("carol"));
        assert_eq!(m.window().duration(), Duration::hours(8));
    }

    #[test]
    fn test_duration_saturates() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let m = MeetingRequest::new("Forever", i64::MAX, t, t + Duration::hours(1));
        assert_eq!(m.duration(), Duration::MAX);
        let m = MeetingRequest::new("Long", 1_000_000_000_000, t, t + Duration::hours(1));
        assert_eq!(m.duration(), Duration::minutes(1_000_000_000_000));
    }

    #[test]
    fn test_from_iso() {
        let m = MeetingRequest::from_iso(
            "Sync",
            45,
            "2024-03-04T09:00:00Z",
            "2024-03-04T12:00:00+02:00",
        )
        .unwrap();
        assert_eq!(m.earliest, Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
        assert_eq!(m.latest, Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_from_iso_rejects_garbage() {
        let err = MeetingRequest::from_iso("Sync", 45, "tomorrow", "2024-03-04T12:00:00Z")
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }

    #[test]
    fn test_serde_roundtrip_keeps_people_sorted() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let m = MeetingRequest::new("Sync", 30, t, t + Duration::hours(2))
            .with_required_people(["zoe", "adam"]);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.find("adam").unwrap() < json.find("zoe").unwrap());
        let back: MeetingRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
