//! Slot grid.
//!
//! Discretizes the relevant time span into evenly spaced slots:
//! `earliest, earliest + g, earliest + 2g, …`, keeping every slot `t`
//! with `t + g ≤ latest`. All arithmetic is done on whole seconds, so
//! slot lookups and nearest-slot tie-breaks are exact.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::models::{MeetingRequest, Person};

/// Largest number of slots a grid may hold.
pub const MAX_SLOTS: usize = 100_000;

/// An evenly spaced sequence of slot starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    step_secs: i64,
    len: usize,
}

impl SlotGrid {
    /// Builds the grid spanning every commitment and meeting window.
    ///
    /// `horizon_minutes` extends the latest bound; pass 0 for the exact span.
    ///
    /// # Errors
    /// `ScheduleError::Configuration` if the granularity is not positive,
    /// there are no inputs, the horizon runs past the representable time
    /// range, or the span holds no slot or more than [`MAX_SLOTS`].
    pub fn build(
        people: &[Person],
        meetings: &[MeetingRequest],
        granularity_minutes: i64,
        horizon_minutes: i64,
    ) -> Result<Self> {
        let starts = people
            .iter()
            .flat_map(|p| p.commitments.iter().map(|c| c.start))
            .chain(meetings.iter().map(|m| m.earliest));
        let ends = people
            .iter()
            .flat_map(|p| p.commitments.iter().map(|c| c.end))
            .chain(meetings.iter().map(|m| m.latest));

        let (Some(earliest), Some(latest)) = (starts.min(), ends.max()) else {
            return Err(ScheduleError::Configuration(
                "nothing to schedule: no commitments and no meeting requests".into(),
            ));
        };

        let extended = Duration::try_minutes(horizon_minutes)
            .and_then(|horizon| latest.checked_add_signed(horizon))
            .ok_or_else(|| {
                ScheduleError::Configuration(format!(
                    "reschedule horizon of {horizon_minutes} minutes runs past the supported time range"
                ))
            })?;

        Self::from_span(earliest, extended, granularity_minutes)
    }

    /// Builds the grid for an explicit span.
    pub fn from_span(
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
        granularity_minutes: i64,
    ) -> Result<Self> {
        if granularity_minutes <= 0 {
            return Err(ScheduleError::Configuration(format!(
                "granularity must be positive, got {granularity_minutes} minutes"
            )));
        }
        if earliest >= latest {
            return Err(ScheduleError::Configuration(format!(
                "empty time span: {earliest} is not before {latest}"
            )));
        }

        let step_secs = granularity_minutes.checked_mul(60).ok_or_else(|| {
            ScheduleError::Configuration(format!(
                "granularity of {granularity_minutes} minutes is too large"
            ))
        })?;
        let span_secs = (latest - earliest).num_seconds();
        let len = usize::try_from(span_secs / step_secs).unwrap_or(usize::MAX);
        if len == 0 {
            return Err(ScheduleError::Configuration(format!(
                "time span {earliest} to {latest} is shorter than one {granularity_minutes}-minute slot"
            )));
        }
        if len > MAX_SLOTS {
            return Err(ScheduleError::Configuration(format!(
                "time span {earliest} to {latest} holds {len} slots of {granularity_minutes} minutes, more than {MAX_SLOTS}"
            )));
        }

        debug!(
            slots = len,
            granularity_minutes,
            %earliest,
            %latest,
            "built slot grid"
        );

        Ok(Self {
            earliest,
            latest,
            step_secs,
            len,
        })
    }

    /// Number of slots (always at least one).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; an empty grid is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lower bound of the span (start of slot 0).
    pub fn earliest(&self) -> DateTime<Utc> {
        self.earliest
    }

    /// Upper bound of the span.
    pub fn latest(&self) -> DateTime<Utc> {
        self.latest
    }

    /// Slot width.
    pub fn granularity(&self) -> Duration {
        Duration::seconds(self.step_secs)
    }

    /// Start of slot `index`.
    pub fn slot(&self, index: usize) -> DateTime<Utc> {
        self.earliest + Duration::seconds(self.step_secs * index as i64)
    }

    /// All slot starts in order.
    pub fn slots(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.len).map(move |i| self.slot(i))
    }

    /// Index of the slot whose start is closest to `at`; ties pick the
    /// smaller index.
    pub fn nearest_slot(&self, at: DateTime<Utc>) -> usize {
        let offset = (at - self.earliest).num_seconds();
        if offset <= 0 {
            return 0;
        }
        let below = offset / self.step_secs;
        let rem = offset % self.step_secs;
        let index = if 2 * rem > self.step_secs { below + 1 } else { below };
        (index as usize).min(self.len - 1)
    }

    /// Number of slots needed to hold `duration` (rounded up).
    pub fn duration_in_slots(&self, duration: Duration) -> i64 {
        let secs = duration.num_seconds().max(0);
        (secs + self.step_secs - 1) / self.step_secs
    }

    /// Indices `i` with `slot(i) ≥ lower` and `slot(i) + duration ≤ upper`.
    pub fn feasible_starts(
        &self,
        lower: DateTime<Utc>,
        upper: DateTime<Utc>,
        duration: Duration,
    ) -> Vec<usize> {
        (0..self.len)
            .filter(|&i| {
                let start = self.slot(i);
                start >= lower
                    && start
                        .checked_add_signed(duration)
                        .is_some_and(|end| end <= upper)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Commitment;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    fn person_with(hour: u32, minutes: i64) -> Person {
        Person::new("alice").with_commitment(Commitment::new(
            "c",
            "alice",
            at(hour, 0),
            at(hour, 0) + Duration::minutes(minutes),
        ))
    }

    #[test]
    fn test_span_covers_all_inputs() {
        let people = vec![person_with(8, 60)];
        let meetings = vec![MeetingRequest::new("m", 30, at(9, 0), at(17, 0))];
        let grid = SlotGrid::build(&people, &meetings, 15, 0).unwrap();

        assert_eq!(grid.earliest(), at(8, 0));
        assert_eq!(grid.latest(), at(17, 0));
        assert_eq!(grid.len(), 36); // 9 hours of 15-minute slots
        assert_eq!(grid.slot(0), at(8, 0));
        assert_eq!(grid.slot(35), at(16, 45));
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_partial_last_slot_dropped() {
        let grid = SlotGrid::from_span(at(9, 0), at(10, 10), 15).unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.slots().last(), Some(at(9, 45)));
    }

    #[test]
    fn test_horizon_extends_latest() {
        let people = vec![person_with(9, 480)];
        let grid = SlotGrid::build(&people, &[], 15, 30).unwrap();
        assert_eq!(grid.latest(), at(17, 30));
        assert_eq!(grid.len(), 34);
    }

    #[test]
    fn test_rejects_bad_granularity() {
        for g in [0, -15] {
            let err = SlotGrid::from_span(at(9, 0), at(10, 0), g).unwrap_err();
            assert!(matches!(err, ScheduleError::Configuration(_)));
        }
    }

    #[test]
    fn test_rejects_empty_span() {
        assert!(matches!(
            SlotGrid::build(&[], &[], 15, 0),
            Err(ScheduleError::Configuration(_))
        ));
        assert!(matches!(
            SlotGrid::from_span(at(10, 0), at(10, 0), 15),
            Err(ScheduleError::Configuration(_))
        ));
        assert!(matches!(
            SlotGrid::from_span(at(10, 0), at(10, 10), 15),
            Err(ScheduleError::Configuration(_))
        ));
    }

    #[test]
    fn test_nearest_slot_ties_prefer_smaller_index() {
        let grid = SlotGrid::from_span(at(9, 0), at(10, 0), 30).unwrap();
        assert_eq!(grid.nearest_slot(at(9, 0)), 0);
        assert_eq!(grid.nearest_slot(at(9, 14)), 0);
        assert_eq!(grid.nearest_slot(at(9, 15)), 0); // exact tie
        assert_eq!(grid.nearest_slot(at(9, 16)), 1);
        assert_eq!(grid.nearest_slot(at(8, 0)), 0);
        assert_eq!(grid.nearest_slot(at(11, 0)), 1); // clamped to last slot
    }

    #[test]
    fn test_duration_in_slots_rounds_up() {
        let grid = SlotGrid::from_span(at(9, 0), at(17, 0), 15).unwrap();
        assert_eq!(grid.duration_in_slots(Duration::minutes(0)), 0);
        assert_eq!(grid.duration_in_slots(Duration::minutes(15)), 1);
        assert_eq!(grid.duration_in_slots(Duration::minutes(16)), 2);
        assert_eq!(grid.duration_in_slots(Duration::minutes(60)), 4);
    }

    #[test]
    fn test_feasible_starts() {
        let grid = SlotGrid::from_span(at(9, 0), at(11, 0), 30).unwrap();
        let starts = grid.feasible_starts(at(9, 15), at(11, 0), Duration::minutes(60));
        assert_eq!(starts, vec![1, 2]);
        assert!(grid
            .feasible_starts(at(9, 0), at(9, 45), Duration::minutes(60))
            .is_empty());
    }

    #[test]
    fn test_huge_horizon_is_configuration_error() {
        let people = vec![person_with(9, 60)];
        for horizon in [i64::MAX / 2, i64::MAX] {
            assert!(matches!(
                SlotGrid::build(&people, &[], 15, horizon),
                Err(ScheduleError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_granularity_overflow_is_configuration_error() {
        let err = SlotGrid::from_span(at(9, 0), at(10, 0), i64::MAX / 2).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }

    #[test]
    fn test_too_many_slots_rejected() {
        // one-minute slots over a year
        let latest = at(9, 0) + Duration::days(365);
        let err = SlotGrid::from_span(at(9, 0), latest, 1).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
        assert!(SlotGrid::from_span(at(9, 0), latest, 24 * 60).is_ok());
    }

    #[test]
    fn test_feasible_starts_with_unrepresentable_duration() {
        let grid = SlotGrid::from_span(at(9, 0), at(17, 0), 30).unwrap();
        assert!(grid.feasible_starts(at(9, 0), at(17, 0), Duration::MAX).is_empty());
        assert!(grid
            .feasible_starts(at(9, 0), at(17, 0), Duration::minutes(1_000_000_000_000))
            .is_empty());
    }

    #[test]
    fn test_grid_properties_hold_for_random_spans() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let earliest = at(0, 0) + Duration::minutes(rng.random_range(0..600));
            let latest = earliest + Duration::minutes(rng.random_range(1..900));
            let g = rng.random_range(1..90);
            let Ok(grid) = SlotGrid::from_span(earliest, latest, g) else {
                assert!((latest - earliest).num_minutes() < g);
                continue;
            };

            let slots: Vec<_> = grid.slots().collect();
            assert!(slots[0] >= earliest);
            assert!(*slots.last().unwrap() + Duration::minutes(g) <= latest);
            for pair in slots.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::minutes(g));
            }
            // no further slot would fit
            assert!(*slots.last().unwrap() + Duration::minutes(2 * g) > latest);
        }
    }
}
