//! Schedule (solution) model.
//!
//! A schedule places every meeting request and every commitment on the
//! slot grid and records which commitments left their original slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimeWindow;
use crate::cp::SolveStatus;

/// Kind of item placed on a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A newly requested meeting.
    Meeting,
    /// A pre-existing commitment.
    Commitment,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Meeting => write!(f, "meeting request"),
            ItemKind::Commitment => write!(f, "commitment"),
        }
    }
}

/// The final placement of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    /// Item title.
    pub title: String,
    /// Meeting or commitment.
    pub kind: ItemKind,
    /// People whose calendars hold this item (owner, or required attendees).
    pub person_ids: Vec<String>,
    /// Assigned slot index.
    pub slot_index: usize,
    /// Assigned start.
    pub start: DateTime<Utc>,
    /// Assigned end.
    pub end: DateTime<Utc>,
    /// Whether a commitment left its original slot. Always `false` for meetings.
    pub moved: bool,
}

impl ScheduledItem {
    /// Assigned interval.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }

    /// Whether this item sits on `person_id`'s calendar.
    pub fn involves(&self, person_id: &str) -> bool {
        self.person_ids.iter().any(|p| p == person_id)
    }
}

/// A commitment that was moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduledCommitment {
    /// Commitment title.
    pub title: String,
    /// Owning person.
    pub owner_id: String,
    /// Start before rescheduling.
    pub original_start: DateTime<Utc>,
    /// Start after rescheduling.
    pub new_start: DateTime<Utc>,
    /// End after rescheduling.
    pub new_end: DateTime<Utc>,
}

/// The result for one meeting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingOutcome {
    /// Meeting title.
    pub title: String,
    /// Assigned start.
    pub start: DateTime<Utc>,
    /// Assigned end.
    pub end: DateTime<Utc>,
    /// Commitments moved to make room (scope depends on configuration).
    pub rescheduled: Vec<RescheduledCommitment>,
}

impl MeetingOutcome {
    /// Assigned interval.
    pub fn assigned_interval(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Two items on one person's calendar that overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Person whose calendar is double-booked.
    pub person_id: String,
    /// Title of the first item.
    pub first: String,
    /// Title of the second item.
    pub second: String,
}

/// A solved rescheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// One outcome per meeting request, in request order.
    pub meetings: Vec<MeetingOutcome>,
    /// Every placement: meetings first, then commitments, each in input order.
    pub placements: Vec<ScheduledItem>,
    /// All moved commitments.
    pub rescheduled: Vec<RescheduledCommitment>,
    /// Total weighted disruption.
    pub objective: i64,
    /// Whether the solver proved optimality.
    pub status: SolveStatus,
}

impl Schedule {
    /// Finds the outcome for a meeting.
    pub fn meeting(&self, title: &str) -> Option<&MeetingOutcome> {
        self.meetings.iter().find(|m| m.title == title)
    }

    /// Finds the placement of a commitment owned by `owner_id`.
    pub fn commitment(&self, owner_id: &str, title: &str) -> Option<&ScheduledItem> {
        self.placements.iter().find(|p| {
            p.kind == ItemKind::Commitment && p.title == title && p.involves(owner_id)
        })
    }

    /// All placements on a person's calendar.
    pub fn placements_for_person(&self, person_id: &str) -> Vec<&ScheduledItem> {
        self.placements
            .iter()
            .filter(|p| p.involves(person_id))
            .collect()
    }

    /// Number of moved commitments.
    pub fn moved_count(&self) -> usize {
        self.rescheduled.len()
    }

    /// Whether the solver proved this schedule optimal.
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Lists every pair of overlapping items on the same calendar.
    ///
    /// Empty for any schedule returned by the rescheduler.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut person_ids: Vec<&str> = self
            .placements
            .iter()
            .flat_map(|p| p.person_ids.iter().map(String::as_str))
            .collect();
        person_ids.sort_unstable();
        person_ids.dedup();

        let mut conflicts = Vec::new();
        for person_id in person_ids {
            let items = self.placements_for_person(person_id);
            for (i, a) in items.iter().enumerate() {
                for b in &items[i + 1..] {
                    if a.window().overlaps(&b.window()) {
                        conflicts.push(Conflict {
                            person_id: person_id.to_string(),
                            first: a.title.clone(),
                            second: b.title.clone(),
                        });
                    }
                }
            }
        }
        conflicts
    }
}
