//! Variable and constraint encoding.
//!
//! Every meeting request and every commitment becomes one slot-index
//! variable whose domain holds exactly the slots where the item fits its
//! window. Each person is a unit-capacity resource: any two items on the
//! same calendar get a pairwise disjunction
//!
//! ```text
//! a_before_b ⇒ a + len(a) ≤ b
//! b_before_a ⇒ b + len(b) ≤ a
//! a_before_b ∨ b_before_a
//! ```
//!
//! with lengths measured in slots (rounded up), which is exact on an
//! evenly spaced grid.
//!
//! # Reference
//! - Baptiste et al. (2001), "Constraint-Based Scheduling", Ch. 2.1
//!   (disjunctive resource)
//! - Pinedo (2016), "Scheduling", Ch. 7 (job shop disjunctive graph)

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::cp::{CpModel, IntVar};
use crate::error::{Result, ScheduleError};
use crate::grid::SlotGrid;
use crate::models::{ItemKind, MeetingRequest, Person};

/// Variable of one commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitmentVar {
    /// Position of the owner in the input slice.
    pub person_index: usize,
    /// Position of the commitment in the owner's list.
    pub commitment_index: usize,
    /// Slot-index variable.
    pub var: IntVar,
}

/// One item on a person's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarItem {
    /// Item title.
    pub title: String,
    /// Meeting or commitment.
    pub kind: ItemKind,
    /// Slot-index variable.
    pub var: IntVar,
    /// Length in slots.
    pub length: i64,
}

/// An encoded model plus the handles needed to read a solution back.
#[derive(Debug, Clone)]
pub struct Encoding {
    /// The constraint model (no objective yet).
    pub model: CpModel,
    /// One variable per meeting request, in request order.
    pub meetings: Vec<IntVar>,
    /// One variable per commitment, people in identifier order.
    pub commitments: Vec<CommitmentVar>,
    /// Number of disjunctive pairs added.
    pub pair_count: usize,
}

impl Encoding {
    /// Finds the variable of a commitment.
    pub fn commitment_var(&self, person_index: usize, commitment_index: usize) -> Option<IntVar> {
        self.commitments
            .iter()
            .find(|c| c.person_index == person_index && c.commitment_index == commitment_index)
            .map(|c| c.var)
    }
}

/// Builds a [`CpModel`] from people, their commitments, and meeting requests.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use u_reschedule::encoder::ModelEncoder;
/// use u_reschedule::grid::SlotGrid;
/// use u_reschedule::models::{Commitment, MeetingRequest, Person};
///
/// let nine = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
/// let ten = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
/// let five = Utc.with_ymd_and_hms(2024, 3, 4, 17, 0, 0).unwrap();
///
/// let people = vec![Person::new("alice").with_commitment(Commitment::new("Review", "alice", nine, ten))];
/// let meetings = vec![MeetingRequest::new("Sync", 30, nine, five).with_required("alice")];
/// let grid = SlotGrid::build(&people, &meetings, 15, 0).unwrap();
///
/// let encoding = ModelEncoder::new(&grid, &people, &meetings).encode().unwrap();
/// assert_eq!(encoding.model.int_var_count(), 2);
/// assert_eq!(encoding.pair_count, 1);
/// ```
pub struct ModelEncoder<'a> {
    grid: &'a SlotGrid,
    people: &'a [Person],
    meetings: &'a [MeetingRequest],
}

impl<'a> ModelEncoder<'a> {
    /// Creates an encoder.
    pub fn new(grid: &'a SlotGrid, people: &'a [Person], meetings: &'a [MeetingRequest]) -> Self {
        Self {
            grid,
            people,
            meetings,
        }
    }

    /// Encodes variables, domains, and non-overlap constraints.
    ///
    /// # Errors
    /// `ScheduleError::InfeasibleWindow` for the first item (meetings
    /// before commitments) whose domain is empty.
    pub fn encode(&self) -> Result<Encoding> {
        let mut model = CpModel::new("reschedule");
        let meetings = self.encode_meetings(&mut model)?;
        let commitments = self.encode_commitments(&mut model)?;

        let calendars = self.collect_person_items(&meetings, &commitments);
        let mut encoded: HashSet<(IntVar, IntVar)> = HashSet::new();
        let mut pair_count = 0;
        for (person_id, items) in &calendars {
            for (i, a) in items.iter().enumerate() {
                for b in &items[i + 1..] {
                    let key = (a.var.min(b.var), a.var.max(b.var));
                    if !encoded.insert(key) {
                        continue;
                    }
                    add_disjunction(&mut model, person_id, a, b);
                    pair_count += 1;
                }
            }
        }

        debug!(
            people = calendars.len(),
            int_vars = model.int_var_count(),
            bool_vars = model.bool_var_count(),
            constraints = model.constraint_count(),
            pairs = pair_count,
            "encoded rescheduling model"
        );

        Ok(Encoding {
            model,
            meetings,
            commitments,
            pair_count,
        })
    }

    fn encode_meetings(&self, model: &mut CpModel) -> Result<Vec<IntVar>> {
        self.meetings
            .iter()
            .map(|m| {
                let domain = self
                    .grid
                    .feasible_starts(m.earliest, m.latest, m.duration());
                if domain.is_empty() {
                    return Err(ScheduleError::InfeasibleWindow {
                        item: m.title.clone(),
                        kind: ItemKind::Meeting,
                    });
                }
                Ok(model.new_int_var(
                    format!("meeting[{}]", m.title),
                    domain.into_iter().map(|i| i as i64),
                ))
            })
            .collect()
    }

    fn encode_commitments(&self, model: &mut CpModel) -> Result<Vec<CommitmentVar>> {
        let mut vars = Vec::new();
        for person_index in self.people_by_id() {
            let person = &self.people[person_index];
            for (commitment_index, c) in person.commitments.iter().enumerate() {
                let domain =
                    self.grid
                        .feasible_starts(self.grid.earliest(), self.grid.latest(), c.duration());
                if domain.is_empty() {
                    return Err(ScheduleError::InfeasibleWindow {
                        item: c.title.clone(),
                        kind: ItemKind::Commitment,
                    });
                }
                let var = model.new_int_var(
                    format!("{}/{}#{}", person.id, c.title, commitment_index),
                    domain.into_iter().map(|i| i as i64),
                );
                vars.push(CommitmentVar {
                    person_index,
                    commitment_index,
                    var,
                });
            }
        }
        Ok(vars)
    }

    /// Input positions of people, sorted by identifier.
    fn people_by_id(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.people.len()).collect();
        order.sort_by(|&a, &b| self.people[a].id.cmp(&self.people[b].id));
        order
    }

    /// Collects every calendar's items, keyed and ordered by person identifier.
    ///
    /// Commitments come first in owner order, then meetings in request order.
    /// People who only appear as meeting attendees are included.
    pub fn collect_person_items(
        &self,
        meeting_vars: &[IntVar],
        commitment_vars: &[CommitmentVar],
    ) -> BTreeMap<String, Vec<CalendarItem>> {
        let mut calendars: BTreeMap<String, Vec<CalendarItem>> = BTreeMap::new();

        for cv in commitment_vars {
            let person = &self.people[cv.person_index];
            let c = &person.commitments[cv.commitment_index];
            calendars
                .entry(person.id.clone())
                .or_default()
                .push(CalendarItem {
                    title: c.title.clone(),
                    kind: ItemKind::Commitment,
                    var: cv.var,
                    length: self.grid.duration_in_slots(c.duration()),
                });
        }

        for (m, &var) in self.meetings.iter().zip(meeting_vars) {
            for person_id in &m.required_person_ids {
                calendars
                    .entry(person_id.clone())
                    .or_default()
                    .push(CalendarItem {
                        title: m.title.clone(),
                        kind: ItemKind::Meeting,
                        var,
                        length: self.grid.duration_in_slots(m.duration()),
                    });
            }
        }

        calendars
    }
}

fn add_disjunction(model: &mut CpModel, person_id: &str, a: &CalendarItem, b: &CalendarItem) {
    let a_first = model.new_bool_var(format!("{}_before_{}@{}", a.title, b.title, person_id));
    let b_first = model.new_bool_var(format!("{}_before_{}@{}", b.title, a.title, person_id));
    model.add_less_or_equal_if(a.var, a.length, b.var, a_first.lit());
    model.add_less_or_equal_if(b.var, b.length, a.var, b_first.lit());
    model.add_at_least_one([a_first.lit(), b_first.lit()]);
}
