//! Schedule extraction.
//!
//! Turns a solver assignment back into concrete intervals and the diff
//! of moved commitments. A commitment counts as moved when its assigned
//! slot differs from the slot nearest its original start.

use std::collections::HashMap;

use crate::config::DiffScope;
use crate::cp::{CpSolution, IntVar, SolveStatus};
use crate::encoder::Encoding;
use crate::error::{Result, ScheduleError};
use crate::grid::SlotGrid;
use crate::models::{
    ItemKind, MeetingOutcome, MeetingRequest, Person, RescheduledCommitment, Schedule,
    ScheduledItem,
};
use crate::objective::MovedIndicator;

/// Decodes a solver result into a [`Schedule`].
pub struct ScheduleExtractor<'a> {
    grid: &'a SlotGrid,
    people: &'a [Person],
    meetings: &'a [MeetingRequest],
    encoding: &'a Encoding,
    indicators: &'a [MovedIndicator],
}

impl<'a> ScheduleExtractor<'a> {
    /// Creates an extractor over one encoded problem.
    pub fn new(
        grid: &'a SlotGrid,
        people: &'a [Person],
        meetings: &'a [MeetingRequest],
        encoding: &'a Encoding,
        indicators: &'a [MovedIndicator],
    ) -> Self {
        Self {
            grid,
            people,
            meetings,
            encoding,
            indicators,
        }
    }

    /// Builds the schedule.
    ///
    /// # Errors
    /// - `SolverTimeout` when the budget ran out before any solution.
    /// - `NoFeasibleSchedule` when infeasibility was proven, the solver
    ///   stopped undecided, or the assignment is incomplete.
    pub fn extract(&self, solution: &CpSolution, scope: DiffScope) -> Result<Schedule> {
        match solution.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {}
            SolveStatus::Infeasible => {
                return Err(ScheduleError::NoFeasibleSchedule(
                    "no placement avoids every double-booking".into(),
                ))
            }
            SolveStatus::Unknown if solution.stats.budget_exhausted => {
                return Err(ScheduleError::SolverTimeout {
                    nodes: solution.stats.nodes,
                    elapsed_ms: solution.stats.elapsed_ms,
                })
            }
            SolveStatus::Unknown => {
                return Err(ScheduleError::NoFeasibleSchedule(
                    "solver stopped without a decision".into(),
                ))
            }
        }

        let mut placements = Vec::new();
        let mut meeting_windows = Vec::with_capacity(self.meetings.len());
        for (m, &var) in self.meetings.iter().zip(&self.encoding.meetings) {
            let index = self.slot_index(solution, var)?;
            let start = self.grid.slot(index);
            let end = start + m.duration();
            meeting_windows.push((start, end));
            placements.push(ScheduledItem {
                title: m.title.clone(),
                kind: ItemKind::Meeting,
                person_ids: m.required_person_ids.iter().cloned().collect(),
                slot_index: index,
                start,
                end,
                moved: false,
            });
        }

        let by_position: HashMap<(usize, usize), &MovedIndicator> = self
            .indicators
            .iter()
            .map(|ind| {
                (
                    (ind.commitment.person_index, ind.commitment.commitment_index),
                    ind,
                )
            })
            .collect();

        let mut rescheduled = Vec::new();
        for (person_index, person) in self.people.iter().enumerate() {
            for (commitment_index, c) in person.commitments.iter().enumerate() {
                let Some(ind) = by_position.get(&(person_index, commitment_index)) else {
                    return Err(ScheduleError::NoFeasibleSchedule(format!(
                        "commitment '{}' of '{}' was not encoded",
                        c.title, person.id
                    )));
                };
                let index = self.slot_index(solution, ind.commitment.var)?;
                let start = self.grid.slot(index);
                let end = start + c.duration();
                let moved = index != ind.original_index;
                if moved {
                    rescheduled.push(RescheduledCommitment {
                        title: c.title.clone(),
                        owner_id: person.id.clone(),
                        original_start: c.start,
                        new_start: start,
                        new_end: end,
                    });
                }
                placements.push(ScheduledItem {
                    title: c.title.clone(),
                    kind: ItemKind::Commitment,
                    person_ids: vec![person.id.clone()],
                    slot_index: index,
                    start,
                    end,
                    moved,
                });
            }
        }

        let meetings = self
            .meetings
            .iter()
            .zip(meeting_windows)
            .map(|(m, (start, end))| MeetingOutcome {
                title: m.title.clone(),
                start,
                end,
                rescheduled: match scope {
                    DiffScope::Global => rescheduled.clone(),
                    DiffScope::Participants => rescheduled
                        .iter()
                        .filter(|r| m.requires(&r.owner_id))
                        .cloned()
                        .collect(),
                },
            })
            .collect();

        Ok(Schedule {
            meetings,
            placements,
            rescheduled,
            objective: solution.objective,
            status: solution.status,
        })
    }

    fn slot_index(&self, solution: &CpSolution, var: IntVar) -> Result<usize> {
        let name = &self.encoding.model.int_var(var).name;
        let value = solution.value(var).ok_or_else(|| {
            ScheduleError::NoFeasibleSchedule(format!("solver returned no value for {name}"))
        })?;
        usize::try_from(value)
            .ok()
            .filter(|&i| i < self.grid.len())
            .ok_or_else(|| {
                ScheduleError::NoFeasibleSchedule(format!(
                    "solver placed {name} at slot {value}, outside the grid"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::SearchStats;
    use crate::encoder::ModelEncoder;
    use crate::models::Commitment;
    use crate::objective::add_disruption_objective;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    struct Fixture {
        people: Vec<Person>,
        meetings: Vec<MeetingRequest>,
        grid: SlotGrid,
        encoding: Encoding,
        indicators: Vec<MovedIndicator>,
    }

    /// alice: Review 9:00–10:00; bob: Gym 10:00–11:00; Sync needs alice only.
    fn fixture() -> Fixture {
        let people = vec![
            Person::new("alice").with_commitment(Commitment::new("Review", "alice", at(9, 0), at(10, 0))),
            Person::new("bob").with_commitment(Commitment::new("Gym", "bob", at(10, 0), at(11, 0))),
        ];
        let meetings =
            vec![MeetingRequest::new("Sync", 30, at(9, 0), at(12, 0)).with_required("alice")];
        let grid = SlotGrid::build(&people, &meetings, 15, 0).unwrap();
        let mut encoding = ModelEncoder::new(&grid, &people, &meetings).encode().unwrap();
        let indicators =
            add_disruption_objective(&mut encoding.model, &grid, &people, &encoding.commitments);
        Fixture {
            people,
            meetings,
            grid,
            encoding,
            indicators,
        }
    }

    /// Hand-made assignment: Sync at slot 0, Review moved to slot 4, Gym and
    /// bob's calendar untouched.
    fn solved(f: &Fixture, status: SolveStatus) -> CpSolution {
        let mut ints = vec![0; f.encoding.model.int_var_count()];
        ints[f.encoding.meetings[0].index()] = 0;
        ints[f.encoding.commitment_var(0, 0).unwrap().index()] = 4;
        ints[f.encoding.commitment_var(1, 0).unwrap().index()] = 4;
        CpSolution {
            status,
            int_values: ints,
            bool_values: vec![false; f.encoding.model.bool_var_count()],
            objective: 1,
            stats: SearchStats::default(),
        }
    }

    fn extractor(f: &Fixture) -> ScheduleExtractor<'_> {
        ScheduleExtractor::new(&f.grid, &f.people, &f.meetings, &f.encoding, &f.indicators)
    }

    #[test]
    fn test_extracts_intervals_and_diff() {
        let f = fixture();
        let schedule = extractor(&f)
            .extract(&solved(&f, SolveStatus::Optimal), DiffScope::Global)
            .unwrap();

        let sync = schedule.meeting("Sync").unwrap();
        assert_eq!(sync.start, at(9, 0));
        assert_eq!(sync.end, at(9, 30));

        let review = schedule.commitment("alice", "Review").unwrap();
        assert_eq!(review.start, at(10, 0));
        assert_eq!(review.end, at(11, 0));
        assert!(review.moved);
        assert!(!schedule.commitment("bob", "Gym").unwrap().moved);

        assert_eq!(schedule.rescheduled.len(), 1);
        assert_eq!(schedule.rescheduled[0].title, "Review");
        assert_eq!(schedule.rescheduled[0].original_start, at(9, 0));
        assert_eq!(schedule.rescheduled[0].new_start, at(10, 0));
        assert_eq!(sync.rescheduled, schedule.rescheduled);
        assert_eq!(schedule.placements.len(), 3);
        assert_eq!(schedule.placements[0].kind, ItemKind::Meeting);
        assert_eq!(schedule.objective, 1);
    }

    #[test]
    fn test_participant_scope_filters_diff() {
        let f = fixture();
        let mut solution = solved(&f, SolveStatus::Feasible);
        // bob's Gym moves too, but bob is not in Sync
        solution.int_values[f.encoding.commitment_var(1, 0).unwrap().index()] = 8;

        let global = extractor(&f)
            .extract(&solution, DiffScope::Global)
            .unwrap();
        assert_eq!(global.meetings[0].rescheduled.len(), 2);

        let scoped = extractor(&f)
            .extract(&solution, DiffScope::Participants)
            .unwrap();
        assert_eq!(scoped.rescheduled.len(), 2);
        assert_eq!(scoped.meetings[0].rescheduled.len(), 1);
        assert_eq!(scoped.meetings[0].rescheduled[0].owner_id, "alice");
        assert_eq!(scoped.status, SolveStatus::Feasible);
    }

    #[test]
    fn test_failure_statuses() {
        let f = fixture();
        let stats = SearchStats {
            nodes: 42,
            elapsed_ms: 7,
            budget_exhausted: true,
        };

        let infeasible = CpSolution::without_solution(SolveStatus::Infeasible, SearchStats::default());
        assert!(matches!(
            extractor(&f).extract(&infeasible, DiffScope::Global),
            Err(ScheduleError::NoFeasibleSchedule(_))
        ));

        let timeout = CpSolution::without_solution(SolveStatus::Unknown, stats);
        assert_eq!(
            extractor(&f).extract(&timeout, DiffScope::Global),
            Err(ScheduleError::SolverTimeout {
                nodes: 42,
                elapsed_ms: 7
            })
        );

        let undecided = CpSolution::without_solution(SolveStatus::Unknown, SearchStats::default());
        assert!(matches!(
            extractor(&f).extract(&undecided, DiffScope::Global),
            Err(ScheduleError::NoFeasibleSchedule(_))
        ));
    }

    #[test]
    fn test_rejects_incomplete_assignment() {
        let f = fixture();
        let mut solution = solved(&f, SolveStatus::Optimal);
        solution.int_values.pop();
        assert!(matches!(
            extractor(&f).extract(&solution, DiffScope::Global),
            Err(ScheduleError::NoFeasibleSchedule(_))
        ));

        let mut solution = solved(&f, SolveStatus::Optimal);
        solution.int_values[0] = 10_000;
        assert!(matches!(
            extractor(&f).extract(&solution, DiffScope::Global),
            Err(ScheduleError::NoFeasibleSchedule(_))
        ));
    }
}
