//! Disruption objective.
//!
//! Each commitment gets a `moved` indicator that is true exactly when its
//! slot differs from the slot nearest its original start. Moving costs
//! `10^(5 - rank)`, so one move of a rank-1 commitment outweighs any
//! number of rank-2 moves below ten. Meeting placement is free.

use tracing::warn;

use crate::cp::{BoolVar, CpModel};
use crate::encoder::CommitmentVar;
use crate::grid::SlotGrid;
use crate::models::{Person, MAX_RANK, MIN_RANK};

/// Moving penalty for a commitment rank.
///
/// Ranks outside `MIN_RANK..=MAX_RANK` are clamped, so weights range
/// from 1 (rank 5) to 10 000 (rank 1).
pub fn rank_weight(rank: i32) -> i64 {
    let exponent = MAX_RANK - rank.clamp(MIN_RANK, MAX_RANK);
    10_i64.pow(exponent as u32)
}

/// The moved indicator of one commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovedIndicator {
    /// The commitment's variable.
    pub commitment: CommitmentVar,
    /// Slot nearest the original start.
    pub original_index: usize,
    /// True iff the commitment leaves `original_index`.
    pub moved: BoolVar,
    /// Penalty paid when moved.
    pub weight: i64,
}

/// Adds moved indicators and the weighted-sum objective to `model`.
///
/// Also hints each commitment variable with its original slot.
pub fn add_disruption_objective(
    model: &mut CpModel,
    grid: &SlotGrid,
    people: &[Person],
    commitments: &[CommitmentVar],
) -> Vec<MovedIndicator> {
    commitments
        .iter()
        .map(|&cv| {
            let person = &people[cv.person_index];
            let c = &person.commitments[cv.commitment_index];
            if !(MIN_RANK..=MAX_RANK).contains(&c.rank) {
                warn!(
                    person = %person.id,
                    commitment = %c.title,
                    rank = c.rank,
                    "rank outside the weighted range, clamping"
                );
            }

            let original_index = grid.nearest_slot(c.start);
            let home = original_index as i64;
            let name = format!("moved[{}]", model.int_var(cv.var).name);
            let moved = model.new_bool_var(name);
            model.add_not_equals_if(cv.var, home, moved.lit());
            model.add_equals_if(cv.var, home, moved.not());
            let weight = rank_weight(c.rank);
            model.add_objective_term(moved.lit(), weight);
            model.set_hint(cv.var, home);

            MovedIndicator {
                commitment: cv,
                original_index,
                moved,
                weight,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ModelEncoder;
    use crate::models::{Commitment, MeetingRequest};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_rank_weight_values() {
        assert_eq!(rank_weight(1), 10_000);
        assert_eq!(rank_weight(2), 1_000);
        assert_eq!(rank_weight(5), 1);
    }

    #[test]
    fn test_rank_weight_clamps() {
        assert_eq!(rank_weight(0), rank_weight(MIN_RANK));
        assert_eq!(rank_weight(-3), rank_weight(MIN_RANK));
        assert_eq!(rank_weight(6), 1);
        assert_eq!(rank_weight(i32::MAX), 1);
    }

    #[test]
    fn test_rank_weight_monotonic() {
        for r1 in MIN_RANK..=MAX_RANK {
            for r2 in (r1 + 1)..=MAX_RANK {
                assert!(rank_weight(r1) > rank_weight(r2), "rank {r1} vs {r2}");
            }
        }
    }

    #[test]
    fn test_indicators_use_nearest_slot() {
        let nine = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let people = vec![Person::new("alice")
            .with_commitment(
                Commitment::new("Early", "alice", nine, nine + Duration::minutes(30)).with_rank(1),
            )
            .with_commitment(
                // 9:40 sits nearer 9:45 than 9:30
                Commitment::new(
                    "Odd",
                    "alice",
                    nine + Duration::minutes(40),
                    nine + Duration::minutes(70),
                )
                .with_rank(3),
            )];
        let meetings = vec![MeetingRequest::new("Sync", 30, nine, nine + Duration::hours(4))
            .with_required("alice")];
        let grid = SlotGrid::build(&people, &meetings, 15, 0).unwrap();
        let mut encoding = ModelEncoder::new(&grid, &people, &meetings).encode().unwrap();
        let before = encoding.model.constraint_count();

        let indicators =
            add_disruption_objective(&mut encoding.model, &grid, &people, &encoding.commitments);

        assert_eq!(indicators.len(), 2);
        assert_eq!(indicators[0].original_index, 0);
        assert_eq!(indicators[0].weight, 10_000);
        assert_eq!(indicators[1].original_index, 3);
        assert_eq!(indicators[1].weight, 100);
        assert_eq!(encoding.model.constraint_count(), before + 4);
        assert_eq!(encoding.model.objective_terms().len(), 2);
        assert_eq!(
            encoding.model.int_var(indicators[1].commitment.var).hint,
            Some(3)
        );
    }
}
