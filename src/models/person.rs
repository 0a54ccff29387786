//! Person model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Commitment;

/// A calendar owner.
///
/// The person's own `rank` is kept for callers; the disruption weighting
/// reads each commitment's rank instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique person identifier.
    pub id: String,
    /// Person-level rank.
    pub rank: i32,
    /// Commitments booked on this person's calendar.
    pub commitments: Vec<Commitment>,
}

impl Person {
    /// Creates a person with no commitments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rank: 0,
            commitments: Vec::new(),
        }
    }

    /// Sets the person-level rank.
    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }

    /// Adds a commitment.
    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitments.push(commitment);
        self
    }

    /// Number of commitments.
    pub fn commitment_count(&self) -> usize {
        self.commitments.len()
    }

    /// Groups a flat commitment list into people by `owner_id`.
    ///
    /// People come out sorted by identifier; each keeps its commitments
    /// in input order.
    pub fn group_by_owner(commitments: impl IntoIterator<Item = Commitment>) -> Vec<Person> {
        let mut grouped: BTreeMap<String, Vec<Commitment>> = BTreeMap::new();
        for c in commitments {
            grouped.entry(c.owner_id.clone()).or_default().push(c);
        }
        grouped
            .into_iter()
            .map(|(id, commitments)| Person {
                id,
                rank: 0,
                commitments,
            })
            .collect()
    }
}
