//! Rescheduling domain models.
//!
//! Immutable input records (commitments, people, meeting requests) and the
//! solved output (schedule, per-meeting outcomes, diff of moved commitments).
//!
//! # Domain Mappings
//!
//! | u-reschedule | Job-shop scheduling |
//! |--------------|---------------------|
//! | Person | Machine (unit capacity) |
//! | Commitment | Pre-placed operation with a preferred start |
//! | MeetingRequest | Operation needing several machines at once |
//! | Schedule | Solution |

mod commitment;
mod meeting;
mod person;
mod schedule;
mod window;

pub use commitment::{Commitment, MAX_RANK, MIN_RANK};
pub use meeting::MeetingRequest;
pub use person::Person;
pub use schedule::{Conflict, ItemKind, MeetingOutcome, RescheduledCommitment, Schedule, ScheduledItem};
pub use window::TimeWindow;
