//! The data model shared by every pipeline component (spec §3).

pub mod candidate;
pub mod event;
pub mod pick;
pub mod weights;

pub use candidate::{Candidate, Market, Side};
pub use event::{Event, Sport};
pub use pick::{GradeResult, Pick, Tier};
pub use weights::WeightVector;
