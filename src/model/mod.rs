//! Participant roster and compatibility model.
//!
//! # Key Components
//!
//! - **Roster**: [`Participant`], [`ParticipantStatus`], [`Exclusion`] and
//!   the id newtypes [`ParticipantId`], [`GroupId`]
//! - **Model**: [`ConstraintModel`] — dense directed compatibility graph
//!   where `allowed(p) = P \ ({p} ∪ excluded(p))`
//!
//! Building a model is a pure transformation. Only `Joined` and
//! `Confirmed` participants are eligible; exclusions naming anyone else
//! are dropped since they cannot constrain the draw.

mod constraint;
mod participant;

pub use constraint::ConstraintModel;
pub use participant::{
    eligible_roster, Exclusion, GroupId, Participant, ParticipantId, ParticipantStatus,
};
