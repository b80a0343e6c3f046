//! A single paid run: countdown, active play and its terminal outcome.
//!
//! [`RunController`] is the authoritative state machine. It owns the
//! [`ObstacleScheduler`] for the duration of the active phase only and tags
//! every externally timed step with a generation number so callbacks scheduled
//! for an earlier phase can be recognised and dropped.

mod controller;
mod scheduler;

pub use controller::{
    CollisionKind, CountdownStep, RunController, RunOutcome, RunState, TransitionError,
};
pub use scheduler::{Obstacle, ObstacleId, ObstacleScheduler, TickReport, Vec2};
