//! Headless lighthouse client.
//!
//! Stands in for the rendering layer: it moves the player sprite, detects
//! overlaps with obstacles and the lighthouse, and feeds ticks and collision
//! reports to the session through its handle.

pub mod autoplay;
pub mod logging;

pub use autoplay::{Autoplay, PlayerModel, RunReport};
