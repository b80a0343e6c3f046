//! Topic-based event bus for session events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they render.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{RewardEvent, RunEvent, WalletEvent};
