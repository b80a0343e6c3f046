//! Deterministic rules of the lighthouse run shared across clients.
//!
//! `game-core` defines the session data model, the [`RunController`] state
//! machine that drives a single paid run, the [`ObstacleScheduler`] that emits
//! waves while a run is active, and the calendar bookkeeping behind the daily
//! play quota. Everything here is synchronous and free of I/O; the runtime crate
//! wraps it with wallet, chain and storage collaborators.
pub mod config;
pub mod notice;
pub mod quota;
pub mod reward;
pub mod run;
pub mod types;

pub use config::{GameConfig, RewardPolicy, SchedulerConfig, StakeRequirement};
pub use notice::Notice;
pub use quota::{CalendarDate, DailyQuota, DateParseError};
pub use reward::PendingReward;
pub use run::{
    CollisionKind, CountdownStep, Obstacle, ObstacleId, ObstacleScheduler, RunController,
    RunOutcome, RunState, TickReport, TransitionError, Vec2,
};
pub use types::{
    Address, AddressError, AmountError, Asset, ChainId, TokenAmount, WalletSession,
};
