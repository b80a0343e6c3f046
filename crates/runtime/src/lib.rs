//! Session runtime for the wallet-gated lighthouse run.
//!
//! This crate wires the pure rules from `game-core` to a wallet/chain
//! collaborator, durable quota storage and a topic-based event bus.
//! Consumers build a [`Runtime`] and drive it through [`SessionHandle`]:
//! connect, start, per-frame ticks, collision reports and reward claims.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, builder and session configuration
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`services`] holds the stake gate, reward settler and wallet calls
//! - [`repository`] persists the daily play quota
//! - `workers` keeps the session actor internal to the crate
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod services;

mod workers;

pub use api::{
    ClaimStatus, Result, RewardError, RuntimeError, SessionHandle, SessionSnapshot, StakeError,
    WalletError,
};
pub use events::{Event, EventBus, RewardEvent, RunEvent, Topic, WalletEvent};
pub use repository::{
    DateSource, FileStore, FixedDateSource, InMemoryStore, KeyValueStore, LocalDateSource,
    PersistentQuotaStore, QuotaRecord, RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, SessionConfig};
pub use services::{BalanceQuery, RewardSettler, StakeGate, WalletConnector};
