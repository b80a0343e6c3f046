//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod errors;
pub mod handle;
pub mod types;

pub use errors::{Result, RewardError, RuntimeError, StakeError, WalletError};
pub use handle::SessionHandle;
pub use types::{ClaimStatus, SessionSnapshot};
