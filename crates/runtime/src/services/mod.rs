//! Chain-facing operations of a session.
//!
//! Services own no session state. The session worker hands them a snapshot
//! of what they need and applies their result when they resolve, so every
//! call here may run on a spawned task.

mod reward;
mod stake;
mod wallet;

use std::future::Future;
use std::time::Duration;

use client_blockchain_core::ChainError;

pub use reward::RewardSettler;
pub use stake::StakeGate;
pub use wallet::{BalanceQuery, WalletConnector};

/// Outcome of a chain call bounded by a deadline.
pub(crate) enum Timed<T> {
    Done(T),
    Failed(ChainError),
    TimedOut,
}

pub(crate) async fn timed<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ChainError>>,
) -> Timed<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Timed::Done(value),
        Ok(Err(err)) => Timed::Failed(err),
        Err(_) => Timed::TimedOut,
    }
}
