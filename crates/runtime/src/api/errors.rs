//! Error types surfaced by the session API.
//!
//! Domain errors (`WalletError`, `StakeError`, `RewardError`) are recoverable:
//! each leaves the session in a well-defined state so the player can retry.
//! [`RuntimeError`] adds the plumbing failures of talking to the worker.

use thiserror::Error;
use tokio::sync::oneshot;

use client_blockchain_core::ChainError;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider found")]
    NotFound,

    #[error("wallet request rejected by user")]
    UserRejected,

    #[error("network switch failed: {0}")]
    NetworkSwitchFailed(String),

    #[error("wallet unavailable: {0}")]
    Unavailable(String),
}

impl WalletError {
    /// Maps a failed `connect` call.
    pub(crate) fn from_connect(err: ChainError) -> Self {
        match err {
            ChainError::ProviderMissing => WalletError::NotFound,
            ChainError::UserRejected => WalletError::UserRejected,
            other => WalletError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeError {
    #[error("no plays left today")]
    QuotaExhausted,

    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("wallet is on the wrong network")]
    WrongNetwork,

    #[error("insufficient balance for stake")]
    InsufficientBalance,

    #[error("stake transfer failed: {0}")]
    TransferFailed(String),

    #[error("chain request timed out")]
    Timeout,

    #[error("another chain operation is in progress")]
    OperationInProgress,

    #[error("quota storage failed: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("treasury cannot cover the reward")]
    InsufficientTreasury,

    #[error("reward transfer failed: {0}")]
    TransferFailed(String),

    #[error("chain request timed out")]
    Timeout,

    #[error("no wallet to pay the reward to")]
    NoWallet,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Stake(#[from] StakeError),

    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("wallet not connected")]
    NotConnected,

    #[error("runtime requires a {0} before building")]
    MissingCollaborator(&'static str),

    #[error("balance query failed: {0}")]
    Balance(#[source] ChainError),

    #[error("cannot {action} while the run is {state}")]
    InvalidState {
        action: &'static str,
        state: game_core::RunState,
    },

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl From<game_core::TransitionError> for RuntimeError {
    fn from(err: game_core::TransitionError) -> Self {
        RuntimeError::InvalidState {
            action: err.action,
            state: err.state,
        }
    }
}
