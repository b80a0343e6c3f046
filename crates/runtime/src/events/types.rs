//! Event types for different topics.

use client_blockchain_core::TxHash;
use game_core::{
    Address, ChainId, DailyQuota, Obstacle, ObstacleId, PendingReward, RunOutcome, TokenAmount,
};
use serde::{Deserialize, Serialize};

/// Wallet connection and balance changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalletEvent {
    Connected { address: Address, chain_id: ChainId },
    Disconnected,
    /// The wallet moved to another network.
    NetworkChanged { chain_id: ChainId, on_required: bool },
    BalanceUpdated { amount: TokenAmount },
    /// The balance query failed; the UI shows an error marker instead.
    BalanceUnavailable,
}

/// Progress of the current run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    StakeSubmitted { tx: TxHash },
    StakeConfirmed { tx: TxHash },
    /// Seconds left before the run starts.
    CountdownTick(u32),
    Started,
    ObstaclesUpdated {
        spawned: Vec<Obstacle>,
        removed: Vec<ObstacleId>,
    },
    Concluded {
        outcome: RunOutcome,
        quota: DailyQuota,
    },
    /// The controller returned to idle after a lost run.
    Reset,
}

/// Reward settlement after a won run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RewardEvent {
    /// Reward awaiting settlement (claim-gated policy, or a retry).
    Pending(PendingReward),
    Settled { tx: TxHash },
    Failed(String),
}
