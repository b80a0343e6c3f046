//! Values returned by the session handle.

use client_blockchain_core::TxHash;
use game_core::{DailyQuota, Obstacle, PendingReward, RunState, WalletSession};
use serde::{Deserialize, Serialize};

/// Everything the UI needs to draw the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub wallet: WalletSession,
    pub run: RunState,
    /// `None` when the quota store could not be read.
    pub quota: Option<DailyQuota>,
    pub plays_remaining: u32,
    pub reward: Option<PendingReward>,
    pub obstacles: Vec<Obstacle>,
    /// A stake, connect or reward transaction is outstanding.
    pub busy: bool,
}

/// Result of a reward claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// No won run is waiting for a payout.
    NothingToClaim,
    /// The reward transfer is already on its way.
    InFlight,
    /// Another chain operation has to finish first.
    Busy,
    Settled { tx: TxHash },
    /// The reward was paid earlier; nothing was sent.
    AlreadySettled { tx: Option<TxHash> },
}
