use crate::types::{Address, TokenAmount};

/// Reward owed to the player for a won run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingReward {
    pub recipient: Address,
    pub amount: TokenAmount,
    pub settled: bool,
    /// Transaction that settled the reward, once confirmed.
    pub settlement_tx: Option<String>,
}

impl PendingReward {
    pub fn new(recipient: Address, amount: TokenAmount) -> Self {
        Self {
            recipient,
            amount,
            settled: false,
            settlement_tx: None,
        }
    }

    /// Marks the reward settled. Settling twice keeps the first transaction.
    pub fn settle(&mut self, tx: impl Into<String>) {
        if !self.settled {
            self.settled = true;
            self.settlement_tx = Some(tx.into());
        }
    }
}
