use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{ChainError, ChainSession, TxHash};
use game_core::{Address, Asset, PendingReward};

use super::{Timed, timed};
use crate::api::RewardError;
use crate::runtime::SessionConfig;

/// Pays rewards out of the bank account.
///
/// `treasury` must sign as the bank address; rewards are sent in the stake
/// asset.
#[derive(Clone)]
pub struct RewardSettler {
    treasury: Arc<dyn ChainSession>,
    bank: Address,
    asset: Asset,
    timeout: Duration,
}

impl RewardSettler {
    pub fn new(treasury: Arc<dyn ChainSession>, config: &SessionConfig) -> Self {
        Self {
            treasury,
            bank: config.bank_address,
            asset: config.game.stake.asset,
            timeout: config.chain_timeout,
        }
    }

    pub async fn settle(&self, reward: &PendingReward) -> Result<TxHash, RewardError> {
        let available = self
            .bounded(self.treasury.balance_of(&self.bank, &self.asset))
            .await?;
        if available < reward.amount {
            tracing::warn!(
                available = available.units(),
                owed = reward.amount.units(),
                "treasury cannot cover reward"
            );
            return Err(RewardError::InsufficientTreasury);
        }

        let tx = self
            .bounded(
                self.treasury
                    .transfer(&self.asset, &reward.recipient, reward.amount),
            )
            .await?;
        self.bounded(self.treasury.wait_confirmed(&tx)).await?;
        tracing::info!(recipient = %reward.recipient, %tx, "reward settled");
        Ok(tx)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, RewardError> {
        match timed(self.timeout, call).await {
            Timed::Done(value) => Ok(value),
            Timed::Failed(err) => Err(RewardError::TransferFailed(err.to_string())),
            Timed::TimedOut => Err(RewardError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{ChainId, InMemoryChain, TokenAmount};

    const PLAYER: Address = Address::from_bytes([0x11; 20]);
    const BANK: Address = Address::from_bytes([0xba; 20]);

    fn settler(chain: &InMemoryChain) -> RewardSettler {
        let config = SessionConfig {
            bank_address: BANK,
            ..SessionConfig::default()
        };
        RewardSettler::new(Arc::new(chain.signer(BANK)), &config)
    }

    fn reward() -> PendingReward {
        PendingReward::new(PLAYER, TokenAmount(10))
    }

    #[tokio::test]
    async fn pays_the_recipient_from_the_bank() {
        let chain = InMemoryChain::new(PLAYER, ChainId(0xa8230));
        let asset = SessionConfig::default().game.stake.asset;
        chain.fund(BANK, asset, TokenAmount(25));

        settler(&chain).settle(&reward()).await.unwrap();

        assert_eq!(chain.balance(PLAYER, asset), TokenAmount(10));
        assert_eq!(chain.balance(BANK, asset), TokenAmount(15));
    }

    #[tokio::test]
    async fn empty_treasury_submits_nothing() {
        let chain = InMemoryChain::new(PLAYER, ChainId(0xa8230));
        assert_eq!(
            settler(&chain).settle(&reward()).await,
            Err(RewardError::InsufficientTreasury)
        );
        assert_eq!(chain.calls().transfer, 0);
    }
}
