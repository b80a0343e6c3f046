use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{ChainError, ChainSession, TxHash};
use game_core::{Address, ChainId, DailyQuota, Notice, StakeRequirement, WalletSession};

use super::{Timed, timed};
use crate::api::StakeError;
use crate::events::{Event, EventBus, RunEvent};
use crate::repository::PersistentQuotaStore;
use crate::runtime::SessionConfig;

/// Decides whether a play may start and collects the stake.
///
/// Checks run in a fixed order and stop at the first failure: quota, wallet
/// connection, network, balance. Only then is the transfer submitted. The
/// quota is read here but never written.
#[derive(Clone)]
pub struct StakeGate {
    chain: Arc<dyn ChainSession>,
    quota: PersistentQuotaStore,
    stake: StakeRequirement,
    max_plays_per_day: u32,
    required_chain: ChainId,
    bank: Address,
    timeout: Duration,
    asset_symbol: String,
    events: EventBus,
}

impl StakeGate {
    pub fn new(
        chain: Arc<dyn ChainSession>,
        quota: PersistentQuotaStore,
        config: &SessionConfig,
        events: EventBus,
    ) -> Self {
        Self {
            chain,
            quota,
            stake: config.game.stake,
            max_plays_per_day: config.game.max_plays_per_day,
            required_chain: config.required_network.chain_id,
            bank: config.bank_address,
            timeout: config.chain_timeout,
            asset_symbol: config.game.asset_symbol.clone(),
            events,
        }
    }

    /// Checks that need no chain call. Returns the paying address.
    pub fn preflight(&self, session: &WalletSession) -> Result<Address, StakeError> {
        let quota = self.today()?;
        if quota.is_exhausted(self.max_plays_per_day) {
            return Err(StakeError::QuotaExhausted);
        }
        let address = session
            .active_address()
            .ok_or(StakeError::WalletNotConnected)?;
        if !session.is_on(self.required_chain) {
            return Err(StakeError::WrongNetwork);
        }
        Ok(address)
    }

    /// Balance check, transfer to the bank and confirmation wait.
    pub async fn collect(&self, payer: Address) -> Result<TxHash, StakeError> {
        let balance = self
            .bounded(self.chain.balance_of(&payer, &self.stake.asset))
            .await?;
        if balance < self.stake.amount {
            tracing::warn!(%payer, balance = balance.units(), "insufficient balance for stake");
            return Err(StakeError::InsufficientBalance);
        }

        self.events.notice(Notice::SendingStake);
        let tx = self
            .bounded(
                self.chain
                    .transfer(&self.stake.asset, &self.bank, self.stake.amount),
            )
            .await?;
        self.events
            .publish(Event::Run(RunEvent::StakeSubmitted { tx: tx.clone() }));

        self.bounded(self.chain.wait_confirmed(&tx)).await?;
        tracing::info!(%payer, %tx, "stake confirmed");
        Ok(tx)
    }

    /// Runs every check and collects the stake.
    pub async fn attempt_stake(&self, session: &WalletSession) -> Result<TxHash, StakeError> {
        let payer = self.preflight(session)?;
        self.collect(payer).await
    }

    pub fn today(&self) -> Result<DailyQuota, StakeError> {
        self.quota.today().map_err(|err| {
            tracing::error!("failed to read play quota: {}", err);
            StakeError::Storage(err.to_string())
        })
    }

    pub fn insufficient_balance_notice(&self) -> Notice {
        Notice::InsufficientBalance {
            symbol: self.asset_symbol.clone(),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, StakeError> {
        match timed(self.timeout, call).await {
            Timed::Done(value) => Ok(value),
            Timed::Failed(err) => Err(StakeError::TransferFailed(err.to_string())),
            Timed::TimedOut => Err(StakeError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{Asset, InMemoryChain, TokenAmount};
    use game_core::CalendarDate;

    use crate::repository::{FixedDateSource, InMemoryStore};

    const PLAYER: Address = Address::from_bytes([0x11; 20]);
    const BANK: Address = Address::from_bytes([0xba; 20]);
    const PHAROS: ChainId = ChainId(0xa8230);
    const STAKE: TokenAmount = TokenAmount::from_units(1_000);

    fn gate(chain: &InMemoryChain, plays_used: u32) -> StakeGate {
        let store = Arc::new(InMemoryStore::new());
        let dates = Arc::new(FixedDateSource::new(CalendarDate::new(2026, 10, 18)));
        let quota = PersistentQuotaStore::new(store, dates, "plays");
        for _ in 0..plays_used {
            quota.increment().unwrap();
        }
        let mut config = SessionConfig {
            bank_address: BANK,
            ..SessionConfig::default()
        };
        config.game.stake = StakeRequirement {
            amount: STAKE,
            asset: Asset::Native,
        };
        StakeGate::new(Arc::new(chain.clone()), quota, &config, EventBus::new())
    }

    fn connected() -> WalletSession {
        WalletSession::connected(PLAYER, PHAROS)
    }

    #[tokio::test]
    async fn exhausted_quota_wins_over_every_other_check() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        let gate = gate(&chain, 3);
        assert_eq!(
            gate.attempt_stake(&WalletSession::empty()).await,
            Err(StakeError::QuotaExhausted)
        );
        assert_eq!(chain.calls().balance_of, 0);
    }

    #[tokio::test]
    async fn checks_connection_before_network() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        let gate = gate(&chain, 0);
        assert_eq!(
            gate.attempt_stake(&WalletSession::empty()).await,
            Err(StakeError::WalletNotConnected)
        );
        assert_eq!(
            gate.attempt_stake(&WalletSession::connected(PLAYER, ChainId(1)))
                .await,
            Err(StakeError::WrongNetwork)
        );
        assert_eq!(chain.calls().balance_of, 0);
    }

    #[tokio::test]
    async fn low_balance_submits_nothing() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        chain.fund(PLAYER, Asset::Native, TokenAmount(999));
        let gate = gate(&chain, 0);
        assert_eq!(
            gate.attempt_stake(&connected()).await,
            Err(StakeError::InsufficientBalance)
        );
        assert_eq!(chain.calls().transfer, 0);
    }

    #[tokio::test]
    async fn pays_the_bank_and_leaves_quota_alone() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        chain.fund(PLAYER, Asset::Native, STAKE);
        let gate = gate(&chain, 1);

        gate.attempt_stake(&connected()).await.unwrap();

        assert_eq!(chain.balance(BANK, Asset::Native), STAKE);
        assert_eq!(gate.today().unwrap().plays_used, 1);
    }

    #[tokio::test]
    async fn maps_adapter_failures() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        chain.fund(PLAYER, Asset::Native, STAKE);
        let gate = gate(&chain, 0);

        chain.fail_next_transfer(ChainError::UserRejected);
        assert!(matches!(
            gate.attempt_stake(&connected()).await,
            Err(StakeError::TransferFailed(_))
        ));

        chain.revert_next_confirmation();
        assert!(matches!(
            gate.attempt_stake(&connected()).await,
            Err(StakeError::TransferFailed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_confirmation_times_out() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        chain.fund(PLAYER, Asset::Native, STAKE);
        chain.hold_confirmations();
        let gate = gate(&chain, 0);

        assert_eq!(
            gate.attempt_stake(&connected()).await,
            Err(StakeError::Timeout)
        );
    }
}
