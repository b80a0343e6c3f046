use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{ChainError, ChainSession, ConnectedAccount, NetworkParams};
use game_core::{Address, Asset, TokenAmount};

use super::{Timed, timed};
use crate::api::WalletError;
use crate::events::{Event, EventBus, WalletEvent};
use crate::runtime::SessionConfig;

/// Connects the player's wallet and moves it onto the required network.
#[derive(Clone)]
pub struct WalletConnector {
    chain: Arc<dyn ChainSession>,
    network: NetworkParams,
    timeout: Duration,
}

impl WalletConnector {
    pub fn new(chain: Arc<dyn ChainSession>, config: &SessionConfig) -> Self {
        Self {
            chain,
            network: config.required_network.clone(),
            timeout: config.chain_timeout,
        }
    }

    /// Requests an account, then switches networks if the wallet is elsewhere.
    /// The switch adds the network first when the wallet does not know it.
    pub async fn connect(&self) -> Result<ConnectedAccount, WalletError> {
        let account = match timed(self.timeout, self.chain.connect()).await {
            Timed::Done(account) => account,
            Timed::Failed(err) => return Err(WalletError::from_connect(err)),
            Timed::TimedOut => return Err(WalletError::Unavailable("connect timed out".into())),
        };

        if account.chain_id == self.network.chain_id {
            return Ok(account);
        }

        tracing::info!(
            from = %account.chain_id,
            to = %self.network.chain_id,
            "switching wallet network"
        );
        match timed(self.timeout, self.chain.ensure_network(&self.network)).await {
            Timed::Done(()) => Ok(ConnectedAccount {
                address: account.address,
                chain_id: self.network.chain_id,
            }),
            Timed::Failed(err) => Err(WalletError::NetworkSwitchFailed(err.to_string())),
            Timed::TimedOut => Err(WalletError::NetworkSwitchFailed(
                "network switch timed out".into(),
            )),
        }
    }
}

/// Reads the stake asset balance and publishes it for display.
#[derive(Clone)]
pub struct BalanceQuery {
    chain: Arc<dyn ChainSession>,
    asset: Asset,
    timeout: Duration,
    events: EventBus,
}

impl BalanceQuery {
    pub fn new(chain: Arc<dyn ChainSession>, config: &SessionConfig, events: EventBus) -> Self {
        Self {
            chain,
            asset: config.game.stake.asset,
            timeout: config.chain_timeout,
            events,
        }
    }

    pub async fn refresh(&self, address: Address) -> Result<TokenAmount, ChainError> {
        let result = match timed(self.timeout, self.chain.balance_of(&address, &self.asset)).await
        {
            Timed::Done(amount) => Ok(amount),
            Timed::Failed(err) => Err(err),
            Timed::TimedOut => Err(ChainError::Network("balance query timed out".into())),
        };
        let event = match &result {
            Ok(amount) => WalletEvent::BalanceUpdated { amount: *amount },
            Err(err) => {
                tracing::warn!(%address, "balance query failed: {}", err);
                WalletEvent::BalanceUnavailable
            }
        };
        self.events.publish(Event::Wallet(event));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{ChainId, InMemoryChain};

    const PLAYER: Address = Address::from_bytes([0x11; 20]);

    fn connector(chain: &InMemoryChain) -> WalletConnector {
        WalletConnector::new(Arc::new(chain.clone()), &SessionConfig::default())
    }

    #[tokio::test]
    async fn connect_moves_wallet_to_required_network() {
        let chain = InMemoryChain::new(PLAYER, ChainId(1));
        let account = connector(&chain).connect().await.unwrap();

        let required = NetworkParams::pharos_testnet().chain_id;
        assert_eq!(account.chain_id, required);
        assert_eq!(chain.wallet_chain(), Some(required));
        assert_eq!(chain.calls().add_network, 1);
    }

    #[tokio::test]
    async fn maps_connect_failures() {
        let chain = InMemoryChain::new(PLAYER, ChainId(1));
        chain.reject_connect(true);
        assert_eq!(
            connector(&chain).connect().await,
            Err(WalletError::UserRejected)
        );

        chain.remove_provider();
        assert_eq!(connector(&chain).connect().await, Err(WalletError::NotFound));
    }

    #[tokio::test]
    async fn rejected_switch_surfaces_as_switch_failure() {
        let chain = InMemoryChain::new(PLAYER, ChainId(1));
        chain.reject_network_switch(true);
        assert!(matches!(
            connector(&chain).connect().await,
            Err(WalletError::NetworkSwitchFailed(_))
        ));
    }

    #[tokio::test]
    async fn balance_refresh_publishes_failure_marker() {
        let chain = InMemoryChain::new(PLAYER, ChainId(1));
        let events = EventBus::new();
        let mut rx = events.subscribe(crate::events::Topic::Wallet);
        let query = BalanceQuery::new(Arc::new(chain.clone()), &SessionConfig::default(), events);

        chain.fail_next_balance_query(ChainError::Network("down".into()));
        assert!(query.refresh(PLAYER).await.is_err());
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::Wallet(WalletEvent::BalanceUnavailable)
        );
    }
}
