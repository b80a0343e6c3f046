//! In-memory chain for tests and offline play.
//!
//! Simulates a wallet provider and a ledger of balances. Several
//! [`InMemoryChain`] handles can share one ledger while signing as different
//! accounts (the player's wallet and the game treasury, for instance).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use game_core::{Address, Asset, ChainId, TokenAmount};
use tokio::sync::watch;

use crate::traits::{ChainError, ChainSession};
use crate::types::{ConnectedAccount, NetworkParams, Receipt, TxHash};

/// Number of calls made through each method, for asserting on side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub connect: u32,
    pub switch_network: u32,
    pub add_network: u32,
    pub balance_of: u32,
    pub transfer: u32,
    pub wait_confirmed: u32,
}

/// A submitted transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub asset: Asset,
    pub amount: TokenAmount,
    pub confirmed: bool,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(Address, Asset), TokenAmount>,
    wallet_chain: Option<ChainId>,
    known_networks: HashSet<ChainId>,
    provider_missing: bool,
    reject_connect: bool,
    reject_switch: bool,
    fail_next_balance: Option<ChainError>,
    fail_next_transfer: Option<ChainError>,
    revert_next_confirmation: bool,
    confirmation_delay: Duration,
    connect_delay: Duration,
    transfers: Vec<TransferRecord>,
    block_number: u64,
    calls: CallCounts,
}

struct Shared {
    state: Mutex<LedgerState>,
    /// `true` while confirmations are held back.
    hold: watch::Sender<bool>,
}

/// Wallet + ledger simulation signing as one account.
#[derive(Clone)]
pub struct InMemoryChain {
    shared: Arc<Shared>,
    account: Address,
}

impl InMemoryChain {
    /// Creates a ledger with a wallet for `account` sitting on `chain_id`.
    pub fn new(account: Address, chain_id: ChainId) -> Self {
        let state = LedgerState {
            wallet_chain: Some(chain_id),
            known_networks: HashSet::from([chain_id]),
            ..LedgerState::default()
        };
        let (hold, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                hold,
            }),
            account,
        }
    }

    /// Another handle on the same ledger signing as `account`.
    pub fn signer(&self, account: Address) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            account,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn fund(&self, address: Address, asset: Asset, amount: TokenAmount) {
        let mut state = self.state();
        let balance = state.balances.entry((address, asset)).or_default();
        *balance = balance.checked_add(amount).unwrap_or(TokenAmount(u128::MAX));
    }

    pub fn balance(&self, address: Address, asset: Asset) -> TokenAmount {
        self.state()
            .balances
            .get(&(address, asset))
            .copied()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.state().transfers.clone()
    }

    pub fn wallet_chain(&self) -> Option<ChainId> {
        self.state().wallet_chain
    }

    /// Moves the wallet to another network, as a user would in the extension.
    pub fn set_wallet_chain(&self, chain_id: ChainId) {
        let mut state = self.state();
        state.known_networks.insert(chain_id);
        state.wallet_chain = Some(chain_id);
    }

    pub fn forget_network(&self, chain_id: ChainId) {
        self.state().known_networks.remove(&chain_id);
    }

    pub fn remove_provider(&self) {
        self.state().provider_missing = true;
    }

    pub fn reject_connect(&self, reject: bool) {
        self.state().reject_connect = reject;
    }

    pub fn reject_network_switch(&self, reject: bool) {
        self.state().reject_switch = reject;
    }

    pub fn fail_next_balance_query(&self, error: ChainError) {
        self.state().fail_next_balance = Some(error);
    }

    pub fn fail_next_transfer(&self, error: ChainError) {
        self.state().fail_next_transfer = Some(error);
    }

    pub fn revert_next_confirmation(&self) {
        self.state().revert_next_confirmation = true;
    }

    pub fn set_confirmation_delay(&self, delay: Duration) {
        self.state().confirmation_delay = delay;
    }

    /// Makes `connect` take `delay`, like a user sitting on the approval popup.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state().connect_delay = delay;
    }

    /// Keeps every `wait_confirmed` call pending until released.
    pub fn hold_confirmations(&self) {
        self.shared.hold.send_replace(true);
    }

    pub fn release_confirmations(&self) {
        self.shared.hold.send_replace(false);
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChainSession for InMemoryChain {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn connect(&self) -> Result<ConnectedAccount, ChainError> {
        let delay = {
            let mut state = self.state();
            state.calls.connect += 1;
            state.connect_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if state.provider_missing {
            return Err(ChainError::ProviderMissing);
        }
        if state.reject_connect {
            return Err(ChainError::UserRejected);
        }
        let chain_id = state
            .wallet_chain
            .ok_or_else(|| ChainError::Malformed("wallet reports no chain".to_string()))?;
        Ok(ConnectedAccount {
            address: self.account,
            chain_id,
        })
    }

    async fn switch_network(&self, chain_id: ChainId) -> Result<(), ChainError> {
        let mut state = self.state();
        state.calls.switch_network += 1;
        if state.reject_switch {
            return Err(ChainError::UserRejected);
        }
        if !state.known_networks.contains(&chain_id) {
            return Err(ChainError::UnknownNetwork(chain_id));
        }
        state.wallet_chain = Some(chain_id);
        Ok(())
    }

    async fn add_network(&self, params: &NetworkParams) -> Result<(), ChainError> {
        let mut state = self.state();
        state.calls.add_network += 1;
        if state.reject_switch {
            return Err(ChainError::UserRejected);
        }
        state.known_networks.insert(params.chain_id);
        Ok(())
    }

    async fn balance_of(
        &self,
        address: &Address,
        asset: &Asset,
    ) -> Result<TokenAmount, ChainError> {
        let mut state = self.state();
        state.calls.balance_of += 1;
        if let Some(error) = state.fail_next_balance.take() {
            return Err(error);
        }
        Ok(state
            .balances
            .get(&(*address, *asset))
            .copied()
            .unwrap_or_default())
    }

    async fn transfer(
        &self,
        asset: &Asset,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.state();
        state.calls.transfer += 1;
        if let Some(error) = state.fail_next_transfer.take() {
            return Err(error);
        }
        let tx_hash = TxHash(format!("0x{:064x}", state.transfers.len() + 1));
        state.transfers.push(TransferRecord {
            tx_hash: tx_hash.clone(),
            from: self.account,
            to: *to,
            asset: *asset,
            amount,
            confirmed: false,
        });
        tracing::debug!(tx = %tx_hash, from = %self.account, to = %to, "transfer submitted");
        Ok(tx_hash)
    }

    async fn wait_confirmed(&self, tx: &TxHash) -> Result<Receipt, ChainError> {
        let delay = {
            let mut state = self.state();
            state.calls.wait_confirmed += 1;
            state.confirmation_delay
        };

        let mut held = self.shared.hold.subscribe();
        while *held.borrow_and_update() {
            if held.changed().await.is_err() {
                break;
            }
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if std::mem::take(&mut state.revert_next_confirmation) {
            return Err(ChainError::Reverted("execution reverted".to_string()));
        }

        let index = state
            .transfers
            .iter()
            .position(|record| &record.tx_hash == tx)
            .ok_or_else(|| ChainError::Malformed(format!("unknown transaction {tx}")))?;
        let record = state.transfers[index].clone();
        if record.confirmed {
            return Ok(Receipt {
                tx_hash: tx.clone(),
                block_number: state.block_number,
            });
        }

        let from_balance = state
            .balances
            .get(&(record.from, record.asset))
            .copied()
            .unwrap_or_default();
        let remaining = from_balance
            .checked_sub(record.amount)
            .ok_or(ChainError::InsufficientFunds)?;
        state.balances.insert((record.from, record.asset), remaining);
        let credited = state.balances.entry((record.to, record.asset)).or_default();
        *credited = credited
            .checked_add(record.amount)
            .unwrap_or(TokenAmount(u128::MAX));

        state.transfers[index].confirmed = true;
        state.block_number += 1;
        Ok(Receipt {
            tx_hash: tx.clone(),
            block_number: state.block_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: Address = Address::from_bytes([1; 20]);
    const BANK: Address = Address::from_bytes([2; 20]);
    const PHAROS: ChainId = ChainId(0xa8230);

    #[tokio::test]
    async fn transfer_moves_funds_on_confirmation() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        chain.fund(PLAYER, Asset::Native, TokenAmount(10));

        let tx = chain
            .transfer(&Asset::Native, &BANK, TokenAmount(4))
            .await
            .unwrap();
        assert_eq!(chain.balance(BANK, Asset::Native), TokenAmount(0));

        let receipt = chain.wait_confirmed(&tx).await.unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(chain.balance(PLAYER, Asset::Native), TokenAmount(6));
        assert_eq!(chain.balance(BANK, Asset::Native), TokenAmount(4));
    }

    #[tokio::test]
    async fn overdrawn_transfer_reverts() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        let tx = chain
            .transfer(&Asset::Native, &BANK, TokenAmount(1))
            .await
            .unwrap();
        assert_eq!(
            chain.wait_confirmed(&tx).await,
            Err(ChainError::InsufficientFunds)
        );
    }

    #[tokio::test]
    async fn ensure_network_adds_unknown_chain_then_switches() {
        let other = ChainId(1);
        let chain = InMemoryChain::new(PLAYER, other);
        chain.forget_network(PHAROS);

        chain
            .ensure_network(&NetworkParams::pharos_testnet())
            .await
            .unwrap();

        assert_eq!(chain.wallet_chain(), Some(PHAROS));
        let calls = chain.calls();
        assert_eq!(calls.switch_network, 2);
        assert_eq!(calls.add_network, 1);
    }

    #[tokio::test]
    async fn ensure_network_surfaces_user_rejection() {
        let chain = InMemoryChain::new(PLAYER, ChainId(1));
        chain.reject_network_switch(true);
        assert_eq!(
            chain.ensure_network(&NetworkParams::pharos_testnet()).await,
            Err(ChainError::UserRejected)
        );
        assert_eq!(chain.calls().add_network, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn held_confirmations_wait_for_release() {
        let chain = InMemoryChain::new(PLAYER, PHAROS);
        chain.fund(PLAYER, Asset::Native, TokenAmount(1));
        chain.hold_confirmations();
        let tx = chain
            .transfer(&Asset::Native, &BANK, TokenAmount(1))
            .await
            .unwrap();

        let waiter = {
            let chain = chain.clone();
            tokio::spawn(async move { chain.wait_confirmed(&tx).await })
        };
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!waiter.is_finished());

        chain.release_confirmations();
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn signers_share_one_ledger() {
        let player = InMemoryChain::new(PLAYER, PHAROS);
        let treasury = player.signer(BANK);
        treasury.fund(BANK, Asset::Native, TokenAmount(5));

        let tx = treasury
            .transfer(&Asset::Native, &PLAYER, TokenAmount(5))
            .await
            .unwrap();
        treasury.wait_confirmed(&tx).await.unwrap();
        assert_eq!(player.balance(PLAYER, Asset::Native), TokenAmount(5));
        assert_eq!(player.transfers()[0].from, BANK);
    }
}
