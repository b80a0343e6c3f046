//! Chain session contract.

use async_trait::async_trait;
use game_core::{Address, Asset, ChainId, TokenAmount};

use crate::types::{ConnectedAccount, NetworkParams, Receipt, TxHash};

/// Provider-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("No wallet provider available")]
    ProviderMissing,

    #[error("Request rejected by user")]
    UserRejected,

    #[error("Network {0} is not known to the wallet")]
    UnknownNetwork(ChainId),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Insufficient funds for transfer")]
    InsufficientFunds,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Wallet connection plus the handful of chain calls a run needs.
///
/// Transfers are signed by the account this session represents: the player's
/// wallet for stakes, a treasury signer for rewards.
#[async_trait]
pub trait ChainSession: Send + Sync {
    /// Human-readable provider name for logs.
    fn name(&self) -> &str;

    /// Ask the wallet for an account.
    async fn connect(&self) -> Result<ConnectedAccount, ChainError>;

    /// Switch the wallet to `chain_id`. Fails with [`ChainError::UnknownNetwork`]
    /// when the wallet has never seen the network.
    async fn switch_network(&self, chain_id: ChainId) -> Result<(), ChainError>;

    /// Register a network with the wallet.
    async fn add_network(&self, params: &NetworkParams) -> Result<(), ChainError>;

    /// Switch to the network, adding it first if the wallet does not know it.
    async fn ensure_network(&self, params: &NetworkParams) -> Result<(), ChainError> {
        match self.switch_network(params.chain_id).await {
            Err(ChainError::UnknownNetwork(_)) => {
                tracing::debug!(chain = %params.chain_id, "network unknown to wallet, adding it");
                self.add_network(params).await?;
                self.switch_network(params.chain_id).await
            }
            other => other,
        }
    }

    async fn balance_of(&self, address: &Address, asset: &Asset)
    -> Result<TokenAmount, ChainError>;

    /// Submit a transfer; returns once the provider accepted it.
    async fn transfer(
        &self,
        asset: &Asset,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<TxHash, ChainError>;

    /// Wait until the transaction is mined. A revert surfaces as an error.
    async fn wait_confirmed(&self, tx: &TxHash) -> Result<Receipt, ChainError>;
}
