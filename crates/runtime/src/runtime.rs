//! High-level session runtime.
//!
//! The runtime owns the session worker, wires up command/event channels, and
//! exposes a builder-based API for clients to assemble a session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use client_blockchain_core::{ChainSession, NetworkParams};
use game_core::{Address, GameConfig};

use crate::api::{Result, RuntimeError, SessionHandle};
use crate::events::EventBus;
use crate::repository::{
    DateSource, InMemoryStore, KeyValueStore, LocalDateSource, PersistentQuotaStore,
};
use crate::services::{BalanceQuery, RewardSettler, StakeGate, WalletConnector};
use crate::workers::{Command, SessionServices, SessionWorker};

/// Session configuration shared across the runtime and its services.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub game: GameConfig,
    /// Network the wallet must be on to stake.
    pub required_network: NetworkParams,
    /// Receives stakes and pays rewards.
    pub bank_address: Address,
    /// Upper bound on every individual chain call.
    pub chain_timeout: Duration,
    /// Storage slot holding the daily play record.
    pub quota_key: String,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl SessionConfig {
    pub const DEFAULT_QUOTA_KEY: &'static str = "pharos_game_plays";
    pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_BANK_ADDRESS: Address = Address::from_bytes([
        0x6e, 0xc8, 0xc1, 0x21, 0x04, 0x33, 0x57, 0xac, 0x23, 0x1e, 0x36, 0xd4, 0x03, 0xed, 0xab,
        0xf9, 0x0a, 0xe6, 0x98, 0x9b,
    ]);
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            required_network: NetworkParams::pharos_testnet(),
            bank_address: Self::DEFAULT_BANK_ADDRESS,
            chain_timeout: Self::DEFAULT_CHAIN_TIMEOUT,
            quota_key: Self::DEFAULT_QUOTA_KEY.to_string(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Running session.
///
/// Design: Runtime owns the worker task. [`SessionHandle`] provides a
/// cloneable façade for clients.
pub struct Runtime {
    handle: SessionHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this session
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// Waits for the worker to stop, which happens once every handle clone
    /// has been dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`].
///
/// A wallet session (signing as the player) and a treasury session (signing
/// as the bank) are required. Storage defaults to memory and dates to the
/// host's local calendar.
pub struct RuntimeBuilder {
    config: SessionConfig,
    wallet: Option<Arc<dyn ChainSession>>,
    treasury: Option<Arc<dyn ChainSession>>,
    store: Option<Arc<dyn KeyValueStore>>,
    dates: Option<Arc<dyn DateSource>>,
    seed: Option<u64>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            wallet: None,
            treasury: None,
            store: None,
            dates: None,
            seed: None,
        }
    }

    /// Override session configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn wallet(mut self, wallet: Arc<dyn ChainSession>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn treasury(mut self, treasury: Arc<dyn ChainSession>) -> Self {
        self.treasury = Some(treasury);
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn dates(mut self, dates: Arc<dyn DateSource>) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Fix the obstacle RNG seed for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<Runtime> {
        let wallet = self
            .wallet
            .ok_or(RuntimeError::MissingCollaborator("wallet session"))?;
        let treasury = self
            .treasury
            .ok_or(RuntimeError::MissingCollaborator("treasury session"))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let dates = self
            .dates
            .unwrap_or_else(|| Arc::new(LocalDateSource));
        let config = self.config;

        let quota = PersistentQuotaStore::new(store, dates, config.quota_key.clone());
        let today = quota.today()?;
        tracing::info!(
            date = %today.date,
            plays_used = today.plays_used,
            wallet = wallet.name(),
            "building session runtime"
        );

        let events = EventBus::with_capacity(config.event_buffer_size);
        let services = SessionServices {
            connector: WalletConnector::new(Arc::clone(&wallet), &config),
            gate: StakeGate::new(Arc::clone(&wallet), quota.clone(), &config, events.clone()),
            settler: RewardSettler::new(treasury, &config),
            balance: BalanceQuery::new(wallet, &config, events.clone()),
            quota,
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let handle = SessionHandle::new(command_tx, events.clone());

        let worker = SessionWorker::new(
            config.game,
            config.required_network.chain_name,
            config.required_network.chain_id,
            self.seed.unwrap_or_else(rand::random),
            services,
            command_rx,
            events,
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
