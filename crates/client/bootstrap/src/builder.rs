//! Builds a session runtime backed by on-disk quota storage.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use client_blockchain_core::ChainSession;
use runtime::{FileStore, Runtime};

use crate::config::BootstrapConfig;

/// Assembles the runtime from configuration plus the two chain signers.
pub struct SessionBuilder {
    config: BootstrapConfig,
    wallet: Option<Arc<dyn ChainSession>>,
    treasury: Option<Arc<dyn ChainSession>>,
    seed: Option<u64>,
}

impl SessionBuilder {
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            wallet: None,
            treasury: None,
            seed: None,
        }
    }

    /// Chain session signing as the player (required).
    pub fn wallet(mut self, wallet: impl ChainSession + 'static) -> Self {
        self.wallet = Some(Arc::new(wallet));
        self
    }

    /// Chain session signing as the bank (required).
    pub fn treasury(mut self, treasury: impl ChainSession + 'static) -> Self {
        self.treasury = Some(Arc::new(treasury));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub async fn build(self) -> Result<SessionSetup> {
        let wallet = self
            .wallet
            .context("Wallet session is required. Use .wallet() to set it.")?;
        let treasury = self
            .treasury
            .context("Treasury session is required. Use .treasury() to set it.")?;

        let data_dir = match &self.config.save_data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        let store = FileStore::new(&data_dir)
            .with_context(|| format!("opening save data in {}", data_dir.display()))?;
        tracing::info!("Quota record stored in {}", data_dir.display());

        let mut builder = Runtime::builder()
            .config(self.config.session.clone())
            .wallet(wallet)
            .treasury(treasury)
            .store(Arc::new(store));
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        let runtime = builder.build().await?;

        Ok(SessionSetup {
            config: self.config,
            data_dir,
            runtime,
        })
    }
}

pub struct SessionSetup {
    pub config: BootstrapConfig,
    pub data_dir: PathBuf,
    pub runtime: Runtime,
}

/// Platform data directory for the lighthouse game.
pub fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("xyz", "pharos", "lighthouse")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("no home directory to keep save data in")
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{ChainId, InMemoryChain};
    use game_core::Address;

    #[tokio::test]
    async fn quota_record_lands_in_save_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = BootstrapConfig {
            save_data_dir: Some(dir.path().to_path_buf()),
            ..BootstrapConfig::default()
        };
        let bank = config.session.bank_address;
        let chain = InMemoryChain::new(Address::from_bytes([1; 20]), ChainId(0xa8230));

        let setup = SessionBuilder::new(config)
            .wallet(chain.clone())
            .treasury(chain.signer(bank))
            .build()
            .await
            .unwrap();

        assert_eq!(setup.data_dir, dir.path());
        assert!(dir.path().join("pharos_game_plays.json").exists());
        setup.runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn missing_treasury_is_reported() {
        let chain = InMemoryChain::new(Address::from_bytes([1; 20]), ChainId(0xa8230));
        let result = SessionBuilder::new(BootstrapConfig::default())
            .wallet(chain)
            .build()
            .await;
        assert!(result.is_err());
    }
}
