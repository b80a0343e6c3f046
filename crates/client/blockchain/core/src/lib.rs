//! Wallet and chain abstraction for the lighthouse game.
//!
//! The session core never talks to a wallet provider directly. Everything it
//! needs from the chain goes through [`ChainSession`]:
//!
//! ```text
//! ChainSession
//!   ├── connect / switch_network / add_network / ensure_network   (wallet)
//!   ├── balance_of                                                (reads)
//!   └── transfer / wait_confirmed                                 (writes)
//! ```
//!
//! Concrete providers (browser wallets, RPC signers) live outside this crate.
//! [`InMemoryChain`] is a self-contained ledger used by tests and the headless
//! client.
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::ChainSession;
//!
//! async fn pay(chain: &dyn ChainSession, stake: &StakeRequirement, bank: &Address) {
//!     let tx = chain.transfer(&stake.asset, bank, stake.amount).await?;
//!     chain.wait_confirmed(&tx).await?;
//! }
//! ```

pub mod ledger;
pub mod traits;
pub mod types;

pub use ledger::{CallCounts, InMemoryChain, TransferRecord};
pub use traits::{ChainError, ChainSession};
pub use types::{ConnectedAccount, NativeCurrency, NetworkParams, Receipt, TxHash};

// Value types shared with the game core.
pub use game_core::{Address, Asset, ChainId, TokenAmount};
