//! Value types shared by the session, the chain adapter and the UI layer.

mod address;
mod amount;
mod chain;
mod wallet;

pub use address::{Address, AddressError};
pub use amount::{AmountError, Asset, TokenAmount};
pub use chain::ChainId;
pub use wallet::WalletSession;
