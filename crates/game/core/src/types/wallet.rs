use super::{Address, ChainId};

/// Wallet binding for the current page/process.
///
/// `connected` implies `address.is_some()`; the constructors are the only way
/// to set both together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalletSession {
    pub address: Option<Address>,
    pub connected: bool,
    pub chain_id: Option<ChainId>,
}

impl WalletSession {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self {
            address: Some(address),
            connected: true,
            chain_id: Some(chain_id),
        }
    }

    /// Address of a connected wallet, `None` otherwise.
    pub fn active_address(&self) -> Option<Address> {
        if self.connected { self.address } else { None }
    }

    pub fn is_on(&self, chain_id: ChainId) -> bool {
        self.chain_id == Some(chain_id)
    }

    pub fn clear(&mut self) {
        *self = Self::empty();
    }
}
