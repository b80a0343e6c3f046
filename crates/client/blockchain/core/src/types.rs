//! Common types for wallet and chain interactions.

use core::fmt;

use game_core::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Transaction hash as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account handed out by the wallet on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedAccount {
    pub address: Address,
    pub chain_id: ChainId,
}

/// Confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters a wallet needs to add an unknown network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    #[serde(with = "chain_id_hex")]
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkParams {
    /// Pharos testnet, the network the lighthouse game is deployed on.
    pub fn pharos_testnet() -> Self {
        Self {
            chain_id: ChainId(0xa8230),
            chain_name: "Pharos Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "Wrapped PHRS".to_string(),
                symbol: "WPHRS".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://testnet.dplabs-internal.com".to_string()],
            block_explorer_urls: vec!["https://testnet.pharosscan.xyz".to_string()],
        }
    }
}

/// Wallet RPCs expect chain ids as hex strings.
mod chain_id_hex {
    use game_core::ChainId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &ChainId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChainId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ChainId::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad chain id {raw}")))
    }
}
