use core::fmt;
use core::str::FromStr;

/// 20-byte account address, rendered as lowercase `0x`-prefixed hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("address must have 40 hex digits, found {0}")]
    InvalidLength(usize),

    #[error("address contains non-hex characters: {0}")]
    InvalidHex(String),
}

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parses a `0x`-prefixed address. Checksum casing is accepted but not verified.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;

        if digits.len() != 40 {
            return Err(AddressError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressError::InvalidHex(trimmed.to_string()))?;
        Ok(Self(bytes))
    }

    /// Short display form used in wallet badges, e.g. `0x6ec8...989b`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checksummed_address_and_renders_lowercase() {
        let address = Address::parse("0x6EC8C121043357aC231E36D403EdAbf90AE6989B").unwrap();
        assert_eq!(
            address.to_string(),
            "0x6ec8c121043357ac231e36d403edabf90ae6989b"
        );
        assert_eq!(address.short(), "0x6ec8...989b");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(matches!(
            Address::parse("6ec8c121043357ac231e36d403edabf90ae6989b"),
            Err(AddressError::MissingPrefix(_))
        ));
        assert_eq!(Address::parse("0x1234"), Err(AddressError::InvalidLength(4)));
        assert!(matches!(
            Address::parse("0xzzc8c121043357ac231e36d403edabf90ae6989b"),
            Err(AddressError::InvalidHex(_))
        ));
    }
}
