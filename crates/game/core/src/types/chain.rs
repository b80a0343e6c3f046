use core::fmt;
use core::str::FromStr;

/// EVM-style network identifier. Wallets report it as a hex string (`0xa8230`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainId(pub u64);

impl ChainId {
    /// Accepts `0x`-prefixed hex or plain decimal.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(digits) => u64::from_str_radix(digits, 16).ok().map(Self),
            None => trimmed.parse().ok().map(Self),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid chain id: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_decimal_forms_agree() {
        assert_eq!(ChainId::parse("0xa8230"), Some(ChainId(688_688)));
        assert_eq!(ChainId::parse("688688"), Some(ChainId(688_688)));
        assert_eq!(ChainId(688_688).to_string(), "0xa8230");
        assert_eq!(ChainId::parse("0xnope"), None);
    }
}
