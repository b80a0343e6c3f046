use core::fmt;

use super::Address;

/// Largest decimals count whose scale factor fits in `u128`.
const MAX_DECIMALS: u8 = 38;

/// Asset a stake or reward is denominated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Asset {
    /// The chain's native currency.
    Native,
    /// An ERC-20 style token at the given contract.
    Token(Address),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(contract) => write!(f, "token {contract}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a decimal number: {0}")]
    Invalid(String),

    #[error("amount {value} has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u8 },

    #[error("amount {0} does not fit in 128 bits")]
    Overflow(String),

    #[error("unsupported decimals count {0}")]
    UnsupportedDecimals(u8),
}

/// Amount of an asset in its smallest indivisible unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn from_units(units: u128) -> Self {
        Self(units)
    }

    pub const fn units(&self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    /// Parses a decimal string such as `"0.001"` into base units.
    pub fn parse_units(input: &str, decimals: u8) -> Result<Self, AmountError> {
        let scale = scale_factor(decimals)?;
        let value = input.trim();
        if value.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, fraction) = match value.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (value, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(AmountError::Invalid(value.to_string()));
        }
        if fraction.len() > decimals as usize {
            return Err(AmountError::TooPrecise {
                value: value.to_string(),
                decimals,
            });
        }

        let overflow = || AmountError::Overflow(value.to_string());
        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| overflow())?
        };
        let fraction_units = if fraction.is_empty() {
            0
        } else {
            let padding = scale_factor(decimals - fraction.len() as u8)?;
            fraction.parse::<u128>().map_err(|_| overflow())? * padding
        };

        whole_units
            .checked_mul(scale)
            .and_then(|units| units.checked_add(fraction_units))
            .map(TokenAmount)
            .ok_or_else(overflow)
    }

    /// Renders base units as a decimal string, keeping at least one fractional digit.
    pub fn format_units(&self, decimals: u8) -> String {
        let Ok(scale) = scale_factor(decimals) else {
            return self.0.to_string();
        };
        let whole = self.0 / scale;
        let fraction = self.0 % scale;
        if decimals == 0 {
            return whole.to_string();
        }

        let digits = format!("{:0width$}", fraction, width = decimals as usize);
        let trimmed = digits.trim_end_matches('0');
        if trimmed.is_empty() {
            format!("{whole}.0")
        } else {
            format!("{whole}.{trimmed}")
        }
    }
}

fn scale_factor(decimals: u8) -> Result<u128, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    Ok(10u128.pow(decimals as u32))
}
