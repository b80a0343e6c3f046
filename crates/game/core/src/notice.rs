//! Player-facing status lines.
//!
//! The exact wording is presentation detail; these are the defaults the
//! lighthouse client shows.
use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notice {
    PlaysLeft(u32),
    NoPlaysLeft,
    ConnectWalletFirst,
    WalletNotFound,
    WalletConnectionFailed,
    SwitchNetwork { network: String },
    InsufficientBalance { symbol: String },
    SendingStake,
    StakeSuccessful,
    StakeFailed { reason: String },
    OperationInProgress,
    RunLost,
    RewardReceived { amount: String },
    RewardClaimable { amount: String },
    RewardFailed { reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PlaysLeft(left) => write!(f, "Plays left today: {left}"),
            Notice::NoPlaysLeft => write!(f, "No plays left today. Please come back tomorrow."),
            Notice::ConnectWalletFirst => write!(f, "Please connect your wallet first."),
            Notice::WalletNotFound => {
                write!(f, "Please install MetaMask or another Ethereum wallet.")
            }
            Notice::WalletConnectionFailed => {
                write!(f, "Wallet connection or network switch failed.")
            }
            Notice::SwitchNetwork { network } => write!(f, "Please switch to {network}."),
            Notice::InsufficientBalance { symbol } => {
                write!(f, "Insufficient {symbol} balance for stake.")
            }
            Notice::SendingStake => write!(f, "Sending stake payment..."),
            Notice::StakeSuccessful => write!(f, "Stake payment successful! Starting game..."),
            Notice::StakeFailed { reason } => write!(f, "Stake payment failed: {reason}"),
            Notice::OperationInProgress => write!(f, "Please wait for the current transaction."),
            Notice::RunLost => write!(f, "You lost! Try again."),
            Notice::RewardReceived { amount } => write!(f, "Congratulations! You got {amount}."),
            Notice::RewardClaimable { amount } => {
                write!(f, "Congratulations! Claim your {amount}.")
            }
            Notice::RewardFailed { reason } => {
                write!(f, "Congratulations! Reward transfer failed: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_game_texts() {
        assert_eq!(Notice::PlaysLeft(2).to_string(), "Plays left today: 2");
        assert_eq!(
            Notice::RewardReceived {
                amount: "0.01 WPHRS".into()
            }
            .to_string(),
            "Congratulations! You got 0.01 WPHRS."
        );
        assert_eq!(
            Notice::SwitchNetwork {
                network: "Pharos Testnet".into()
            }
            .to_string(),
            "Please switch to Pharos Testnet."
        );
    }
}
