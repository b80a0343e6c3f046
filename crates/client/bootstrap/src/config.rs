//! Session configuration loaded from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use game_core::{Address, Asset, ChainId, RewardPolicy, TokenAmount};
use runtime::SessionConfig;

/// Configuration required to bootstrap a session and its driver.
#[derive(Clone, Debug)]
pub struct BootstrapConfig {
    pub session: SessionConfig,
    pub session_id: Option<String>,
    pub save_data_dir: Option<PathBuf>,
    /// Scripted runs the headless client plays before exiting.
    pub autoplay_runs: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            session_id: None,
            save_data_dir: None,
            autoplay_runs: 3,
        }
    }
}

impl BootstrapConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `MAX_PLAYS_PER_DAY` - Paid runs allowed per local calendar day (default: 3)
    /// - `COUNTDOWN_SECONDS` - Countdown before a run starts (default: 3)
    /// - `STAKE_AMOUNT` - Stake in whole units, e.g. `0.001`
    /// - `STAKE_TOKEN` - Token contract for stake and reward; `native` for the chain currency
    /// - `REWARD_AMOUNT` - Reward in whole units, e.g. `0.01`
    /// - `REWARD_POLICY` - `auto` or `claim` (default: auto)
    /// - `BANK_ADDRESS` - Account receiving stakes and paying rewards
    /// - `REQUIRED_CHAIN_ID` - Chain id, hex (`0xa8230`) or decimal
    /// - `CHAIN_TIMEOUT_SECS` - Upper bound per chain call (default: 60)
    /// - `GAME_SESSION_ID` - Session identifier for logs (default: auto-generated)
    /// - `SAVE_DATA_DIR` - Directory for the quota record (default: platform-specific)
    /// - `AUTOPLAY_RUNS` - Runs the headless client plays (default: 3)
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        let game = &mut config.session.game;

        if let Some(max) = parse::<u32>(&read, "MAX_PLAYS_PER_DAY") {
            game.max_plays_per_day = max;
        }
        if let Some(seconds) = parse::<u32>(&read, "COUNTDOWN_SECONDS") {
            game.countdown_seconds = seconds;
        }
        if let Some(raw) = read("STAKE_TOKEN") {
            if raw.trim().eq_ignore_ascii_case("native") {
                game.stake.asset = Asset::Native;
            } else if let Some(contract) = parse_with(&raw, "STAKE_TOKEN", Address::parse) {
                game.stake.asset = Asset::Token(contract);
            }
        }
        let decimals = game.asset_decimals;
        let amount = |key: &str| {
            let raw = read(key)?;
            parse_with(&raw, key, |s| TokenAmount::parse_units(s, decimals))
        };
        if let Some(stake) = amount("STAKE_AMOUNT") {
            game.stake.amount = stake;
        }
        if let Some(reward) = amount("REWARD_AMOUNT") {
            game.reward_amount = reward;
        }
        if let Some(policy) = parse::<RewardPolicy>(&read, "REWARD_POLICY") {
            game.reward_policy = policy;
        }

        if let Some(bank) = read("BANK_ADDRESS")
            .and_then(|raw| parse_with(&raw, "BANK_ADDRESS", Address::parse))
        {
            config.session.bank_address = bank;
        }
        if let Some(chain_id) = read("REQUIRED_CHAIN_ID").and_then(|raw| {
            parse_with(&raw, "REQUIRED_CHAIN_ID", |s| ChainId::parse(s).ok_or("bad chain id"))
        }) {
            config.session.required_network.chain_id = chain_id;
        }
        if let Some(secs) = parse::<u64>(&read, "CHAIN_TIMEOUT_SECS") {
            config.session.chain_timeout = Duration::from_secs(secs.max(1));
        }

        config.session_id = read("GAME_SESSION_ID");
        config.save_data_dir = read("SAVE_DATA_DIR").map(PathBuf::from);
        if let Some(runs) = parse::<u32>(&read, "AUTOPLAY_RUNS") {
            config.autoplay_runs = runs;
        }

        config
    }
}

fn parse<T>(read: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = read(key)?;
    parse_with(&raw, key, |s| s.parse::<T>())
}

fn parse_with<T, E: std::fmt::Display>(
    raw: &str,
    key: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Option<T> {
    parse(raw.trim())
        .inspect_err(|err| tracing::warn!("ignoring {}={:?}: {}", key, raw, err))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> BootstrapConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BootstrapConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.session.game.max_plays_per_day, 3);
        assert_eq!(config.session.quota_key, "pharos_game_plays");
        assert_eq!(config.session.required_network.chain_id, ChainId(688_688));
        assert_eq!(config.autoplay_runs, 3);
    }

    #[test]
    fn reads_game_variants() {
        let config = config_from(&[
            ("MAX_PLAYS_PER_DAY", "5"),
            ("STAKE_TOKEN", "native"),
            ("STAKE_AMOUNT", "0.5"),
            ("REWARD_POLICY", "claim"),
            ("REQUIRED_CHAIN_ID", "0x1"),
            ("CHAIN_TIMEOUT_SECS", "10"),
        ]);
        let game = &config.session.game;
        assert_eq!(game.max_plays_per_day, 5);
        assert_eq!(game.stake.asset, Asset::Native);
        assert_eq!(game.stake.amount, TokenAmount(500_000_000_000_000_000));
        assert_eq!(game.reward_policy, RewardPolicy::ClaimGated);
        assert_eq!(config.session.required_network.chain_id, ChainId(1));
        assert_eq!(config.session.chain_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("MAX_PLAYS_PER_DAY", "lots"),
            ("BANK_ADDRESS", "0x1234"),
            ("REWARD_POLICY", "sometimes"),
        ]);
        assert_eq!(config.session.game.max_plays_per_day, 3);
        assert_eq!(config.session.bank_address, SessionConfig::DEFAULT_BANK_ADDRESS);
        assert_eq!(config.session.game.reward_policy, RewardPolicy::AutoTransfer);
    }
}
