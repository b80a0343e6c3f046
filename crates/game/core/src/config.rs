use core::time::Duration;

use crate::types::{Address, Asset, TokenAmount};

/// How a won run pays out its reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RewardPolicy {
    /// The session pushes the reward transfer as soon as the run is won.
    #[strum(to_string = "auto", serialize = "auto_transfer")]
    AutoTransfer,
    /// The reward waits for an explicit claim from the player.
    #[strum(to_string = "claim", serialize = "claim_gated")]
    ClaimGated,
}

/// Price of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StakeRequirement {
    pub amount: TokenAmount,
    pub asset: Asset,
}

/// Obstacle emission parameters. Coordinates are play-field pixels, x grows
/// to the right and obstacles travel towards x = 0.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    pub spawn_interval: Duration,
    /// Discrete vertical positions an obstacle may spawn on.
    pub lanes: Vec<f32>,
    pub spawn_x: f32,
    /// Horizontal speed in pixels per second (magnitude).
    pub speed: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Width of an obstacle sprite at scale 1.0.
    pub base_width: f32,
}

impl SchedulerConfig {
    pub const DEFAULT_LANES: [f32; 5] = [150.0, 250.0, 350.0, 450.0, 550.0];
    pub const DEFAULT_SPEED: f32 = 250.0;
    pub const DEFAULT_BASE_WIDTH: f32 = 600.0;

    pub fn for_field(field_width: f32) -> Self {
        Self {
            spawn_interval: Duration::from_secs(1),
            lanes: Self::DEFAULT_LANES.to_vec(),
            spawn_x: (field_width - GameConfig::DEFAULT_GOAL_INSET - 250.0).max(0.0),
            speed: Self::DEFAULT_SPEED,
            min_scale: 0.05,
            max_scale: 0.2,
            base_width: Self::DEFAULT_BASE_WIDTH,
        }
    }

    /// Seconds an obstacle needs to cross from its spawn point to the far edge.
    pub fn traverse_time(&self) -> Duration {
        if self.speed <= 0.0 {
            return Duration::MAX;
        }
        let farthest = self.spawn_x + self.base_width * self.max_scale;
        Duration::from_secs_f32(farthest / self.speed)
    }
}

/// Tunable parameters of the game session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub max_plays_per_day: u32,
    pub countdown_seconds: u32,
    pub field_width: f32,
    /// Horizontal position of the lighthouse (goal entity).
    pub goal_x: f32,
    pub scheduler: SchedulerConfig,
    pub stake: StakeRequirement,
    pub reward_amount: TokenAmount,
    pub reward_policy: RewardPolicy,
    /// Decimals of the stake asset, used for display and parsing.
    pub asset_decimals: u8,
    pub asset_symbol: String,
}

impl GameConfig {
    pub const DEFAULT_MAX_PLAYS_PER_DAY: u32 = 3;
    pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;
    pub const DEFAULT_FIELD_WIDTH: f32 = 1280.0;
    pub const DEFAULT_GOAL_INSET: f32 = 100.0;
    pub const DEFAULT_DECIMALS: u8 = 18;
    /// 0.001 at 18 decimals.
    pub const DEFAULT_STAKE_UNITS: u128 = 1_000_000_000_000_000;
    /// 0.01 at 18 decimals.
    pub const DEFAULT_REWARD_UNITS: u128 = 10_000_000_000_000_000;
    /// WPHRS token contract on Pharos testnet.
    pub const DEFAULT_STAKE_TOKEN: Address = Address::from_bytes([
        0x30, 0x19, 0xb2, 0x47, 0x38, 0x1c, 0x85, 0x0a, 0xb5, 0x3d, 0xc0, 0xee, 0x53, 0xbc, 0xe7,
        0xa0, 0x7e, 0xa9, 0x15, 0x5f,
    ]);

    pub fn new() -> Self {
        let field_width = Self::DEFAULT_FIELD_WIDTH;
        Self {
            max_plays_per_day: Self::DEFAULT_MAX_PLAYS_PER_DAY,
            countdown_seconds: Self::DEFAULT_COUNTDOWN_SECONDS,
            field_width,
            goal_x: field_width - Self::DEFAULT_GOAL_INSET,
            scheduler: SchedulerConfig::for_field(field_width),
            stake: StakeRequirement {
                amount: TokenAmount(Self::DEFAULT_STAKE_UNITS),
                asset: Asset::Token(Self::DEFAULT_STAKE_TOKEN),
            },
            reward_amount: TokenAmount(Self::DEFAULT_REWARD_UNITS),
            reward_policy: RewardPolicy::AutoTransfer,
            asset_decimals: Self::DEFAULT_DECIMALS,
            asset_symbol: "WPHRS".to_string(),
        }
    }

    pub fn with_reward_policy(mut self, policy: RewardPolicy) -> Self {
        self.reward_policy = policy;
        self
    }

    pub fn with_max_plays_per_day(mut self, max: u32) -> Self {
        self.max_plays_per_day = max;
        self
    }

    /// Reward amount rendered with the asset symbol, e.g. `0.01 WPHRS`.
    pub fn reward_label(&self) -> String {
        format!(
            "{} {}",
            self.reward_amount.format_units(self.asset_decimals),
            self.asset_symbol
        )
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_lighthouse_game() {
        let config = GameConfig::default();
        assert_eq!(config.max_plays_per_day, 3);
        assert_eq!(config.countdown_seconds, 3);
        assert_eq!(config.goal_x, 1180.0);
        assert_eq!(config.scheduler.spawn_x, 930.0);
        assert_eq!(config.reward_label(), "0.01 WPHRS");
        assert_eq!(
            config.stake.asset,
            Asset::Token(
                Address::parse("0x3019B247381c850ab53Dc0EE53bCe7A07Ea9155f").unwrap()
            )
        );
    }

    #[test]
    fn reward_policy_parses_short_names() {
        assert_eq!("auto".parse::<RewardPolicy>(), Ok(RewardPolicy::AutoTransfer));
        assert_eq!("claim".parse::<RewardPolicy>(), Ok(RewardPolicy::ClaimGated));
        assert!("later".parse::<RewardPolicy>().is_err());
        assert_eq!(RewardPolicy::ClaimGated.to_string(), "claim");
    }

    #[test]
    fn obstacles_cross_the_field_in_bounded_time() {
        let scheduler = SchedulerConfig::for_field(1280.0);
        // (930 + 600 * 0.2) / 250
        let seconds = scheduler.traverse_time().as_secs_f32();
        assert!((seconds - 4.2).abs() < 1e-3, "got {seconds}");
    }
}
