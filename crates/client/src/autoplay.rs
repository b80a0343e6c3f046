//! Scripted player for headless runs.
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::broadcast;

use game_core::{CollisionKind, GameConfig, Obstacle, RewardPolicy, RunOutcome, RunState};
use runtime::{ClaimStatus, Event, RewardEvent, RunEvent, SessionHandle, Topic};

/// The player's sprite as the stand-in renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerModel {
    pub start_x: f32,
    /// Pixels per second towards the lighthouse.
    pub speed: f32,
    /// Lane the player walks along; only obstacles in this lane can hit.
    pub lane_y: f32,
    pub half_width: f32,
}

impl Default for PlayerModel {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            speed: 200.0,
            lane_y: 550.0,
            half_width: 25.0,
        }
    }
}

impl PlayerModel {
    fn hits(&self, x: f32, obstacle: &Obstacle) -> bool {
        (obstacle.position.y - self.lane_y).abs() < 1.0
            && obstacle.position.x < x + self.half_width
            && obstacle.position.x + obstacle.width > x - self.half_width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub frames: u64,
    /// Reward payout, for won runs.
    pub reward: Option<ClaimStatus>,
}

/// Drives complete runs through a session handle.
pub struct Autoplay {
    handle: SessionHandle,
    player: PlayerModel,
    goal_x: f32,
    policy: RewardPolicy,
    frame: Duration,
}

impl Autoplay {
    pub const FRAME: Duration = Duration::from_millis(16);

    pub fn new(handle: SessionHandle, game: &GameConfig) -> Self {
        Self {
            handle,
            player: PlayerModel::default(),
            goal_x: game.goal_x,
            policy: game.reward_policy,
            frame: Self::FRAME,
        }
    }

    pub fn with_player(mut self, player: PlayerModel) -> Self {
        self.player = player;
        self
    }

    /// Stakes, waits out the countdown, walks to the lighthouse and settles
    /// the reward if the run was won.
    pub async fn play_run(&self) -> Result<RunReport> {
        let mut run_events = self.handle.subscribe(Topic::Run);
        let mut reward_events = self.handle.subscribe(Topic::Reward);

        let state = self.handle.request_start().await?;
        if !matches!(state, RunState::Active(_)) {
            wait_for(&mut run_events, |event| {
                matches!(event, Event::Run(RunEvent::Started))
            })
            .await?;
        }

        let mut ticker = tokio::time::interval(self.frame);
        let mut x = self.player.start_x;
        let mut frames = 0;
        let outcome = loop {
            ticker.tick().await;
            self.handle.on_tick(self.frame).await?;
            frames += 1;
            x += self.player.speed * self.frame.as_secs_f32();

            let kind = if x >= self.goal_x {
                Some(CollisionKind::Goal)
            } else {
                let snapshot = self.handle.snapshot().await?;
                snapshot
                    .obstacles
                    .iter()
                    .any(|obstacle| self.player.hits(x, obstacle))
                    .then_some(CollisionKind::Obstacle)
            };
            if let Some(kind) = kind
                && let Some(outcome) = self.handle.on_collision(kind).await?
            {
                break outcome;
            }
        };
        tracing::info!(%outcome, frames, "autoplay run finished");

        let reward = match outcome {
            RunOutcome::Lost => None,
            RunOutcome::Won => Some(self.collect_reward(&mut reward_events).await?),
        };
        if self.handle.snapshot().await?.run == RunState::Won {
            self.handle.reset_run().await?;
        }

        Ok(RunReport {
            outcome,
            frames,
            reward,
        })
    }

    async fn collect_reward(
        &self,
        reward_events: &mut broadcast::Receiver<Event>,
    ) -> Result<ClaimStatus> {
        if self.policy == RewardPolicy::AutoTransfer {
            let event = wait_for(reward_events, |event| {
                matches!(
                    event,
                    Event::Reward(RewardEvent::Settled { .. } | RewardEvent::Failed(_))
                )
            })
            .await?;
            if let Event::Reward(RewardEvent::Settled { tx }) = event {
                return Ok(ClaimStatus::Settled { tx });
            }
        }
        Ok(self.handle.claim_reward().await?)
    }
}

async fn wait_for(
    rx: &mut broadcast::Receiver<Event>,
    matches: impl Fn(&Event) -> bool,
) -> Result<Event> {
    loop {
        match rx.recv().await {
            Ok(event) if matches(&event) => return Ok(event),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "autoplay lagged behind session events");
            }
            Err(broadcast::error::RecvError::Closed) => bail!("session event bus closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use client_blockchain_core::{Address, InMemoryChain, TokenAmount};
    use runtime::{Runtime, SessionConfig};

    const PLAYER: Address = Address::from_bytes([0x42; 20]);

    async fn session(config: &SessionConfig) -> (InMemoryChain, Runtime) {
        let chain = InMemoryChain::new(PLAYER, config.required_network.chain_id);
        let asset = config.game.stake.asset;
        chain.fund(PLAYER, asset, TokenAmount(config.game.stake.amount.units() * 5));
        chain.fund(config.bank_address, asset, config.game.reward_amount);
        let runtime = Runtime::builder()
            .config(config.clone())
            .wallet(Arc::new(chain.clone()))
            .treasury(Arc::new(chain.signer(config.bank_address)))
            .seed(11)
            .build()
            .await
            .unwrap();
        (chain, runtime)
    }

    #[tokio::test(start_paused = true)]
    async fn plays_a_run_to_conclusion() {
        let config = SessionConfig::default();
        let (_chain, runtime) = session(&config).await;
        let handle = runtime.handle();
        handle.connect_wallet().await.unwrap();

        let report = Autoplay::new(handle.clone(), &config.game)
            .play_run()
            .await
            .unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.run, RunState::Idle);
        assert_eq!(snapshot.quota.map(|q| q.plays_used), Some(1));
        if report.outcome == RunOutcome::Won {
            assert!(matches!(report.reward, Some(ClaimStatus::Settled { .. })));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clear_lane_always_reaches_the_lighthouse() {
        let config = SessionConfig::default();
        let (chain, runtime) = session(&config).await;
        let handle = runtime.handle();
        handle.connect_wallet().await.unwrap();

        let player = PlayerModel {
            lane_y: 900.0,
            ..PlayerModel::default()
        };
        let report = Autoplay::new(handle, &config.game)
            .with_player(player)
            .play_run()
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Won);
        assert!(matches!(report.reward, Some(ClaimStatus::Settled { .. })));
        assert_eq!(
            chain.balance(PLAYER, config.game.stake.asset),
            TokenAmount(
                config.game.stake.amount.units() * 4 + config.game.reward_amount.units()
            )
        );
    }
}
