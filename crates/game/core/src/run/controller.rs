use core::fmt;
use core::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::scheduler::{Obstacle, ObstacleScheduler, TickReport};
use crate::config::{GameConfig, SchedulerConfig};

/// Phase of the current run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    Idle,
    AwaitingStake,
    /// Seconds left before the run becomes active.
    Countdown(u32),
    /// Frames elapsed since the run became active.
    Active(u64),
    Won,
    Lost,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Won | RunState::Lost)
    }

    /// A stake, countdown or active run occupies the controller.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            RunState::AwaitingStake | RunState::Countdown(_) | RunState::Active(_)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::AwaitingStake => write!(f, "awaiting stake"),
            RunState::Countdown(left) => write!(f, "countdown({left})"),
            RunState::Active(ticks) => write!(f, "active({ticks})"),
            RunState::Won => write!(f, "won"),
            RunState::Lost => write!(f, "lost"),
        }
    }
}

/// What the player's sprite overlapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CollisionKind {
    Obstacle,
    Goal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RunOutcome {
    Won,
    Lost,
}

/// Result of delivering a countdown timer tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownStep {
    /// The tick belongs to an earlier generation or the countdown is over.
    Stale,
    Remaining(u32),
    Started,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {state}")]
pub struct TransitionError {
    pub action: &'static str,
    pub state: RunState,
}

/// State machine for one paid run.
///
/// Every transition bumps `generation`. Timers started for a phase carry the
/// generation they were started under, and [`RunController::countdown_tick`]
/// drops ticks whose generation no longer matches.
#[derive(Debug)]
pub struct RunController {
    state: RunState,
    generation: u64,
    /// State to fall back to when a stake attempt fails.
    restore_to: RunState,
    countdown_seconds: u32,
    scheduler_config: SchedulerConfig,
    scheduler: Option<ObstacleScheduler>,
    play_time: Duration,
    rng: StdRng,
}

impl RunController {
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            state: RunState::Idle,
            generation: 0,
            restore_to: RunState::Idle,
            countdown_seconds: config.countdown_seconds,
            scheduler_config: config.scheduler.clone(),
            scheduler: None,
            play_time: Duration::ZERO,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time spent in the active phase of the current run.
    pub fn play_time(&self) -> Duration {
        self.play_time
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.scheduler
            .as_ref()
            .map(ObstacleScheduler::obstacles)
            .unwrap_or(&[])
    }

    /// Enters `AwaitingStake` from `Idle` or a terminal state.
    pub fn begin_stake(&mut self) -> Result<u64, TransitionError> {
        if self.state.is_in_progress() {
            return Err(self.reject("begin a stake"));
        }
        self.restore_to = self.state;
        self.transition(RunState::AwaitingStake);
        Ok(self.generation)
    }

    /// Returns to the state held before the stake attempt.
    pub fn abort_stake(&mut self) {
        if self.state == RunState::AwaitingStake {
            self.transition(self.restore_to);
        }
    }

    /// Starts the countdown, or the run directly when no countdown is configured.
    pub fn stake_confirmed(&mut self) -> Result<RunState, TransitionError> {
        if self.state != RunState::AwaitingStake {
            return Err(self.reject("confirm a stake"));
        }
        if self.countdown_seconds == 0 {
            self.enter_active();
        } else {
            self.transition(RunState::Countdown(self.countdown_seconds));
        }
        Ok(self.state)
    }

    pub fn countdown_tick(&mut self, generation: u64) -> CountdownStep {
        if generation != self.generation {
            return CountdownStep::Stale;
        }
        match self.state {
            RunState::Countdown(left) if left <= 1 => {
                self.enter_active();
                CountdownStep::Started
            }
            RunState::Countdown(left) => {
                // Same phase: the generation stays so the remaining ticks apply.
                self.state = RunState::Countdown(left - 1);
                CountdownStep::Remaining(left - 1)
            }
            _ => CountdownStep::Stale,
        }
    }

    /// Advances one rendered frame. Only the active phase consumes frames.
    pub fn tick(&mut self, dt: Duration) -> Option<TickReport> {
        let RunState::Active(frames) = self.state else {
            return None;
        };
        self.state = RunState::Active(frames + 1);
        self.play_time += dt;
        self.scheduler
            .as_mut()
            .map(|scheduler| scheduler.tick(self.play_time))
    }

    /// Applies a collision signal. Signals outside the active phase are ignored,
    /// which makes repeated overlaps after the run concluded harmless.
    pub fn on_collision(&mut self, kind: CollisionKind) -> Option<RunOutcome> {
        if !matches!(self.state, RunState::Active(_)) {
            return None;
        }
        let outcome = match kind {
            CollisionKind::Obstacle => RunOutcome::Lost,
            CollisionKind::Goal => RunOutcome::Won,
        };
        self.scheduler = None;
        self.transition(match outcome {
            RunOutcome::Won => RunState::Won,
            RunOutcome::Lost => RunState::Lost,
        });
        Some(outcome)
    }

    /// Clears a concluded run so another stake can be requested.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        match self.state {
            RunState::Idle => Ok(()),
            RunState::Won | RunState::Lost => {
                self.transition(RunState::Idle);
                Ok(())
            }
            _ => Err(self.reject("reset")),
        }
    }

    /// Tears the run down from any phase.
    pub fn abandon(&mut self) {
        self.scheduler = None;
        self.transition(RunState::Idle);
    }

    fn enter_active(&mut self) {
        self.play_time = Duration::ZERO;
        self.scheduler = Some(ObstacleScheduler::new(
            self.scheduler_config.clone(),
            self.rng.random(),
        ));
        self.transition(RunState::Active(0));
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "run transition");
        self.state = next;
        self.generation = self.generation.wrapping_add(1);
    }

    fn reject(&self, action: &'static str) -> TransitionError {
        TransitionError {
            action,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> RunController {
        RunController::new(&GameConfig::default(), 1)
    }

    fn start(controller: &mut RunController) {
        controller.begin_stake().unwrap();
        controller.stake_confirmed().unwrap();
        for _ in 0..3 {
            let generation = controller.generation();
            controller.countdown_tick(generation);
        }
        assert_eq!(controller.state(), RunState::Active(0));
    }

    #[test]
    fn countdown_runs_three_ticks_then_activates() {
        let mut controller = controller();
        controller.begin_stake().unwrap();
        assert_eq!(controller.stake_confirmed(), Ok(RunState::Countdown(3)));

        let generation = controller.generation();
        assert_eq!(
            controller.countdown_tick(generation),
            CountdownStep::Remaining(2)
        );
        assert_eq!(
            controller.countdown_tick(generation),
            CountdownStep::Remaining(1)
        );
        assert_eq!(controller.countdown_tick(generation), CountdownStep::Started);
        assert_eq!(controller.state(), RunState::Active(0));

        // A leftover tick from the finished countdown does nothing.
        assert_eq!(controller.countdown_tick(generation), CountdownStep::Stale);
    }

    #[test]
    fn abandoned_countdown_discards_pending_ticks() {
        let mut controller = controller();
        controller.begin_stake().unwrap();
        controller.stake_confirmed().unwrap();
        let generation = controller.generation();

        controller.abandon();
        assert_eq!(controller.countdown_tick(generation), CountdownStep::Stale);
        assert_eq!(controller.state(), RunState::Idle);
    }

    #[test]
    fn obstacle_collision_loses_once() {
        let mut controller = controller();
        start(&mut controller);

        assert_eq!(
            controller.on_collision(CollisionKind::Obstacle),
            Some(RunOutcome::Lost)
        );
        assert_eq!(controller.state(), RunState::Lost);
        assert_eq!(controller.on_collision(CollisionKind::Obstacle), None);
        assert_eq!(controller.on_collision(CollisionKind::Goal), None);
        assert_eq!(controller.state(), RunState::Lost);
    }

    #[test]
    fn goal_collision_wins_and_tears_down_scheduler() {
        let mut controller = controller();
        start(&mut controller);
        let report = controller.tick(Duration::from_secs(2)).unwrap();
        assert_eq!(report.spawned.len(), 2);
        assert_eq!(controller.obstacles().len(), 2);

        assert_eq!(
            controller.on_collision(CollisionKind::Goal),
            Some(RunOutcome::Won)
        );
        assert!(controller.obstacles().is_empty());
        assert_eq!(controller.tick(Duration::from_secs(1)), None);
    }

    #[test]
    fn collisions_before_active_are_ignored() {
        let mut controller = controller();
        assert_eq!(controller.on_collision(CollisionKind::Goal), None);
        controller.begin_stake().unwrap();
        controller.stake_confirmed().unwrap();
        assert_eq!(controller.on_collision(CollisionKind::Obstacle), None);
        assert_eq!(controller.state(), RunState::Countdown(3));
    }

    #[test]
    fn frames_count_only_while_active() {
        let mut controller = controller();
        assert_eq!(controller.tick(Duration::from_millis(16)), None);
        start(&mut controller);
        controller.tick(Duration::from_millis(16));
        controller.tick(Duration::from_millis(16));
        assert_eq!(controller.state(), RunState::Active(2));
        assert_eq!(controller.play_time(), Duration::from_millis(32));
    }

    #[test]
    fn second_stake_is_rejected_while_in_progress() {
        let mut controller = controller();
        controller.begin_stake().unwrap();
        let err = controller.begin_stake().unwrap_err();
        assert_eq!(err.state, RunState::AwaitingStake);
    }

    #[test]
    fn failed_stake_restores_previous_state() {
        let mut controller = controller();
        start(&mut controller);
        controller.on_collision(CollisionKind::Obstacle);

        controller.begin_stake().unwrap();
        controller.abort_stake();
        assert_eq!(controller.state(), RunState::Lost);
    }

    #[test]
    fn won_run_stays_terminal_until_reset() {
        let mut controller = controller();
        start(&mut controller);
        controller.on_collision(CollisionKind::Goal);
        assert_eq!(controller.state(), RunState::Won);

        controller.reset().unwrap();
        assert_eq!(controller.state(), RunState::Idle);
    }

    #[test]
    fn reset_is_rejected_mid_run() {
        let mut controller = controller();
        start(&mut controller);
        assert!(controller.reset().is_err());
    }

    #[test]
    fn zero_countdown_starts_immediately() {
        let mut config = GameConfig::default();
        config.countdown_seconds = 0;
        let mut controller = RunController::new(&config, 1);
        controller.begin_stake().unwrap();
        assert_eq!(controller.stake_confirmed(), Ok(RunState::Active(0)));
    }
}
