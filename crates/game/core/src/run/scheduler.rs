use core::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SchedulerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObstacleId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// A wave travelling across the play field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub id: ObstacleId,
    pub position: Vec2,
    /// Pixels per second.
    pub velocity: Vec2,
    pub scale: f32,
    pub width: f32,
}

impl Obstacle {
    /// True once the whole sprite has left the field through x = 0.
    pub fn is_off_field(&self) -> bool {
        self.position.x < -self.width
    }
}

/// Obstacles created and destroyed by one scheduler tick.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    pub spawned: Vec<Obstacle>,
    pub removed: Vec<ObstacleId>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.removed.is_empty()
    }
}

/// Periodic obstacle emitter driven by the run's play clock.
///
/// The scheduler integrates obstacle positions itself so that the off-field
/// sweep does not depend on the physics engine; collisions remain the
/// engine's business.
#[derive(Debug)]
pub struct ObstacleScheduler {
    config: SchedulerConfig,
    rng: StdRng,
    obstacles: Vec<Obstacle>,
    next_id: u32,
    next_spawn_at: Duration,
    last_tick: Duration,
}

impl ObstacleScheduler {
    pub fn new(config: SchedulerConfig, seed: u64) -> Self {
        let next_spawn_at = config.spawn_interval;
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            obstacles: Vec::new(),
            next_id: 0,
            next_spawn_at,
            last_tick: Duration::ZERO,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Advances the scheduler to `now` (time since the run became active).
    ///
    /// Emits every spawn that fell due since the previous tick, moves all live
    /// obstacles and destroys the ones that left the field.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        let mut report = TickReport::default();
        if now < self.last_tick {
            return report;
        }

        let dt = (now - self.last_tick).as_secs_f32();
        self.last_tick = now;
        for obstacle in &mut self.obstacles {
            obstacle.position.x += obstacle.velocity.x * dt;
            obstacle.position.y += obstacle.velocity.y * dt;
        }

        if !self.config.spawn_interval.is_zero() && !self.config.lanes.is_empty() {
            while self.next_spawn_at <= now {
                let age = (now - self.next_spawn_at).as_secs_f32();
                let obstacle = self.spawn(age);
                report.spawned.push(obstacle.clone());
                self.obstacles.push(obstacle);
                self.next_spawn_at += self.config.spawn_interval;
            }
        }

        self.obstacles.retain(|obstacle| {
            if obstacle.is_off_field() {
                report.removed.push(obstacle.id);
                false
            } else {
                true
            }
        });

        report
    }

    /// Creates an obstacle that was due `age` seconds ago.
    fn spawn(&mut self, age: f32) -> Obstacle {
        let lane = self.config.lanes[self.rng.random_range(0..self.config.lanes.len())];
        let scale = if self.config.max_scale > self.config.min_scale {
            self.rng
                .random_range(self.config.min_scale..=self.config.max_scale)
        } else {
            self.config.min_scale
        };
        let velocity = Vec2 {
            x: -self.config.speed,
            y: 0.0,
        };

        let id = ObstacleId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        Obstacle {
            id,
            position: Vec2 {
                x: self.config.spawn_x + velocity.x * age,
                y: lane,
            },
            velocity,
            scale,
            width: self.config.base_width * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(seed: u64) -> ObstacleScheduler {
        ObstacleScheduler::new(SchedulerConfig::for_field(1280.0), seed)
    }

    #[test]
    fn emits_one_obstacle_per_interval() {
        let mut scheduler = scheduler(7);

        assert!(scheduler.tick(Duration::from_millis(999)).is_empty());

        let report = scheduler.tick(Duration::from_secs(1));
        assert_eq!(report.spawned.len(), 1);
        assert_eq!(report.spawned[0].id, ObstacleId(0));
        assert_eq!(report.spawned[0].position.x, 930.0);

        // A long frame catches up on every missed spawn.
        let report = scheduler.tick(Duration::from_secs(3));
        assert_eq!(report.spawned.len(), 2);
        assert_eq!(scheduler.obstacles().len(), 3);
    }

    #[test]
    fn spawns_only_on_configured_lanes_with_bounded_scale() {
        let mut scheduler = scheduler(11);
        let report = scheduler.tick(Duration::from_secs(4));
        assert_eq!(report.spawned.len(), 4);
        for obstacle in &report.spawned {
            assert!(SchedulerConfig::DEFAULT_LANES.contains(&obstacle.position.y));
            assert!((0.05..=0.2).contains(&obstacle.scale));
            assert_eq!(obstacle.velocity, Vec2 { x: -250.0, y: 0.0 });
        }
    }

    #[test]
    fn same_seed_same_waves() {
        let mut a = scheduler(42);
        let mut b = scheduler(42);
        assert_eq!(
            a.tick(Duration::from_secs(5)),
            b.tick(Duration::from_secs(5))
        );
    }

    #[test]
    fn sweeps_obstacles_that_left_the_field() {
        let mut scheduler = scheduler(3);
        scheduler.tick(Duration::from_secs(1));

        // Spawned at t=1 from x=930: at t=6 it sits at x=-320, past any width.
        let report = scheduler.tick(Duration::from_secs(6));
        assert!(report.removed.contains(&ObstacleId(0)));
        assert!(scheduler.obstacles().iter().all(|o| o.id != ObstacleId(0)));
        assert!(scheduler.obstacles().iter().all(|o| !o.is_off_field()));
    }

    #[test]
    fn clock_going_backwards_is_ignored() {
        let mut scheduler = scheduler(5);
        scheduler.tick(Duration::from_secs(2));
        let before = scheduler.obstacles().to_vec();
        assert!(scheduler.tick(Duration::from_secs(1)).is_empty());
        assert_eq!(scheduler.obstacles(), before.as_slice());
    }
}
