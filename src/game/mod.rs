//! Flappy simulation: one actor, a stream of paired obstacles, score keeping.
//!
//! Nothing in here knows about terminals, audio devices or files. The host
//! feeds frames through [`GameLoop::advance`] and input through
//! [`GameLoop::on_activate`]; side effects leave through the injected
//! [`ToneSignaler`](crate::tone::ToneSignaler), [`HighScoreStore`] and
//! [`RandomSource`] ports.

mod rng;
mod score;
mod session;

use std::time::Duration;

use crate::config::ConfigError;

pub use rng::{ChaChaSource, RandomSource, SequenceSource};
pub use score::{FileStore, HighScoreStore, MemoryStore, StoreError};
pub use session::{Actor, GameLoop, GameOverSummary, GameSnapshot, Obstacle};

/// Fixed game constants. Units are logical playfield units and frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub actor_width: f64,
    pub actor_height: f64,
    /// Added to the actor's velocity every frame.
    pub gravity: f64,
    /// Velocity the actor is set to on a jump. Negative is up.
    pub jump_velocity: f64,
    pub obstacle_width: f64,
    pub gap_height: f64,
    /// Minimum distance between the gap and the playfield top/bottom.
    pub min_margin: f64,
    pub spawn_interval: Duration,
    /// Obstacle movement per frame.
    pub scroll_speed: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 450.0,
            actor_width: 50.0,
            actor_height: 50.0,
            gravity: 0.5,
            jump_velocity: -8.0,
            obstacle_width: 60.0,
            gap_height: 150.0,
            min_margin: 50.0,
            spawn_interval: Duration::from_millis(1500),
            scroll_speed: 3.0,
        }
    }
}

impl GameConfig {
    /// Check the constants once, before any obstacle is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("actor_width", self.actor_width),
            ("actor_height", self.actor_height),
            ("obstacle_width", self.obstacle_width),
            ("gap_height", self.gap_height),
            ("scroll_speed", self.scroll_speed),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        if self.min_margin < 0.0 || self.gap_height + 2.0 * self.min_margin > self.height {
            return Err(ConfigError::SpawnGeometry {
                gap: self.gap_height,
                margin: self.min_margin,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Horizontal position of the actor's left edge. Never changes.
    pub fn actor_x(&self) -> f64 {
        self.width / 4.0
    }

    /// Vertical position that centres the actor in the playfield.
    pub fn actor_start_y(&self) -> f64 {
        (self.height - self.actor_height) / 2.0
    }

    /// Inclusive range a spawned obstacle's gap top may take.
    pub fn gap_top_range(&self) -> (f64, f64) {
        (
            self.min_margin,
            self.height - self.gap_height - self.min_margin,
        )
    }
}
