use std::time::Duration;

use tracing::{debug, info, warn};

use super::{GameConfig, HighScoreStore, RandomSource};
use crate::config::ConfigError;
use crate::tone::{Cue, ToneSignaler};

/// The player-controlled entity. Only `y` and `velocity` change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
    pub width: f64,
    pub height: f64,
}

impl Actor {
    fn centred(config: &GameConfig) -> Self {
        Self {
            x: config.actor_x(),
            y: config.actor_start_y(),
            velocity: 0.0,
            width: config.actor_width,
            height: config.actor_height,
        }
    }
}

/// A top/bottom barrier pair with a passable gap starting at `gap_top`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub gap_top: f64,
    /// Set once, when the trailing edge crosses the actor.
    pub passed: bool,
}

impl Obstacle {
    /// Axis-aligned hit test. A gap edge touching the actor counts as a hit.
    pub fn collides_with(&self, actor: &Actor, config: &GameConfig) -> bool {
        let overlaps_x = actor.x + actor.width > self.x && actor.x < self.x + config.obstacle_width;
        if !overlaps_x {
            return false;
        }
        let gap_bottom = self.gap_top + config.gap_height;
        actor.y <= self.gap_top || actor.y + actor.height >= gap_bottom
    }

    fn trailing_edge(&self, config: &GameConfig) -> f64 {
        self.x + config.obstacle_width
    }
}

/// Final numbers of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverSummary {
    pub final_score: u32,
    pub high_score: u32,
    /// The session beat the previous high score.
    pub new_record: bool,
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct GameSnapshot<'a> {
    pub config: &'a GameConfig,
    pub actor: &'a Actor,
    pub obstacles: &'a [Obstacle],
    pub score: u32,
    pub high_score: u32,
    pub game_over: Option<GameOverSummary>,
}

/// Owns the authoritative session state and advances it one frame at a time.
pub struct GameLoop {
    config: GameConfig,
    store: Box<dyn HighScoreStore>,
    tones: Box<dyn ToneSignaler>,
    rng: Box<dyn RandomSource>,

    actor: Actor,
    obstacles: Vec<Obstacle>,
    score: u32,
    high_score: u32,
    game_over: Option<GameOverSummary>,
    /// Sum of the deltas fed to `advance` since the last reset.
    clock: Duration,
    last_spawn: Option<Duration>,
}

impl GameLoop {
    /// Validate `config`, load the stored high score and start a session.
    ///
    /// An unreadable store is not fatal: the high score starts at 0.
    pub fn new(
        config: GameConfig,
        store: Box<dyn HighScoreStore>,
        tones: Box<dyn ToneSignaler>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let high_score = match store.load() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "High score unavailable, starting from 0");
                0
            }
        };
        info!(high_score, "Game session created");

        Ok(Self {
            actor: Actor::centred(&config),
            config,
            store,
            tones,
            rng,
            obstacles: Vec::new(),
            score: 0,
            high_score,
            game_over: None,
            clock: Duration::ZERO,
            last_spawn: None,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn is_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over(&self) -> Option<GameOverSummary> {
        self.game_over
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn snapshot(&self) -> GameSnapshot<'_> {
        GameSnapshot {
            config: &self.config,
            actor: &self.actor,
            obstacles: &self.obstacles,
            score: self.score,
            high_score: self.high_score,
            game_over: self.game_over,
        }
    }

    /// Step the simulation by one frame. `dt` drives obstacle spawning only;
    /// motion is per frame. Does nothing once the session is over.
    pub fn advance(&mut self, dt: Duration) {
        if self.is_over() {
            return;
        }

        // Physics
        self.actor.velocity += self.config.gravity;
        self.actor.y += self.actor.velocity;

        // Spawn
        self.clock += dt;
        let due = match self.last_spawn {
            None => true,
            Some(at) => self.clock.saturating_sub(at) > self.config.spawn_interval,
        };
        if due {
            self.spawn_obstacle();
            self.last_spawn = Some(self.clock);
        }

        // Scroll and score
        let mut scored = 0;
        for obstacle in &mut self.obstacles {
            obstacle.x -= self.config.scroll_speed;
            if !obstacle.passed && obstacle.trailing_edge(&self.config) < self.actor.x {
                obstacle.passed = true;
                scored += 1;
            }
        }
        for _ in 0..scored {
            self.score += 1;
            self.tones.trigger(Cue::Score);
        }

        let hit = self
            .obstacles
            .iter()
            .any(|o| o.collides_with(&self.actor, &self.config));

        self.obstacles
            .retain(|o| o.trailing_edge(&self.config) > 0.0);

        let out_of_bounds =
            self.actor.y < 0.0 || self.actor.y + self.actor.height > self.config.height;

        if hit || out_of_bounds {
            debug!(hit, out_of_bounds, y = self.actor.y, "Actor crashed");
            self.finish();
        }
    }

    /// The single input command: jump while playing, restart once over.
    pub fn on_activate(&mut self) {
        if self.is_over() {
            self.reset();
        } else {
            self.actor.velocity = self.config.jump_velocity;
            self.tones.trigger(Cue::Jump);
        }
    }

    fn spawn_obstacle(&mut self) {
        let (min, max) = self.config.gap_top_range();
        let gap_top = min + self.rng.next_unit() * (max - min);
        self.obstacles.push(Obstacle {
            x: self.config.width,
            gap_top,
            passed: false,
        });
    }

    /// Game-over procedure. Runs once per session.
    fn finish(&mut self) {
        if self.is_over() {
            return;
        }

        let new_record = self.score > self.high_score;
        if new_record {
            self.high_score = self.score;
            if let Err(e) = self.store.save(self.high_score) {
                warn!(error = %e, high_score = self.high_score, "Could not persist high score");
            }
        }

        let summary = GameOverSummary {
            final_score: self.score,
            high_score: self.high_score,
            new_record,
        };
        info!(
            final_score = summary.final_score,
            high_score = summary.high_score,
            new_record,
            "Game over"
        );
        self.game_over = Some(summary);
    }

    fn reset(&mut self) {
        self.actor = Actor::centred(&self.config);
        self.obstacles.clear();
        self.score = 0;
        self.game_over = None;
        self.clock = Duration::ZERO;
        self.last_spawn = None;
        debug!("Session restarted");
    }

    #[cfg(test)]
    fn set_actor_y(&mut self, y: f64) {
        self.actor.y = y;
    }
}
