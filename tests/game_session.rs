//! Whole-session behaviour of the game loop through its public API.

use std::time::Duration;

use flappy_chat::game::{
    ChaChaSource, FileStore, GameConfig, GameLoop, HighScoreStore, MemoryStore, SequenceSource,
};
use flappy_chat::tone::{Cue, RecordingTones, Silent};
use tempfile::TempDir;

const FRAME: Duration = Duration::from_millis(16);

/// Keeps the actor bobbing inside a gap whose top is at 150 (draw 0.5).
fn autopilot(game: &mut GameLoop) {
    let actor = game.actor();
    if actor.y > 235.0 && actor.velocity > 0.0 {
        game.on_activate();
    }
}

fn centred_gap_game(store: MemoryStore, tones: RecordingTones) -> GameLoop {
    GameLoop::new(
        GameConfig::default(),
        Box::new(store),
        Box::new(tones),
        Box::new(SequenceSource::new([0.5])),
    )
    .expect("valid config")
}

#[test]
fn score_counts_each_passed_obstacle_once() {
    let tones = RecordingTones::new();
    let mut game = centred_gap_game(MemoryStore::new(), tones.clone());

    let mut previous = 0;
    for _ in 0..2000 {
        game.advance(FRAME);
        assert!(!game.is_over(), "autopilot should never crash");
        autopilot(&mut game);

        let score = game.score();
        assert!(score == previous || score == previous + 1);
        previous = score;

        let actor_x = game.actor().x;
        for o in game.obstacles() {
            let trailing = o.x + game.config().obstacle_width;
            assert_eq!(o.passed, trailing < actor_x);
        }
    }

    assert_eq!(game.score(), 19);
    let score_cues = tones.cues().into_iter().filter(|c| *c == Cue::Score).count();
    assert_eq!(score_cues as u32, game.score());
}

#[test]
fn crash_records_new_high_score() {
    let store = MemoryStore::with_value(2);
    let mut game = centred_gap_game(store.clone(), RecordingTones::new());

    for _ in 0..1000 {
        game.advance(FRAME);
        autopilot(&mut game);
    }
    let reached = game.score();
    assert!(reached > 2);

    // Stop flapping and fall out of the playfield.
    while !game.is_over() {
        game.advance(FRAME);
    }

    // An obstacle may still be passed on the way down.
    let final_score = game.score();
    assert!(final_score >= reached);

    let summary = game.game_over().expect("over");
    assert_eq!(summary.final_score, final_score);
    assert_eq!(summary.high_score, final_score);
    assert!(summary.new_record);
    assert_eq!(store.stored(), Some(final_score));
}

#[test]
fn restart_keeps_high_score_and_clears_the_rest() {
    let store = MemoryStore::with_value(40);
    let mut game = centred_gap_game(store.clone(), RecordingTones::new());
    while !game.is_over() {
        game.advance(FRAME);
    }
    assert_eq!(game.game_over().expect("over").high_score, 40);

    game.on_activate();
    assert!(!game.is_over());
    assert_eq!(game.score(), 0);
    assert_eq!(game.high_score(), 40);
    assert!(game.obstacles().is_empty());
    assert_eq!(game.actor().y, game.config().actor_start_y());
    assert_eq!(game.actor().velocity, 0.0);
    assert_eq!(store.stored(), Some(40), "no write without a new record");
}

#[test]
fn high_score_survives_a_restart_of_the_program() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("highscore.json");

    let mut first = GameLoop::new(
        GameConfig::default(),
        Box::new(FileStore::new(&path)),
        Box::new(Silent),
        Box::new(SequenceSource::new([0.5])),
    )
    .expect("valid config");
    for _ in 0..600 {
        first.advance(FRAME);
        autopilot(&mut first);
    }
    while !first.is_over() {
        first.advance(FRAME);
    }
    let best = first.high_score();
    assert!(best > 0);
    assert_eq!(FileStore::new(&path).load().expect("load"), best);

    let second = GameLoop::new(
        GameConfig::default(),
        Box::new(FileStore::new(&path)),
        Box::new(Silent),
        Box::new(SequenceSource::new([0.5])),
    )
    .expect("valid config");
    assert_eq!(second.high_score(), best);
}

#[test]
fn spawned_gaps_stay_inside_margins() {
    let config = GameConfig::default();
    let (min, max) = config.gap_top_range();

    for seed in 0..20 {
        let mut game = GameLoop::new(
            config,
            Box::new(MemoryStore::new()),
            Box::new(Silent),
            Box::new(ChaChaSource::seeded(seed)),
        )
        .expect("valid config");

        // Spawn many obstacles quickly; the actor crashing is irrelevant here.
        for _ in 0..200 {
            if game.is_over() {
                game.on_activate();
            }
            game.advance(Duration::from_millis(1600));
            for o in game.obstacles() {
                assert!(
                    (min..=max).contains(&o.gap_top),
                    "gap top {} outside [{min}, {max}]",
                    o.gap_top
                );
            }
        }
    }
}

#[test]
fn extreme_draws_hit_the_range_ends() {
    let config = GameConfig::default();
    for (draw, expected) in [(0.0, 50.0), (0.999_999, 250.0)] {
        let mut game = GameLoop::new(
            config,
            Box::new(MemoryStore::new()),
            Box::new(Silent),
            Box::new(SequenceSource::new([draw])),
        )
        .expect("valid config");
        game.advance(FRAME);
        let gap_top = game.obstacles()[0].gap_top;
        assert!((gap_top - expected).abs() < 0.001, "draw {draw} gave {gap_top}");
    }
}

#[test]
fn invalid_geometry_is_refused_up_front() {
    let config = GameConfig {
        gap_height: 500.0,
        ..GameConfig::default()
    };
    let result = GameLoop::new(
        config,
        Box::new(MemoryStore::new()),
        Box::new(Silent),
        Box::new(SequenceSource::new([0.5])),
    );
    assert!(result.is_err());
}
