use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind},
    execute, terminal,
};
use tracing::{info, warn};

use flappy_chat::config::Config;
use flappy_chat::game::{ChaChaSource, FileStore, GameConfig, GameLoop};
use flappy_chat::render::{ActorSkin, render, term::PixelBuf};
use flappy_chat::telemetry;
use flappy_chat::tone::{Silent, SynthTones, ToneSignaler};

const FRAME: Duration = Duration::from_millis(16); // ~60 fps

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    // Logging is optional: without a log file the game still runs, silently.
    let _log_guard = match telemetry::init_file(&config.log_level, &config.log_dir, "flappy.log") {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("flappy: logging disabled: {e}");
            None
        }
    };

    let store = FileStore::new(&config.high_score_path);
    info!(path = %store.path().display(), "Starting flappy");

    let game = GameLoop::new(
        GameConfig::default(),
        Box::new(store),
        open_tones(config.mute),
        Box::new(ChaChaSource::from_entropy()),
    )?;
    let skin = ActorSkin::from_kind(config.skin);

    terminal::enable_raw_mode()?;
    let mut out = stdout();
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        event::EnableMouseCapture,
    )?;

    // Restore the terminal even when the loop failed.
    let result = run(&mut out, game, &skin);
    let restored = cleanup(&mut out);
    result?;
    restored?;

    info!("Flappy exited");
    Ok(())
}

fn open_tones(mute: bool) -> Box<dyn ToneSignaler> {
    if mute {
        info!("Audio muted by configuration");
        return Box::new(Silent);
    }
    match SynthTones::open() {
        Ok(tones) => Box::new(tones),
        Err(e) => {
            warn!(error = %e, "No audio output, continuing silently");
            Box::new(Silent)
        }
    }
}

fn cleanup(out: &mut io::Stdout) -> io::Result<()> {
    execute!(
        out,
        event::DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

fn run(out: &mut impl Write, mut game: GameLoop, skin: &ActorSkin) -> io::Result<()> {
    let playfield = *game.config();
    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::for_terminal(cols, rows, playfield.width, playfield.height);

    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();

        // Input
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => game.on_activate(),
                    _ => {}
                },
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    game.on_activate();
                }
                Event::Resize(c, r) => {
                    buf.resize(c as usize, r as usize * 2);
                }
                _ => {}
            }
        }

        // Update
        game.advance(frame_start - last_frame);
        last_frame = frame_start;

        // Render
        render(&game.snapshot(), skin, &mut buf);
        buf.present(out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}
