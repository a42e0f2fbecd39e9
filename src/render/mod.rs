//! Stateless drawing of a [`GameSnapshot`] onto any [`Canvas`].
//!
//! Coordinates are logical playfield units; a canvas maps them onto whatever
//! it really draws to. [`term::PixelBuf`] is the terminal implementation.

pub mod term;

use std::str::FromStr;

use crate::game::{GameOverSummary, GameSnapshot};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn halve(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }
}

pub const SKY: Rgb = Rgb(112, 197, 206);
pub const PIPE: Rgb = Rgb(46, 204, 113);
pub const ACTOR: Rgb = Rgb(245, 200, 66);
const PANEL: Rgb = Rgb(210, 185, 110);
const PANEL_INNER: Rgb = Rgb(220, 195, 120);
const WHITE: Rgb = Rgb(255, 255, 255);
const GOLD: Rgb = Rgb(245, 200, 66);
const SHADOW: Rgb = Rgb(30, 30, 30);
const GHOST: Rgb = Rgb(240, 240, 250);
const GHOST_SHADE: Rgb = Rgb(190, 195, 215);
const GHOST_EYE: Rgb = Rgb(20, 20, 40);

// ── Primitives ──────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in playfield units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Small bitmap. `None` pixels are transparent.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Option<Rgb>>,
}

impl Sprite {
    /// Build a sprite from rows of ASCII art using `palette` to map bytes to
    /// colors. Unmapped bytes are transparent; short rows are padded.
    pub fn from_art(rows: &[&str], palette: &[(u8, Rgb)]) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut pixels = Vec::with_capacity(width * rows.len());
        for row in rows {
            let bytes = row.as_bytes();
            for col in 0..width {
                let color = bytes.get(col).and_then(|b| {
                    palette
                        .iter()
                        .find(|(key, _)| key == b)
                        .map(|(_, c)| *c)
                });
                pixels.push(color);
            }
        }
        Self {
            width,
            height: rows.len(),
            pixels,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            None
        }
    }

    /// The default actor artwork.
    #[rustfmt::skip]
    pub fn ghost() -> Self {
        Sprite::from_art(
            &[
                "....####....",
                "..########..",
                ".##########.",
                ".##..##..##.",
                "###@.##@.###",
                "###@.##@.###",
                "############",
                "############",
                "##########ss",
                "########ssss",
                "##.###.##.ss",
                "#...#...#...",
            ],
            &[(b'#', GHOST), (b's', GHOST_SHADE), (b'@', GHOST_EYE)],
        )
    }
}

/// A 2-D drawing surface sized to the logical playfield.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    /// Draw `sprite` stretched over `rect`.
    fn blit(&mut self, rect: Rect, sprite: &Sprite);

    /// Darken everything drawn so far. Surfaces that can't read back may
    /// ignore this.
    fn dim(&mut self) {}
}

// ── Actor skins ─────────────────────────────────────────────────────────────

/// How the actor is drawn. Purely cosmetic; the hitbox is always the rect.
#[derive(Debug, Clone, PartialEq)]
pub enum ActorSkin {
    Plain,
    Sprite(Sprite),
}

impl ActorSkin {
    pub fn from_kind(kind: ActorSkinKind) -> Self {
        match kind {
            ActorSkinKind::Plain => ActorSkin::Plain,
            ActorSkinKind::Sprite => ActorSkin::Sprite(Sprite::ghost()),
        }
    }

    fn draw(&self, canvas: &mut impl Canvas, rect: Rect) {
        match self {
            ActorSkin::Plain => canvas.fill_rect(rect, ACTOR),
            ActorSkin::Sprite(sprite) => canvas.blit(rect, sprite),
        }
    }
}

/// Configurable choice of [`ActorSkin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActorSkinKind {
    Plain,
    #[default]
    Sprite,
}

impl FromStr for ActorSkinKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "rect" => Ok(ActorSkinKind::Plain),
            "sprite" | "ghost" => Ok(ActorSkinKind::Sprite),
            _ => Err(()),
        }
    }
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Draw one frame. Reads the snapshot only.
pub fn render(snapshot: &GameSnapshot<'_>, skin: &ActorSkin, canvas: &mut impl Canvas) {
    let config = snapshot.config;

    canvas.fill_rect(Rect::new(0.0, 0.0, config.width, config.height), SKY);

    for obstacle in snapshot.obstacles {
        let gap_bottom = obstacle.gap_top + config.gap_height;
        canvas.fill_rect(
            Rect::new(obstacle.x, 0.0, config.obstacle_width, obstacle.gap_top),
            PIPE,
        );
        canvas.fill_rect(
            Rect::new(
                obstacle.x,
                gap_bottom,
                config.obstacle_width,
                config.height - gap_bottom,
            ),
            PIPE,
        );
    }

    let actor = snapshot.actor;
    skin.draw(canvas, Rect::new(actor.x, actor.y, actor.width, actor.height));

    match snapshot.game_over {
        None => {
            draw_number(canvas, config.width / 2.0, 20.0, CELL, snapshot.score, WHITE);
            draw_number(canvas, config.width - 40.0, 12.0, HUD_CELL, snapshot.high_score, BEST);
        }
        Some(summary) => draw_game_over(canvas, config.width, config.height, summary),
    }
}

fn draw_game_over(canvas: &mut impl Canvas, width: f64, height: f64, summary: GameOverSummary) {
    canvas.dim();

    let (cx, cy) = (width / 2.0, height / 2.0);
    let (pw, ph) = (240.0, 150.0);
    let panel = Rect::new(cx - pw / 2.0, cy - ph / 2.0, pw, ph);

    canvas.fill_rect(
        Rect::new(panel.x - 4.0, panel.y - 4.0, panel.w + 8.0, panel.h + 8.0),
        SHADOW,
    );
    canvas.fill_rect(panel, PANEL);
    canvas.fill_rect(
        Rect::new(panel.x + 4.0, panel.y + 4.0, panel.w - 8.0, panel.h - 8.0),
        PANEL_INNER,
    );

    draw_number(canvas, cx, panel.y + 20.0, CELL, summary.final_score, WHITE);
    let best_color = if summary.new_record { GOLD } else { BEST };
    draw_number(canvas, cx, panel.y + 80.0, CELL, summary.high_score, best_color);
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

/// Edge of one digit cell, in playfield units.
const CELL: f64 = 6.0;
/// Smaller cell for the best score in the corner.
const HUD_CELL: f64 = 3.0;
const BEST: Rgb = GOLD.halve();

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_digit(canvas: &mut impl Canvas, x: f64, y: f64, cell: f64, d: usize, fg: Rgb) {
    let glyph = &DIGITS[d];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as f64 * cell;
                let py = y + row as f64 * cell;
                canvas.fill_rect(Rect::new(px + cell / 2.0, py + cell / 2.0, cell, cell), SHADOW);
                canvas.fill_rect(Rect::new(px, py, cell, cell), fg);
            }
        }
    }
}

/// Draw `n` centred on `cx`, top edge at `y`.
fn draw_number(canvas: &mut impl Canvas, cx: f64, y: f64, cell: f64, n: u32, fg: Rgb) {
    let s = n.to_string();
    let advance = cell * 4.0; // 3 cells per digit + 1 cell spacing
    let total_w = s.len() as f64 * advance - cell;
    let start_x = cx - total_w / 2.0;
    for (i, ch) in s.bytes().enumerate() {
        let d = (ch - b'0') as usize;
        draw_digit(canvas, start_x + i as f64 * advance, y, cell, d, fg);
    }
}
