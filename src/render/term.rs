//! Terminal canvas: a pixel buffer presented with half-block characters.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};

use super::{Canvas, Rect, Rgb, SKY, Sprite};

// ── Pixel buffer with half-block rendering ──────────────────────────────────

/// A `w × h` pixel grid (two pixels per terminal row) that accepts drawing in
/// logical playfield units and scales it to fit.
pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
    sx: f64,
    sy: f64,
    logical_w: f64,
    logical_h: f64,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize, logical_w: f64, logical_h: f64) -> Self {
        let mut buf = Self {
            w: 0,
            h: 0,
            px: Vec::new(),
            sx: 0.0,
            sy: 0.0,
            logical_w,
            logical_h,
        };
        buf.resize(w, h);
        buf
    }

    /// Sized to a terminal of `cols × rows` cells.
    pub fn for_terminal(cols: u16, rows: u16, logical_w: f64, logical_h: f64) -> Self {
        Self::new(cols as usize, rows as usize * 2, logical_w, logical_h)
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, SKY);
        self.sx = w as f64 / self.logical_w;
        self.sy = h as f64 / self.logical_h;
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    fn set(&mut self, x: i64, y: i64, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    /// Pixel span covered by a logical rect, clipped to the buffer.
    fn span(&self, rect: Rect) -> (i64, i64, i64, i64) {
        let x0 = (rect.x * self.sx).round() as i64;
        let y0 = (rect.y * self.sy).round() as i64;
        let x1 = ((rect.x + rect.w) * self.sx).round() as i64;
        let y1 = ((rect.y + rect.h) * self.sy).round() as i64;
        (
            x0.max(0),
            y0.max(0),
            x1.min(self.w as i64),
            y1.min(self.h as i64),
        )
    }

    /// Write the buffer to `out` starting at the top-left cell.
    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(color(top)))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(color(top)))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(color(bot)))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

fn color(c: Rgb) -> CColor {
    CColor::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

impl Canvas for PixelBuf {
    fn fill_rect(&mut self, rect: Rect, c: Rgb) {
        let (x0, y0, x1, y1) = self.span(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, c);
            }
        }
    }

    fn blit(&mut self, rect: Rect, sprite: &Sprite) {
        // Sample against the unclipped span so a sprite half off-screen keeps
        // its proportions.
        let x0 = (rect.x * self.sx).round() as i64;
        let y0 = (rect.y * self.sy).round() as i64;
        let pw = (((rect.x + rect.w) * self.sx).round() as i64 - x0).max(1);
        let ph = (((rect.y + rect.h) * self.sy).round() as i64 - y0).max(1);

        for dy in 0..ph {
            let sy = (dy * sprite.height as i64 / ph) as usize;
            for dx in 0..pw {
                let sx = (dx * sprite.width as i64 / pw) as usize;
                if let Some(c) = sprite.get(sx, sy) {
                    self.set(x0 + dx, y0 + dy, c);
                }
            }
        }
    }

    fn dim(&mut self) {
        for p in &mut self.px {
            *p = p.halve();
        }
    }
}
