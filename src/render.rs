//! Half-block terminal renderer.
//!
//! Each terminal cell shows two vertically stacked pixels using `▀` with the
//! top pixel as foreground and the bottom as background. The world viewport is
//! scaled to fit the terminal and letterboxed; the HUD and the game-over panel
//! are drawn in screen pixels on top.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};

use crate::arcade::{ArcadeWorld, Runner};
use crate::audio::{EnergyBand, MicStatus};
use crate::game::Animation;
use crate::world::{EntityKind, ScrollableEntity};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    const fn halve(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }
}

impl From<Rgb> for CColor {
    fn from(c: Rgb) -> Self {
        CColor::Rgb {
            r: c.0,
            g: c.1,
            b: c.2,
        }
    }
}

const LETTERBOX: Rgb = Rgb(12, 12, 18);
const SKY_TOP: Rgb = Rgb(38, 44, 92);
const SKY_BOT: Rgb = Rgb(236, 140, 96);
const CITY_FAR: Rgb = Rgb(88, 70, 120);
const CITY_NEAR: Rgb = Rgb(52, 44, 78);
const WINDOW_LIT: Rgb = Rgb(250, 214, 120);
const ROAD: Rgb = Rgb(58, 58, 64);
const ROAD_LINE: Rgb = Rgb(230, 220, 170);
const CURB: Rgb = Rgb(150, 150, 150);
const DINO: Rgb = Rgb(92, 176, 74);
const DINO_DARK: Rgb = Rgb(58, 120, 48);
const DINO_BELLY: Rgb = Rgb(170, 214, 120);
const DINO_HURT: Rgb = Rgb(220, 90, 80);
const BUSH: Rgb = Rgb(46, 128, 52);
const BUSH_DARK: Rgb = Rgb(30, 92, 40);
const CAR_BODY: Rgb = Rgb(28, 36, 70);
const CAR_GLASS: Rgb = Rgb(140, 190, 220);
const TIRE: Rgb = Rgb(20, 20, 20);
const HUB: Rgb = Rgb(150, 150, 150);
const HEADLIGHT: Rgb = Rgb(255, 240, 160);
const SIREN_RED: Rgb = Rgb(240, 40, 40);
const SIREN_BLUE: Rgb = Rgb(50, 90, 250);
const METER_BG: Rgb = Rgb(30, 30, 30);
const METER_RUN: Rgb = Rgb(110, 220, 90);
const METER_JUMP: Rgb = Rgb(250, 160, 60);
const PANEL: Rgb = Rgb(24, 24, 28);
const PANEL_EDGE: Rgb = Rgb(200, 200, 200);
const ALERT: Rgb = Rgb(240, 80, 70);
const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);
const SHADOW: Rgb = Rgb(30, 30, 30);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w && y < self.y + self.h
    }
}

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
    clip: Option<PixelRect>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![LETTERBOX; w * h],
            clip: None,
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, LETTERBOX);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    /// Restrict drawing to `rect` until cleared with `None`.
    pub fn set_clip(&mut self, rect: Option<PixelRect>) {
        self.clip = rect;
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if let Some(clip) = self.clip {
            if !clip.contains(x, y) {
                return;
            }
        }
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill(&mut self, c: Rgb) {
        self.px.iter_mut().for_each(|p| *p = c);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, c: Rgb) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, c);
                }
            }
        }
    }

    fn darken(&mut self) {
        self.px.iter_mut().for_each(|p| *p = p.halve());
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        // None forces the next color change to be emitted.
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if bg != Some(bot) {
                    queue!(out, style::SetBackgroundColor(bot.into()))?;
                    bg = Some(bot);
                }
                if top == bot {
                    queue!(out, style::Print(' '))?;
                } else {
                    if fg != Some(top) {
                        queue!(out, style::SetForegroundColor(top.into()))?;
                        fg = Some(top);
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

#[rustfmt::skip]
static DIGITS: [[u8; 15]; 10] = [
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

#[rustfmt::skip]
static LETTERS: [[u8; 15]; 26] = [
    [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1], // A
    [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,1,0], // B
    [0,1,1, 1,0,0, 1,0,0, 1,0,0, 0,1,1], // C
    [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,1,0], // D
    [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1], // E
    [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0], // F
    [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1], // G
    [1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1], // H
    [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1], // I
    [0,0,1, 0,0,1, 0,0,1, 1,0,1, 0,1,0], // J
    [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1], // K
    [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1], // L
    [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1], // M
    [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,0,1], // N
    [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0], // O
    [1,1,0, 1,0,1, 1,1,0, 1,0,0, 1,0,0], // P
    [0,1,0, 1,0,1, 1,0,1, 1,1,0, 0,1,1], // Q
    [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1], // R
    [0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0], // S
    [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0], // T
    [1,0,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // U
    [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0], // V
    [1,0,1, 1,0,1, 1,1,1, 1,1,1, 1,0,1], // W
    [1,0,1, 1,0,1, 0,1,0, 1,0,1, 1,0,1], // X
    [1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0], // Y
    [1,1,1, 0,0,1, 0,1,0, 1,0,0, 1,1,1], // Z
];

#[rustfmt::skip]
fn glyph(ch: char) -> Option<&'static [u8; 15]> {
    match ch.to_ascii_uppercase() {
        c @ '0'..='9' => Some(&DIGITS[c as usize - '0' as usize]),
        c @ 'A'..='Z' => Some(&LETTERS[c as usize - 'A' as usize]),
        '?' => Some(&[1,1,0, 0,0,1, 0,1,0, 0,0,0, 0,1,0]),
        '!' => Some(&[0,1,0, 0,1,0, 0,1,0, 0,0,0, 0,1,0]),
        ',' => Some(&[0,0,0, 0,0,0, 0,0,0, 0,1,0, 1,0,0]),
        '.' => Some(&[0,0,0, 0,0,0, 0,0,0, 0,0,0, 0,1,0]),
        '-' => Some(&[0,0,0, 0,0,0, 1,1,1, 0,0,0, 0,0,0]),
        ':' => Some(&[0,0,0, 0,1,0, 0,0,0, 0,1,0, 0,0,0]),
        '/' => Some(&[0,0,1, 0,0,1, 0,1,0, 1,0,0, 1,0,0]),
        _ => None,
    }
}

/// Width in pixels of `text`: 3px per glyph plus 1px spacing.
pub fn text_width(text: &str) -> i32 {
    (text.chars().count() as i32 * 4 - 1).max(0)
}

fn draw_text(buf: &mut PixelBuf, x: i32, y: i32, text: &str, fg: Rgb, shadow: bool) {
    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = glyph(ch) else {
            continue; // unknown glyphs render as blanks
        };
        let gx = x + i as i32 * 4;
        for row in 0..5 {
            for col in 0..3 {
                if glyph[row * 3 + col] == 1 {
                    let px = gx + col as i32;
                    let py = y + row as i32;
                    if shadow {
                        buf.set(px + 1, py + 1, SHADOW);
                    }
                    buf.set(px, py, fg);
                }
            }
        }
    }
}

fn draw_text_centered(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, fg: Rgb) {
    draw_text(buf, cx - text_width(text) / 2, y, text, fg, true);
}

/// `"0-60HZ"`, `"2K-16KHZ"`.
pub fn band_label(band: EnergyBand) -> String {
    fn hz(v: f32) -> String {
        if v >= 1000.0 && (v % 1000.0).abs() < f32::EPSILON {
            format!("{}K", (v / 1000.0) as u32)
        } else {
            format!("{}", v.round() as u32)
        }
    }
    format!("{}-{}HZ", hz(band.low_hz), hz(band.high_hz))
}

fn hash01(seed: i64) -> f32 {
    let x = (seed as u64)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    let bits = (x >> 33) ^ x;
    (bits % 1000) as f32 / 1000.0
}

// ── World viewport ──────────────────────────────────────────────────────────

/// Maps world units onto the letterboxed viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub scale: f32,
    pub rect: PixelRect,
    pub scroll: f32,
    pub world_w: f32,
    pub world_h: f32,
}

impl View {
    pub fn fit(pw: usize, ph: usize, world_w: f32, world_h: f32, scroll: f32) -> Self {
        let scale = (pw as f32 / world_w).min(ph as f32 / world_h);
        let w = (world_w * scale).round() as i32;
        let h = (world_h * scale).round() as i32;
        Self {
            scale,
            rect: PixelRect {
                x: (pw as i32 - w) / 2,
                y: (ph as i32 - h) / 2,
                w,
                h,
            },
            scroll,
            world_w,
            world_h,
        }
    }

    pub fn sx(&self, wx: f32) -> i32 {
        self.rect.x + ((wx - self.scroll) * self.scale).round() as i32
    }

    pub fn sy(&self, wy: f32) -> i32 {
        self.rect.y + (wy * self.scale).round() as i32
    }

    /// World x under screen column `sx`.
    pub fn world_x(&self, sx: i32) -> f32 {
        self.scroll + (sx - self.rect.x) as f32 / self.scale
    }

    pub fn world_y(&self, sy: i32) -> f32 {
        (sy - self.rect.y) as f32 / self.scale
    }

    fn len(&self, d: f32) -> i32 {
        ((d * self.scale).round() as i32).max(1)
    }

    fn rect(&self, buf: &mut PixelBuf, x: f32, y: f32, w: f32, h: f32, c: Rgb) {
        let x0 = self.sx(x);
        let y0 = self.sy(y);
        let x1 = self.sx(x + w).max(x0 + 1);
        let y1 = self.sy(y + h).max(y0 + 1);
        buf.fill_rect(x0, y0, x1 - x0, y1 - y0, c);
    }

    fn circle(&self, buf: &mut PixelBuf, x: f32, y: f32, r: f32, c: Rgb) {
        buf.fill_circle(self.sx(x), self.sy(y), self.len(r), c);
    }
}

const ROAD_H: f32 = 24.0;

fn draw_background(buf: &mut PixelBuf, view: &View) {
    let r = view.rect;
    let ground = view.world_h - ROAD_H;
    for y in r.y..r.y + r.h {
        let t = ((y - r.y) * 256 / r.h.max(1)) as u16;
        let sky = Rgb::lerp(SKY_TOP, SKY_BOT, t);
        let wy = view.world_y(y);
        for x in r.x..r.x + r.w {
            let wx = view.world_x(x);
            let mut c = sky;

            // far skyline at half speed
            let far = (wx - view.scroll * 0.5) / 70.0;
            let far_top = ground - 60.0 - hash01(far.floor() as i64) * 90.0;
            if wy >= far_top {
                c = CITY_FAR;
            }

            // near blocks scroll with the camera
            let block = (wx / 110.0).floor() as i64;
            let seed = hash01(block * 31 + 7);
            if seed > 0.3 {
                let top = ground - 90.0 - seed * 120.0;
                if wy >= top {
                    c = CITY_NEAR;
                    let lx = wx.rem_euclid(110.0) as i32;
                    let ly = (wy - top) as i32;
                    let floor = ly / 22;
                    if lx % 18 >= 6 && lx % 18 < 12 && lx < 100 && ly % 22 >= 8 && ly % 22 < 14 {
                        if hash01(block * 97 + floor as i64 + (lx / 18) as i64 * 13) > 0.45 {
                            c = WINDOW_LIT;
                        }
                    }
                }
            }

            buf.set(x, y, c);
        }
    }

    // road
    view.rect(buf, view.scroll, ground, view.world_w, ROAD_H, ROAD);
    view.rect(buf, view.scroll, ground, view.world_w, 3.0, CURB);
    let first = (view.scroll / 60.0).floor() as i64;
    for k in first..first + (view.world_w / 60.0) as i64 + 2 {
        view.rect(buf, k as f32 * 60.0, ground + 12.0, 30.0, 3.0, ROAD_LINE);
    }
}

fn draw_bush(buf: &mut PixelBuf, view: &View, bush: &ScrollableEntity) {
    let k = bush.width / 60.0;
    let x = bush.x;
    let ground = view.world_h;
    view.circle(buf, x + 15.0 * k, ground - 16.0 * k, 16.0 * k, BUSH_DARK);
    view.circle(buf, x + 45.0 * k, ground - 14.0 * k, 14.0 * k, BUSH_DARK);
    view.circle(buf, x + 30.0 * k, ground - 24.0 * k, 22.0 * k, BUSH);
    view.circle(buf, x + 24.0 * k, ground - 30.0 * k, 6.0 * k, BUSH_DARK);
}

fn draw_cop_car(buf: &mut PixelBuf, view: &View, car: &ScrollableEntity, frame: u64) {
    let k = car.width / 120.0;
    let x = car.x;
    let g = view.world_h;

    view.rect(buf, x + 28.0 * k, g - 64.0 * k, 62.0 * k, 24.0 * k, CAR_BODY);
    view.rect(buf, x + 34.0 * k, g - 60.0 * k, 22.0 * k, 16.0 * k, CAR_GLASS);
    view.rect(buf, x + 62.0 * k, g - 60.0 * k, 22.0 * k, 16.0 * k, CAR_GLASS);
    view.rect(buf, x, g - 42.0 * k, car.width, 26.0 * k, CAR_BODY);
    view.rect(buf, x + 30.0 * k, g - 38.0 * k, 60.0 * k, 12.0 * k, WHITE);
    view.rect(buf, x, g - 36.0 * k, 6.0 * k, 6.0 * k, HEADLIGHT);

    let flip = (frame / 8) % 2 == 0;
    let (left, right) = if flip {
        (SIREN_RED, SIREN_BLUE.halve())
    } else {
        (SIREN_RED.halve(), SIREN_BLUE)
    };
    view.rect(buf, x + 46.0 * k, g - 71.0 * k, 13.0 * k, 7.0 * k, left);
    view.rect(buf, x + 59.0 * k, g - 71.0 * k, 13.0 * k, 7.0 * k, right);

    for wheel in [24.0, 96.0] {
        view.circle(buf, x + wheel * k, g - 13.0 * k, 13.0 * k, TIRE);
        view.circle(buf, x + wheel * k, g - 13.0 * k, 5.0 * k, HUB);
    }
}

fn draw_runner(buf: &mut PixelBuf, view: &View, runner: &Runner) {
    let x = runner.x;
    let feet = runner.y;
    let t = runner.animation_time();

    if runner.animation() == Animation::Dead {
        view.rect(buf, x - 58.0, feet - 14.0, 22.0, 10.0, DINO);
        view.rect(buf, x - 40.0, feet - 30.0, 60.0, 30.0, DINO);
        view.rect(buf, x - 24.0, feet - 14.0, 30.0, 10.0, DINO_BELLY);
        view.rect(buf, x + 18.0, feet - 24.0, 36.0, 24.0, DINO);
        view.rect(buf, x + 34.0, feet - 18.0, 9.0, 2.0, BLACK);
        view.rect(buf, x + 37.5, feet - 21.5, 2.0, 9.0, BLACK);
        return;
    }

    let skin = if runner.animation() == Animation::Death && (t * 8.0) as u32 % 2 == 0 {
        DINO_HURT
    } else {
        DINO
    };

    // tail, body, head
    view.rect(buf, x - 44.0, feet - 48.0, 8.0, 6.0, skin);
    view.rect(buf, x - 38.0, feet - 54.0, 18.0, 10.0, skin);
    view.rect(buf, x - 22.0, feet - 62.0, 42.0, 36.0, skin);
    view.rect(buf, x - 10.0, feet - 46.0, 26.0, 16.0, DINO_BELLY);
    view.rect(buf, x + 4.0, feet - 88.0, 36.0, 26.0, skin);
    view.rect(buf, x + 22.0, feet - 70.0, 18.0, 3.0, DINO_DARK);
    view.rect(buf, x + 18.0, feet - 46.0, 10.0, 5.0, DINO_DARK);

    if runner.animation() == Animation::Death {
        view.rect(buf, x + 24.0, feet - 81.0, 8.0, 2.0, BLACK);
        view.rect(buf, x + 27.0, feet - 84.0, 2.0, 8.0, BLACK);
    } else {
        view.rect(buf, x + 24.0, feet - 84.0, 7.0, 7.0, WHITE);
        view.rect(buf, x + 28.0, feet - 82.0, 3.0, 3.0, BLACK);
    }

    // legs
    let (back, front) = match runner.animation() {
        Animation::Run if (t * 10.0) as u32 % 2 == 0 => (26.0, 16.0),
        Animation::Run => (16.0, 26.0),
        _ => (20.0, 20.0),
    };
    view.rect(buf, x - 16.0, feet - 26.0, 10.0, back, DINO_DARK);
    view.rect(buf, x + 4.0, feet - 26.0, 10.0, front, DINO_DARK);
}

// ── HUD and overlays ────────────────────────────────────────────────────────

/// Values the HUD shows on top of the world.
#[derive(Debug, Clone, Copy)]
pub struct Hud<'a> {
    pub score: i64,
    pub run_energy: f32,
    pub jump_energy: f32,
    /// Jump band energy that triggers a jump.
    pub jump_threshold: f32,
    pub run_band: EnergyBand,
    pub jump_band: EnergyBand,
    pub mic: &'a MicStatus,
    pub game_over: bool,
}

pub struct Scene<'a> {
    pub world: &'a ArcadeWorld,
    pub entities: &'a [ScrollableEntity],
    pub hud: Hud<'a>,
}

fn draw_meter(buf: &mut PixelBuf, x: i32, y: i32, w: i32, level: f32, marker: Option<f32>, c: Rgb) {
    buf.fill_rect(x, y, w, 3, METER_BG);
    let filled = (level.clamp(0.0, 1.0) * w as f32).round() as i32;
    buf.fill_rect(x, y, filled, 3, c);
    if let Some(marker) = marker.filter(|m| (0.0..=1.0).contains(m)) {
        let mx = x + (marker * w as f32).round() as i32;
        buf.fill_rect(mx, y - 1, 1, 5, WHITE);
    }
}

fn draw_hud(buf: &mut PixelBuf, view: &View, hud: &Hud) {
    let x = view.rect.x + 2;
    let y = view.rect.y + 2;
    draw_text(buf, x, y, &format!("SCORE {}", hud.score.max(0)), WHITE, true);

    let meter_w = 40.min(view.rect.w / 3).max(8);
    let run_label = format!("RUN {}", band_label(hud.run_band));
    let jump_label = format!("JUMP {}", band_label(hud.jump_band));
    draw_text(buf, x, y + 8, &run_label, WHITE, true);
    draw_meter(buf, x, y + 14, meter_w, hud.run_energy, None, METER_RUN);

    let jx = x + meter_w.max(text_width(&run_label)) + 6;
    draw_text(buf, jx, y + 8, &jump_label, WHITE, true);
    draw_meter(
        buf,
        jx,
        y + 14,
        meter_w,
        hud.jump_energy,
        Some(hud.jump_threshold),
        METER_JUMP,
    );

    let badge = match hud.mic {
        MicStatus::Live { .. } => None,
        MicStatus::Unopened => Some("MIC..."),
        MicStatus::Silent(_) => Some("NO MIC"),
    };
    if let Some(badge) = badge {
        let bx = view.rect.x + view.rect.w - text_width(badge) - 3;
        draw_text(buf, bx, y, badge, ALERT, true);
    }
}

/// Dim the scene and show the prompt. Returns the retry button's bounds.
fn draw_game_over(buf: &mut PixelBuf, view: &View, score: i64) -> PixelRect {
    buf.set_clip(None);
    buf.darken();

    let cx = view.rect.x + view.rect.w / 2;
    let cy = view.rect.y + view.rect.h / 2;
    let title = "GAME OVER, DINO!";
    let panel_w = text_width(title) + 12;
    let panel_h = 34;
    let px = cx - panel_w / 2;
    let py = cy - panel_h / 2;

    buf.fill_rect(px - 1, py - 1, panel_w + 2, panel_h + 2, PANEL_EDGE);
    buf.fill_rect(px, py, panel_w, panel_h, PANEL);
    draw_text_centered(buf, cx, py + 4, title, WHITE);
    draw_text_centered(buf, cx, py + 12, &format!("SCORE {}", score.max(0)), WINDOW_LIT);

    let label = "TRY AGAIN ?";
    let button = PixelRect {
        x: cx - text_width(label) / 2 - 3,
        y: py + 21,
        w: text_width(label) + 6,
        h: 9,
    };
    buf.fill_rect(button.x, button.y, button.w, button.h, PANEL_EDGE);
    buf.fill_rect(button.x + 1, button.y + 1, button.w - 2, button.h - 2, SHADOW);
    draw_text_centered(buf, cx, button.y + 2, label, WHITE);
    button
}

pub struct Renderer {
    buf: PixelBuf,
    frame: u64,
    retry_button: Option<PixelRect>,
}

impl Renderer {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            buf: PixelBuf::new(cols as usize, rows as usize * 2),
            frame: 0,
            retry_button: None,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.buf.resize(cols as usize, rows as usize * 2);
    }

    pub fn draw(&mut self, scene: &Scene) {
        self.frame += 1;
        let world = scene.world;
        let view = View::fit(
            self.buf.width(),
            self.buf.height(),
            world.width(),
            world.height(),
            world.scroll_offset(),
        );

        self.buf.set_clip(None);
        self.buf.fill(LETTERBOX);
        self.buf.set_clip(Some(view.rect));

        draw_background(&mut self.buf, &view);
        for entity in scene.entities {
            match entity.kind {
                EntityKind::Decoration => draw_bush(&mut self.buf, &view, entity),
                EntityKind::Obstacle => draw_cop_car(&mut self.buf, &view, entity, self.frame),
            }
        }
        draw_runner(&mut self.buf, &view, world.runner());
        draw_hud(&mut self.buf, &view, &scene.hud);

        self.retry_button = if scene.hud.game_over {
            Some(draw_game_over(&mut self.buf, &view, scene.hud.score))
        } else {
            None
        };
        self.buf.set_clip(None);
    }

    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        self.buf.render(out)
    }

    /// Whether a click on terminal cell (`column`, `row`) lands on the retry
    /// button of the game-over prompt.
    pub fn retry_hit(&self, column: u16, row: u16) -> bool {
        let x = column as i32;
        let y = row as i32 * 2;
        self.retry_button
            .is_some_and(|b| b.contains(x, y) || b.contains(x, y + 1))
    }
}
