//! Software framebuffer with clipped drawing primitives.
//!
//! Pixels are `0xAARRGGBB`, the layout `minifb` expects.  Every primitive
//! clips against the buffer, so callers can pass coordinates that fall
//! partly or wholly off-screen.

use pinch_core::VideoFrame;

use crate::font::{self, ADVANCE, GLYPH_W};

pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, color: u32) -> Self {
        Canvas { width, height, buf: vec![color; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    pub fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    /// Mix `color` over the existing pixel with weight `alpha`.
    pub fn blend_pixel(&mut self, x: isize, y: isize, color: u32, alpha: f32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let i = y as usize * self.width + x as usize;
            self.buf[i] = blend(self.buf[i], color, alpha);
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32, alpha: f32) {
        let (x0, y0) = (x.max(0.0) as usize, y.max(0.0) as usize);
        let x1 = ((x + w).max(0.0) as usize).min(self.width);
        let y1 = ((y + h).max(0.0) as usize).min(self.height);
        for row in y0..y1 {
            for col in x0..x1 {
                let i = row * self.width + col;
                self.buf[i] = if alpha >= 1.0 { color } else { blend(self.buf[i], color, alpha) };
            }
        }
    }

    pub fn draw_border(&mut self, x: f32, y: f32, w: f32, h: f32, thickness: f32, color: u32) {
        self.fill_rect(x, y, w, thickness, color, 1.0);
        self.fill_rect(x, y + h - thickness, w, thickness, color, 1.0);
        self.fill_rect(x, y, thickness, h, color, 1.0);
        self.fill_rect(x + w - thickness, y, thickness, h, color, 1.0);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32, alpha: f32) {
        let r2 = r * r;
        let (y0, y1) = ((cy - r).floor() as isize, (cy + r).ceil() as isize);
        let (x0, x1) = ((cx - r).floor() as isize, (cx + r).ceil() as isize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    pub fn draw_ring(&mut self, cx: f32, cy: f32, r: f32, thickness: f32, color: u32) {
        let (inner, outer) = ((r - thickness).max(0.0), r);
        let (lo, hi) = (inner * inner, outer * outer);
        let (y0, y1) = ((cy - r).floor() as isize, (cy + r).ceil() as isize);
        let (x0, x1) = ((cx - r).floor() as isize, (cx + r).ceil() as isize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                let d2 = dx * dx + dy * dy;
                if d2 >= lo && d2 <= hi {
                    self.set_pixel(x, y, color);
                }
            }
        }
    }

    /// Thick line made of stamped discs.
    pub fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: u32, alpha: f32) {
        let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let steps = (len / (width / 2.0).max(1.0)).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            self.fill_circle(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, width / 2.0, color, alpha);
        }
    }

    /// Text in the 3×5 font, each glyph pixel drawn as a `scale`² block.
    pub fn draw_label(&mut self, text: &str, x: f32, y: f32, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x as isize;
        let y = y as isize;
        for ch in text.chars() {
            let glyph = font::glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.set_pixel(
                                cx + (col * scale + sx) as isize,
                                y + (row * scale + sy) as isize,
                                color,
                            );
                        }
                    }
                }
            }
            cx += (ADVANCE * scale) as isize;
            if cx >= self.width as isize {
                break;
            }
        }
    }

    /// Fill the whole canvas with `video` as grayscale, horizontally
    /// flipped when `mirrored`, and dimmed toward black by `dim` (0–1).
    pub fn blit_luma(&mut self, video: &VideoFrame, mirrored: bool, dim: f32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let keep = (1.0 - dim).clamp(0.0, 1.0);
        for y in 0..self.height {
            let ny = (y as f32 + 0.5) / self.height as f32;
            for x in 0..self.width {
                let mut nx = (x as f32 + 0.5) / self.width as f32;
                if mirrored {
                    nx = 1.0 - nx;
                }
                let l = (video.sample(nx, ny) as f32 * keep) as u32;
                self.buf[y * self.width + x] = 0xFF000000 | (l << 16) | (l << 8) | l;
            }
        }
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32;
    let (ar, br) = ((a >> 16) & 0xFF, (b >> 16) & 0xFF);
    let (ag, bg) = ((a >> 8) & 0xFF, (b >> 8) & 0xFF);
    let (ab, bb) = (a & 0xFF, b & 0xFF);
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}
