//! Software-rendered overlay window using `minifb`.
//!
//! Layout, back to front:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ RIGHT  PINCH  0.031                                            │
//! │ LEFT   NONE   0.142      ┌──────────── scene panel ─────────┐  │
//! │                          │  nodes / links / tiles           │  │
//! │   mirrored grayscale     │        ·  ·   landmark dots      │  │
//! │   video background       │     ◯ pointer ring   ● marker    │  │
//! │                          └──────────────────────────────────┘  │
//! │ status bar                                                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All drawing goes through [`paint`], which only needs a [`Canvas`]; the
//! window is just where the finished buffer is shown.

use std::sync::mpsc::Sender;

use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use pinch_core::{ClickMarker, GestureLabel, HandLabel, HandReadout, ScreenPoint, VideoFrame};

use crate::canvas::{blend, Canvas};
use crate::font::text_width;
use crate::scene::{Role, Scene, SceneKind, Shape};
use crate::source::{SimInput, SimPointer};

// ════════════════════════════════════════════════════════════════════════════
// Palette & layout
// ════════════════════════════════════════════════════════════════════════════

pub const BG_COLOR:       u32 = 0xFF1A1A2E;
const PANEL_COLOR:        u32 = 0xFF16213E;
const PANEL_BORDER:       u32 = 0xFF0F3460;
const LINK_COLOR:         u32 = 0xFF5C6B8A;
const NODE_COLOR:         u32 = 0xFF8FA8D8;
const SELECTED_COLOR:     u32 = 0xFFFFD700;  // gold
const PATH_COLOR:         u32 = 0xFFFF8C42;
const HOVER_COLOR:        u32 = 0xFFFFFFFF;
const TILE_LO:            u32 = 0xFF23395B;
const TILE_HI:            u32 = 0xFF9AD1D4;
pub const LEFT_COLOR:     u32 = 0xFF00C8FF;
pub const RIGHT_COLOR:    u32 = 0xFFFF5A5A;
pub const MARKER_COLOR:   u32 = 0xFF3C8CFF;
const MARKER_ALPHA:       f32 = 0.8;
const MARKER_RADIUS:      f32 = 14.0;
const DOT_RADIUS:         f32 = 4.0;
const TEXT_BG:            u32 = 0xFF0F3460;
const TEXT_COLOR:         u32 = 0xFFEEEEEE;
const LEGEND_COLOR:       u32 = 0xFF888888;
const STATUS_H:           f32 = 36.0;
const VIDEO_DIM:          f32 = 0.45;

pub fn hand_color(label: HandLabel) -> u32 {
    match label {
        HandLabel::Left  => LEFT_COLOR,
        HandLabel::Right => RIGHT_COLOR,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay snapshot
// ════════════════════════════════════════════════════════════════════════════

/// Everything one rendered frame shows.
pub struct Overlay<'a> {
    pub video:    Option<&'a VideoFrame>,
    pub mirrored: bool,
    pub scene:    &'a Scene,
    pub hands:    &'a [HandReadout],
    /// Live markers with their current opacity.
    pub markers:  &'a [(ClickMarker, f32)],
    pub status:   &'a str,
    pub legend:   &'a str,
}

/// Draw `overlay` into `canvas`.
pub fn paint(canvas: &mut Canvas, overlay: &Overlay<'_>) {
    // ── Background ────────────────────────────────────────────────────────
    match overlay.video {
        Some(v) => canvas.blit_luma(v, overlay.mirrored, VIDEO_DIM),
        None    => canvas.clear(BG_COLOR),
    }

    // ── Scene ─────────────────────────────────────────────────────────────
    for e in overlay.scene.elements() {
        match (e.role, e.shape) {
            (Role::Root, Shape::Rect { x, y, w, h }) => {
                canvas.fill_rect(x, y, w, h, PANEL_COLOR, 0.55);
                canvas.draw_border(x, y, w, h, 2.0, PANEL_BORDER);
                canvas.draw_label(&overlay.scene.kind().to_string(), x + 8.0, y + 8.0, 2, LEGEND_COLOR);
            }
            (Role::Link, Shape::Segment { x0, y0, x1, y1, half_width }) => {
                let color = if e.hovered() {
                    HOVER_COLOR
                } else if e.on_path {
                    PATH_COLOR
                } else {
                    LINK_COLOR
                };
                canvas.draw_line(x0, y0, x1, y1, half_width * 2.0, color, 0.7);
            }
            (Role::Node, shape) => {
                let fill = if e.selected {
                    SELECTED_COLOR
                } else if e.on_path {
                    PATH_COLOR
                } else {
                    NODE_COLOR
                };
                match shape {
                    Shape::Circle { cx, cy, r } => {
                        canvas.fill_circle(cx, cy, r, fill, 1.0);
                        if e.hovered() {
                            canvas.draw_ring(cx, cy, r + 4.0, 3.0, HOVER_COLOR);
                        }
                        let half = text_width(&e.label, 2) as f32 / 2.0;
                        canvas.draw_label(&e.label, cx - half + 1.0, cy - 5.0, 2, PANEL_COLOR);
                    }
                    Shape::Rect { x, y, w, h } => {
                        canvas.fill_rect(x, y, w, h, fill, 1.0);
                        if e.hovered() {
                            canvas.draw_border(x - 3.0, y - 3.0, w + 6.0, h + 6.0, 2.0, HOVER_COLOR);
                        }
                        canvas.draw_label(&e.label, x + w + 6.0, y + h / 2.0 - 5.0, 2, TEXT_COLOR);
                    }
                    Shape::Segment { .. } => {}
                }
            }
            (Role::Tile, Shape::Rect { x, y, w, h }) => {
                canvas.fill_rect(x, y, w, h, blend(TILE_LO, TILE_HI, e.value), 1.0);
                if e.hovered() {
                    canvas.fill_rect(x, y, w, h, HOVER_COLOR, 0.3);
                }
                if e.selected {
                    canvas.draw_border(x, y, w, h, 4.0, SELECTED_COLOR);
                }
            }
            _ => {}
        }
    }

    // ── Click markers ─────────────────────────────────────────────────────
    for (m, opacity) in overlay.markers {
        canvas.fill_circle(m.x, m.y, MARKER_RADIUS, MARKER_COLOR, opacity * MARKER_ALPHA);
    }

    // ── Hands ─────────────────────────────────────────────────────────────
    for hand in overlay.hands {
        let color = hand_color(hand.label);
        let ring = if hand.gesture == GestureLabel::Pinch { 5.0 } else { 2.0 };
        canvas.draw_ring(hand.pointer.x, hand.pointer.y, 14.0, ring, color);
        for dot in &hand.dots {
            canvas.fill_circle(dot.x, dot.y, DOT_RADIUS, color, 1.0);
        }
    }

    // ── Readouts ──────────────────────────────────────────────────────────
    for (i, hand) in overlay.hands.iter().enumerate() {
        let text = format!("{:<6} {:<6} {:.3}", hand.label.name(), hand.gesture.as_str(), hand.pinch_distance);
        canvas.draw_label(&text, 12.0, 12.0 + i as f32 * 20.0, 3, hand_color(hand.label));
    }

    // ── Status bar ────────────────────────────────────────────────────────
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    canvas.fill_rect(0.0, h - STATUS_H, w, STATUS_H, TEXT_BG, 1.0);
    canvas.draw_label(overlay.status, 10.0, h - STATUS_H + 6.0, 2, TEXT_COLOR);
    let kind = overlay.scene.kind().to_string();
    canvas.draw_label(&kind, w - 10.0 - text_width(&kind, 2) as f32, h - STATUS_H + 6.0, 2, TEXT_COLOR);
    canvas.draw_label(overlay.legend, 10.0, h - 12.0, 1, LEGEND_COLOR);
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

/// What the render loop should do after polling the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Quit,
    SwitchScene(SceneKind),
}

pub const LEGEND: &str =
    "MOUSE=index tip  BUTTON/SPACE=pinch  HOLD L=left hand  1/2/3=sankey/graph/tiles  Q=quit";

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    /// Present only when the simulated hand follows the mouse.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(title: &str, width: usize, height: usize, sim_tx: Option<Sender<SimInput>>) -> Result<Self> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("could not open overlay window: {e}"))?;

        window.set_target_fps(60);

        Ok(Visualizer { window, canvas: Canvas::new(width, height, BG_COLOR), sim_tx })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse; forward the pointer to the simulator.
    pub fn poll_input(&mut self) -> InputOutcome {
        if !self.window.is_open() {
            return InputOutcome::Quit;
        }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            if let Some(tx) = &self.sim_tx {
                let _ = tx.send(SimInput::Quit);
            }
            return InputOutcome::Quit;
        }

        let outcome = if pressed(Key::Key1) {
            InputOutcome::SwitchScene(SceneKind::Sankey)
        } else if pressed(Key::Key2) {
            InputOutcome::SwitchScene(SceneKind::Graph)
        } else if pressed(Key::Key3) {
            InputOutcome::SwitchScene(SceneKind::Tiles)
        } else {
            InputOutcome::Continue
        };

        if let Some(tx) = &self.sim_tx {
            let pointer = SimPointer {
                position: self
                    .window
                    .get_mouse_pos(MouseMode::Discard)
                    .map(|(x, y)| ScreenPoint::new(x, y)),
                pinching: self.window.get_mouse_down(MouseButton::Left)
                    || self.window.is_key_down(Key::Space),
                hand: if self.window.is_key_down(Key::L) { HandLabel::Left } else { HandLabel::Right },
            };
            let _ = tx.send(SimInput::Pointer(pointer));
        }

        outcome
    }

    /// Paint one frame and present it.
    pub fn render(&mut self, overlay: &Overlay<'_>) -> Result<()> {
        paint(&mut self.canvas, overlay);
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.window
            .update_with_buffer(self.canvas.pixels(), w, h)
            .map_err(|e| anyhow!("could not present frame: {e}"))
    }
}
