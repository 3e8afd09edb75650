//! Normalized detector coordinates → mirrored screen coordinates.
//!
//! The camera feed is displayed flipped (selfie view) but the detector sees
//! the unflipped image.  Anything that addresses real screen geometry must
//! therefore use
//!
//! ```text
//! screen_x = origin_x + (width - x * width)
//! screen_y = origin_y + y * height
//! ```
//!
//! Forgetting the flip puts every synthetic click on the wrong side of the
//! screen.  [`CoordinateMapper::to_canvas`] is the unflipped variant, only
//! for drawing into a surface that is itself flipped.

use serde::Serialize;

use crate::config::MappingConfig;
use crate::landmark::{Landmark, LANDMARK_COUNT};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        ScreenPoint { x, y }
    }
}

/// Mirrored mapping onto a `width × height` canvas at the origin.
pub fn to_screen(point: &Landmark, width: f32, height: f32) -> ScreenPoint {
    ScreenPoint {
        x: width - point.x * width,
        y: point.y * height,
    }
}

/// Where the video canvas sits on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width:    f32,
    pub height:   f32,
    pub mirrored: bool,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { origin_x: 0.0, origin_y: 0.0, width, height, mirrored: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    viewport: Viewport,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(Viewport::new(1280.0, 720.0))
    }
}

impl CoordinateMapper {
    pub fn new(viewport: Viewport) -> Self {
        CoordinateMapper { viewport }
    }

    pub fn from_config(config: &MappingConfig) -> Self {
        Self::new(Viewport {
            origin_x: config.origin_x,
            origin_y: config.origin_y,
            width: config.canvas_width,
            height: config.canvas_height,
            mirrored: config.mirrored,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Screen position for dispatching input.
    pub fn map(&self, point: &Landmark) -> ScreenPoint {
        let v = &self.viewport;
        let local = if v.mirrored {
            to_screen(point, v.width, v.height)
        } else {
            ScreenPoint::new(point.x * v.width, point.y * v.height)
        };
        ScreenPoint::new(v.origin_x + local.x, v.origin_y + local.y)
    }

    pub fn map_all(&self, points: &[Landmark; LANDMARK_COUNT]) -> [ScreenPoint; LANDMARK_COUNT] {
        points.map(|p| self.map(&p))
    }

    /// Canvas-local, never flipped.
    pub fn to_canvas(&self, point: &Landmark) -> ScreenPoint {
        ScreenPoint::new(point.x * self.viewport.width, point.y * self.viewport.height)
    }

    /// Inverse of [`map`](Self::map): screen position → normalized detector
    /// coordinates.
    pub fn to_normalized(&self, p: ScreenPoint) -> (f32, f32) {
        let v = &self.viewport;
        if v.width <= 0.0 || v.height <= 0.0 {
            return (0.0, 0.0);
        }
        let lx = p.x - v.origin_x;
        let ly = p.y - v.origin_y;
        let nx = if v.mirrored { (v.width - lx) / v.width } else { lx / v.width };
        (nx, ly / v.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_reference_point() {
        let p = to_screen(&Landmark::new(0.25, 0.5, 0.0), 1280.0, 720.0);
        assert_eq!(p, ScreenPoint::new(960.0, 360.0));
    }

    #[test]
    fn mapper_applies_mirror_and_origin() {
        let m = CoordinateMapper::default();
        assert_eq!(m.map(&Landmark::new(0.25, 0.5, 0.0)), ScreenPoint::new(960.0, 360.0));

        let m = CoordinateMapper::new(Viewport { origin_x: 100.0, origin_y: 40.0, ..Viewport::new(1280.0, 720.0) });
        assert_eq!(m.map(&Landmark::new(0.25, 0.5, 0.0)), ScreenPoint::new(1060.0, 400.0));
    }

    #[test]
    fn corners_swap_horizontally() {
        let m = CoordinateMapper::default();
        assert_eq!(m.map(&Landmark::new(0.0, 0.0, 0.0)), ScreenPoint::new(1280.0, 0.0));
        assert_eq!(m.map(&Landmark::new(1.0, 1.0, 0.0)), ScreenPoint::new(0.0, 720.0));
    }

    #[test]
    fn canvas_mapping_is_unflipped() {
        let m = CoordinateMapper::default();
        assert_eq!(m.to_canvas(&Landmark::new(0.25, 0.5, 0.0)), ScreenPoint::new(320.0, 360.0));
    }

    #[test]
    fn unmirrored_config() {
        let cfg = MappingConfig { mirrored: false, ..MappingConfig::default() };
        let m = CoordinateMapper::from_config(&cfg);
        assert_eq!(m.map(&Landmark::new(0.25, 0.5, 0.0)), ScreenPoint::new(320.0, 360.0));
    }

    #[test]
    fn normalized_inverts_map() {
        let m = CoordinateMapper::new(Viewport { origin_x: 10.0, origin_y: 20.0, ..Viewport::new(800.0, 600.0) });
        let lm = Landmark::new(0.125, 0.75, 0.0);
        let (nx, ny) = m.to_normalized(m.map(&lm));
        assert!((nx - 0.125).abs() < 1e-6);
        assert!((ny - 0.75).abs() < 1e-6);
    }
}
