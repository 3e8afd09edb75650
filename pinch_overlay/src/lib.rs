//! # pinch_overlay
//!
//! Interactive front end for [`pinch_core`]: a window that shows the mirrored
//! camera image with hand landmarks drawn over a clickable demo
//! visualization, driven entirely by pinch gestures.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Index tip over an element | Either | Hover highlight (enter/leave) |
//! | Thumb + index pinched ≥ 500 ms | Either | One click at the index tip; marker fades over 2 s |
//! | Release, pinch again | Either | Another click |
//! | Click on a node | Either | Select it (graph/sankey: two selections show the path) |
//! | Click on a tile | Either | Toggle its selection |
//!
//! ## Frame sources
//!
//! * `sim` (default), **Simulation mode**: the mouse drives a synthetic hand.
//! * `replay`: recorded NDJSON detector frames, one JSON object per line.
//! * `leap`, **Hardware mode**: polls a real LeapMotion controller via LeapC
//!   (cargo feature `leap`).
//!
//! ### Simulation controls
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse position | Index tip |
//! | Left button / `Space` held | Pinch |
//! | `L` held | Drive the Left hand instead of the Right |
//! | `1` `2` `3` | Sankey / graph / tiles scene |
//! | `Q` / `Escape` | Quit |

pub mod app;
pub mod canvas;
pub mod font;
pub mod scene;
pub mod source;
pub mod telemetry;
pub mod visualizer;
