//! Top-level application state and render loop.
//!
//! `AppState` owns the `GestureSession` and the `Scene` it drives.  It
//! processes `DetectorFrame`s from whichever frame source is running and
//! hands the visualizer a snapshot each tick.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use tracing::{debug, info};

use pinch_core::{
    ClickMarker, CoordinateMapper, DetectorFrame, FrameReport, GestureConfig, GestureSession, VideoFrame,
};

use crate::scene::{ElementId, Scene, SceneKind};
#[cfg(feature = "leap")]
use crate::source::LeapFrameSource;
use crate::source::{spawn_frame_source, ReplayFrameSource, SimFrameSource, SimInput, SourceMessage};
use crate::visualizer::{InputOutcome, Overlay, Visualizer, LEGEND};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Mouse-driven synthetic hand.
    Sim,
    /// NDJSON file of recorded detector frames.
    Replay,
    /// LeapMotion controller (needs the `leap` feature).
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub gesture:  GestureConfig,
    pub source:   SourceKind,
    pub replay:   Option<PathBuf>,
    pub scene:    SceneKind,
    /// Replay at recorded pace rather than as fast as frames can be read.
    pub realtime: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            gesture:  GestureConfig::default(),
            source:   SourceKind::Sim,
            replay:   None,
            scene:    SceneKind::Graph,
            realtime: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── pipeline ──────────────────────────────────────────────────────────
    session:  GestureSession<ElementId>,
    scene:    Scene,
    width:    f32,
    height:   f32,

    // ── latest frame ──────────────────────────────────────────────────────
    video:      Option<VideoFrame>,
    last_frame: Option<(u64, Instant)>,

    // ── counters ──────────────────────────────────────────────────────────
    clicks:   u64,
    rejected: u64,
    finished: bool,

    pub status: String,
}

impl AppState {
    pub fn new(gesture: &GestureConfig, scene: SceneKind) -> Self {
        let (width, height) = (gesture.mapping.canvas_width, gesture.mapping.canvas_height);
        AppState {
            session:    GestureSession::new(gesture),
            scene:      Scene::new(scene, width, height),
            width,
            height,
            video:      None,
            last_frame: None,
            clicks:     0,
            rejected:   0,
            finished:   false,
            status:     format!("Ready  scene={scene}  pinch to click"),
        }
    }

    // ── process one DetectorFrame ─────────────────────────────────────────

    pub fn handle_frame(&mut self, mut frame: DetectorFrame) -> FrameReport<ElementId> {
        if let Some(image) = frame.image.take() {
            self.video = Some(image);
        }

        let report = self.session.process_frame(&frame, &mut self.scene);
        self.last_frame = Some((frame.timestamp_ms, Instant::now()));
        self.rejected += report.rejected.len() as u64;

        for hand in &report.hands {
            if let Some(target) = &hand.click {
                self.clicks += 1;
                let what = match target {
                    Some(id) => self.scene.describe(*id),
                    None     => "nothing".to_string(),
                };
                info!(hand = %hand.label, x = hand.pointer.x, y = hand.pointer.y, target = %what, "click");
                self.status = format!("Click {} > {}", hand.label.name(), what);
            }
        }
        report
    }

    /// Replace the scene.  Element ids from the old scene mean nothing in
    /// the new one, so the session restarts too.
    pub fn switch_scene(&mut self, kind: SceneKind) {
        if kind == self.scene.kind() {
            return;
        }
        self.session.teardown();
        self.scene = Scene::new(kind, self.width, self.height);
        self.status = format!("Scene {kind}");
        info!(%kind, "scene switched");
    }

    pub fn source_finished(&mut self) {
        if !self.finished {
            self.finished = true;
            self.status = format!("Source finished  clicks={}", self.clicks);
            info!(frames = self.session.frames_processed(), clicks = self.clicks, "frame source finished");
        }
    }

    /// Frames have stopped being requested: release all per-hand state.
    pub fn shutdown(&mut self) {
        self.session.teardown();
        info!(
            frames = self.session.frames_processed(),
            clicks = self.clicks,
            rejected = self.rejected,
            "gesture session stopped"
        );
    }

    // ── clock ─────────────────────────────────────────────────────────────

    /// Frame clock extrapolated by wall time since the last frame, so
    /// markers keep fading when frames pause.
    pub fn now_ms(&self) -> u64 {
        match self.last_frame {
            Some((ts, at)) => ts.saturating_add(at.elapsed().as_millis() as u64),
            None => 0,
        }
    }

    pub fn markers_at(&self, now_ms: u64) -> Vec<(ClickMarker, f32)> {
        self.session.markers(now_ms).map(|(m, o)| (*m, o)).collect()
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn session(&self) -> &GestureSession<ElementId> { &self.session }
    pub fn scene(&self) -> &Scene { &self.scene }
    pub fn video(&self) -> Option<&VideoFrame> { self.video.as_ref() }
    pub fn clicks(&self) -> u64 { self.clicks }
    pub fn rejected(&self) -> u64 { self.rejected }
    pub fn is_finished(&self) -> bool { self.finished }
}

// ════════════════════════════════════════════════════════════════════════════
// run: the interactive loop
// ════════════════════════════════════════════════════════════════════════════

fn start_source(cfg: &AppConfig, sim_rx: Receiver<SimInput>) -> Result<Receiver<SourceMessage>> {
    let options = cfg.gesture.detector.clone();
    match cfg.source {
        SourceKind::Sim => {
            let mapper = CoordinateMapper::from_config(&cfg.gesture.mapping);
            Ok(spawn_frame_source(SimFrameSource::new(sim_rx, mapper, options)))
        }
        SourceKind::Replay => {
            let path = cfg.replay.clone().context("--source replay needs --replay FILE")?;
            Ok(spawn_frame_source(ReplayFrameSource { path, options, realtime: cfg.realtime }))
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => Ok(spawn_frame_source(LeapFrameSource { options })),
        #[cfg(not(feature = "leap"))]
        SourceKind::Leap => bail!("this build has no LeapMotion support (rebuild with --features leap)"),
    }
}

pub fn run(cfg: AppConfig) -> Result<()> {
    let mapping = &cfg.gesture.mapping;
    let (w, h) = (mapping.canvas_width as usize, mapping.canvas_height as usize);
    if w == 0 || h == 0 {
        bail!("canvas size {w}x{h} is empty");
    }

    // ── Visualizer (owns the window and, in sim mode, the pointer feed) ──
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let follow_mouse = cfg.source == SourceKind::Sim;
    let mut vis = Visualizer::new("Pinch Overlay", w, h, follow_mouse.then_some(sim_tx))?;

    // ── Frame source on its own thread ────────────────────────────────────
    let frames = start_source(&cfg, sim_rx)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(&cfg.gesture, cfg.scene);
    let mirrored = mapping.mirrored;

    // ── Main loop ─────────────────────────────────────────────────────────
    let outcome = 'frames: loop {
        if !vis.is_open() {
            break Ok(());
        }

        // 1. Poll window input
        match vis.poll_input() {
            InputOutcome::Quit => break Ok(()),
            InputOutcome::SwitchScene(kind) => app.switch_scene(kind),
            InputOutcome::Continue => {}
        }

        // 2. Drain detector frames, in order
        loop {
            match frames.try_recv() {
                Ok(SourceMessage::Frame(frame)) => {
                    app.handle_frame(frame);
                }
                Ok(SourceMessage::Failed(e)) => {
                    break 'frames Err(anyhow::Error::new(e).context("frame source failed"));
                }
                Ok(SourceMessage::Finished) | Err(TryRecvError::Disconnected) => {
                    app.source_finished();
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        // 3. Render
        let markers = app.markers_at(app.now_ms());
        let overlay = Overlay {
            video:   app.video(),
            mirrored,
            scene:   app.scene(),
            hands:   app.session().readouts(),
            markers: &markers,
            status:  &app.status,
            legend:  LEGEND,
        };
        if let Err(e) = vis.render(&overlay) {
            break Err(e);
        }
    };

    app.shutdown();
    debug!(ok = outcome.is_ok(), "render loop exited");
    outcome
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::synthetic_hand;
    use pinch_core::{ClickPhase, HandLabel, RawHand, ScreenPoint};

    fn make_app(scene: SceneKind) -> AppState {
        AppState::new(&GestureConfig::default(), scene)
    }

    /// A hand whose index tip maps onto `at`.
    fn hand_at(app: &AppState, label: HandLabel, at: ScreenPoint, pinching: bool) -> RawHand {
        let (nx, ny) = app.session().mapper().to_normalized(at);
        synthetic_hand(label, nx, ny, pinching)
    }

    fn centre_of(app: &AppState, label: &str) -> (ElementId, ScreenPoint) {
        let id = app.scene().find(label).unwrap();
        (id, app.scene().element(id).unwrap().shape.center())
    }

    #[test]
    fn held_pinch_on_node_selects_it() {
        let mut app = make_app(SceneKind::Graph);
        let (a, at) = centre_of(&app, "A");

        let mut t = 0;
        while t <= 700 {
            app.handle_frame(DetectorFrame::new(t, vec![hand_at(&app, HandLabel::Right, at, true)]));
            t += 50;
        }
        assert_eq!(app.clicks(), 1);
        assert_eq!(app.scene().selection().collect::<Vec<_>>(), vec![a]);
        assert_eq!(app.status, "Click Right > A");
        assert_eq!(app.session().click_phase(HandLabel::Right), ClickPhase::Clicked);
    }

    #[test]
    fn open_hand_only_hovers() {
        let mut app = make_app(SceneKind::Tiles);
        let (tile, at) = centre_of(&app, "R1C1");
        for t in 0..30 {
            app.handle_frame(DetectorFrame::new(t * 33, vec![hand_at(&app, HandLabel::Left, at, false)]));
        }
        assert_eq!(app.clicks(), 0);
        assert!(app.scene().element(tile).unwrap().hovered());
        assert_eq!(app.session().hovered(HandLabel::Left), Some(&tile));
    }

    #[test]
    fn frame_image_is_kept_for_background() {
        let mut app = make_app(SceneKind::Tiles);
        assert!(app.video().is_none());
        let img = VideoFrame { width: 2, height: 1, luma: vec![1, 2] };
        app.handle_frame(DetectorFrame::new(0, vec![]).with_image(img.clone()));
        app.handle_frame(DetectorFrame::new(33, vec![]));
        assert_eq!(app.video(), Some(&img));
    }

    #[test]
    fn rejected_hands_are_counted() {
        let mut app = make_app(SceneKind::Graph);
        let mut bad = synthetic_hand(HandLabel::Left, 0.5, 0.5, false);
        bad.label = Some("Middle".into());
        let report = app.handle_frame(DetectorFrame::new(0, vec![bad]));
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(app.rejected(), 1);
    }

    #[test]
    fn switching_scene_restarts_session() {
        let mut app = make_app(SceneKind::Graph);
        let (_, at) = centre_of(&app, "B");
        app.handle_frame(DetectorFrame::new(0, vec![hand_at(&app, HandLabel::Right, at, false)]));
        assert!(!app.session().tracked_hands().is_empty());

        app.switch_scene(SceneKind::Sankey);
        assert_eq!(app.scene().kind(), SceneKind::Sankey);
        assert!(app.session().tracked_hands().is_empty());
    }

    #[test]
    fn markers_follow_the_frame_clock() {
        let mut app = make_app(SceneKind::Tiles);
        let at = ScreenPoint::new(20.0, 20.0);
        let mut t = 0;
        while t <= 600 {
            app.handle_frame(DetectorFrame::new(t, vec![hand_at(&app, HandLabel::Right, at, true)]));
            t += 100;
        }
        assert_eq!(app.clicks(), 1);
        assert_eq!(app.status, "Click Right > nothing");
        assert_eq!(app.markers_at(600).len(), 1);
        assert!(app.now_ms() >= 600);
        assert!(app.markers_at(2600).is_empty());
    }

    #[test]
    fn finish_and_shutdown_are_idempotent() {
        let mut app = make_app(SceneKind::Graph);
        app.source_finished();
        app.source_finished();
        assert!(app.is_finished());
        app.shutdown();
        app.shutdown();
        assert!(app.session().tracked_hands().is_empty());
    }

    #[test]
    fn clock_saturates_at_the_end_of_time() {
        let mut app = make_app(SceneKind::Graph);
        app.handle_frame(DetectorFrame::new(u64::MAX - 1, vec![]));
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(app.now_ms(), u64::MAX);
        assert!(app.markers_at(app.now_ms()).is_empty());
    }

    #[test]
    fn replay_without_path_is_an_error() {
        let cfg = AppConfig { source: SourceKind::Replay, ..AppConfig::default() };
        let (_tx, rx) = mpsc::channel();
        assert!(start_source(&cfg, rx).is_err());
    }
}
