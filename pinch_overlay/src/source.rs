//! Frame sources: where detector frames come from.
//!
//! Every source runs on its own thread and delivers [`SourceMessage`]s over
//! an `mpsc` channel.  The render loop never needs to know whether frames
//! came from the mouse simulator, a replay file or real hardware.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use pinch_core::landmark::{LANDMARK_COUNT, WRIST};
use pinch_core::{
    CoordinateMapper, DetectorFrame, DetectorOptions, HandLabel, Landmark, RawHand, ScreenPoint,
    VideoFrame,
};

// ════════════════════════════════════════════════════════════════════════════
// Messages & errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum SourceMessage {
    Frame(DetectorFrame),
    /// The source could not start or hit unreadable input.  Nothing more
    /// will arrive.
    Failed(SourceError),
    /// The source ran out of frames (end of a replay).
    Finished,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not start {source_name} source: {reason}")]
    Init { source_name: &'static str, reason: String },

    #[error("replay line {line} is not a detector frame")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`DetectorFrame`]s over a channel.
pub trait FrameSource: Send + 'static {
    fn name(&self) -> &'static str;
    fn run(self: Box<Self>, tx: Sender<SourceMessage>);
}

/// Spawn a frame source on its own thread and return the receiving end.
pub fn spawn_frame_source<S: FrameSource>(source: S) -> Receiver<SourceMessage> {
    let (tx, rx) = mpsc::channel();
    info!(source = source.name(), "starting frame source");
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource: mouse-driven synthetic hand (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot of the overlay window's pointer, sent every render tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimPointer {
    /// Window position of the mouse; `None` when it left the window.
    pub position: Option<ScreenPoint>,
    /// Mouse button or Space held.
    pub pinching: bool,
    pub hand:     HandLabel,
}

impl Default for SimPointer {
    fn default() -> Self {
        SimPointer { position: None, pinching: false, hand: HandLabel::Right }
    }
}

/// Raw input from the overlay window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    Pointer(SimPointer),
    Quit,
}

/// Synthesises one hand per frame from [`SimInput`], at a fixed cadence.
///
/// The index tip sits wherever the mouse is (via the inverse of the overlay
/// mapping); holding the button closes the thumb onto it.
pub struct SimFrameSource {
    pub rx:       Receiver<SimInput>,
    pub mapper:   CoordinateMapper,
    pub options:  DetectorOptions,
    pub interval: Duration,
}

impl SimFrameSource {
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);
    pub const VIDEO_W: usize = 160;
    pub const VIDEO_H: usize = 90;

    pub fn new(rx: Receiver<SimInput>, mapper: CoordinateMapper, options: DetectorOptions) -> Self {
        SimFrameSource { rx, mapper, options, interval: Self::FRAME_INTERVAL }
    }

    /// Build the frame for one tick.
    pub fn frame_at(&self, pointer: &SimPointer, timestamp_ms: u64) -> DetectorFrame {
        let mut hands = Vec::new();
        if let Some(p) = pointer.position {
            let (nx, ny) = self.mapper.to_normalized(p);
            hands.push(synthetic_hand(pointer.hand, nx, ny, pointer.pinching));
        }
        DetectorFrame::new(timestamp_ms, self.options.admit(hands))
            .with_image(procedural_video(Self::VIDEO_W, Self::VIDEO_H, timestamp_ms))
    }
}

impl FrameSource for SimFrameSource {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn run(self: Box<Self>, tx: Sender<SourceMessage>) {
        let start = Instant::now();
        let mut pointer = SimPointer::default();

        loop {
            // Keep only the newest pointer snapshot.
            loop {
                match self.rx.try_recv() {
                    Ok(SimInput::Pointer(p)) => pointer = p,
                    Ok(SimInput::Quit) | Err(TryRecvError::Disconnected) => return,
                    Err(TryRecvError::Empty) => break,
                }
            }

            let frame = self.frame_at(&pointer, start.elapsed().as_millis() as u64);
            if tx.send(SourceMessage::Frame(frame)).is_err() {
                return;
            }
            thread::sleep(self.interval);
        }
    }
}

/// A plausible open hand with the index tip at `(nx, ny)`.  When `pinching`
/// the thumb tip sits 0.02 away, otherwise about 0.13.
pub fn synthetic_hand(label: HandLabel, nx: f32, ny: f32, pinching: bool) -> RawHand {
    // Thumb on the hand's outer side in the unflipped camera image.
    let s = match label {
        HandLabel::Right => 1.0,
        HandLabel::Left  => -1.0,
    };
    let thumb = if pinching { (nx + s * 0.02, ny) } else { (nx + s * 0.12, ny + 0.05) };

    let mut tips = [(0.0_f32, 0.0_f32); 5];
    tips[0] = thumb;
    tips[1] = (nx, ny);
    tips[2] = (nx - s * 0.04, ny - 0.01);
    tips[3] = (nx - s * 0.08, ny + 0.02);
    tips[4] = (nx - s * 0.12, ny + 0.06);

    let wrist = (nx - s * 0.03, ny + 0.30);
    let mut lms = vec![Landmark::default(); LANDMARK_COUNT];
    lms[WRIST] = Landmark::new(wrist.0, wrist.1, 0.0);

    for (finger, &(tx, ty)) in tips.iter().enumerate() {
        // Four joints per finger, evenly spaced from the wrist to the tip.
        for joint in 1..=4 {
            let t = joint as f32 / 4.0;
            lms[1 + finger * 4 + (joint - 1)] = Landmark::new(
                wrist.0 + (tx - wrist.0) * t,
                wrist.1 + (ty - wrist.1) * t,
                -0.02 * t,
            );
        }
    }

    RawHand::new(label, lms, 0.97)
}

/// Slowly drifting diagonal bands, so the background visibly moves.
pub fn procedural_video(width: usize, height: usize, timestamp_ms: u64) -> VideoFrame {
    let phase = (timestamp_ms / 40) as usize;
    let luma = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let band = ((x + y + phase) / 12) % 2;
            (40 + band * 24 + y * 40 / height.max(1)) as u8
        })
        .collect();
    VideoFrame { width, height, luma }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayFrameSource: NDJSON detector frames
// ════════════════════════════════════════════════════════════════════════════

/// Iterator over the frames of an NDJSON stream.  Blank lines and lines
/// starting with `#` are skipped; line numbers are 1-based.
pub struct ReplayReader<R> {
    lines: std::io::Lines<R>,
    line:  usize,
}

impl<R: BufRead> ReplayReader<R> {
    pub fn new(reader: R) -> Self {
        ReplayReader { lines: reader.lines(), line: 0 }
    }
}

impl ReplayReader<BufReader<File>> {
    pub fn open(path: &std::path::Path) -> Result<Self, SourceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for ReplayReader<R> {
    type Item = Result<DetectorFrame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(t) => t,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line = self.line;
            return Some(
                serde_json::from_str(trimmed).map_err(|source| SourceError::Replay { line, source }),
            );
        }
    }
}

pub struct ReplayFrameSource {
    pub path:     PathBuf,
    pub options:  DetectorOptions,
    /// Pace frames by their timestamps instead of sending them back to back.
    pub realtime: bool,
}

impl FrameSource for ReplayFrameSource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn run(self: Box<Self>, tx: Sender<SourceMessage>) {
        let reader = match ReplayReader::open(&self.path) {
            Ok(r) => r,
            Err(e) => {
                let _ = tx.send(SourceMessage::Failed(SourceError::Init {
                    source_name: "replay",
                    reason: format!("{}: {e}", self.path.display()),
                }));
                return;
            }
        };

        let start = Instant::now();
        let mut first_ts = None;
        let mut count = 0usize;

        for item in reader {
            let mut frame = match item {
                Ok(f) => f,
                Err(e) => {
                    let _ = tx.send(SourceMessage::Failed(e));
                    return;
                }
            };
            frame.hands = self.options.admit(std::mem::take(&mut frame.hands));

            if self.realtime {
                let base = *first_ts.get_or_insert(frame.timestamp_ms);
                let due = Duration::from_millis(frame.timestamp_ms.saturating_sub(base));
                if let Some(wait) = due.checked_sub(start.elapsed()) {
                    thread::sleep(wait);
                }
            }

            if tx.send(SourceMessage::Frame(frame)).is_err() {
                return;
            }
            count += 1;
        }

        debug!(frames = count, path = %self.path.display(), "replay finished");
        let _ = tx.send(SourceMessage::Finished);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapFrameSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Frame source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Joint positions (millimetres above the device) are projected into the
/// same normalized, camera-facing space a video detector reports:
///
/// | Axis | Interaction box | Normalized |
/// |---|---|---|
/// | x | −200 … 200 mm | 1.0 … 0.0 (camera image is unflipped) |
/// | y | 100 … 500 mm above the device | 1.0 … 0.0 |
/// | z | toward the user | scaled by 1/400 |
#[cfg(feature = "leap")]
pub struct LeapFrameSource {
    pub options: DetectorOptions,
}

#[cfg(feature = "leap")]
impl FrameSource for LeapFrameSource {
    fn name(&self) -> &'static str {
        "leap"
    }

    fn run(self: Box<Self>, tx: Sender<SourceMessage>) {
        use leaprs::*;

        let fail = |reason: String| {
            let _ = tx.send(SourceMessage::Failed(SourceError::Init { source_name: "leap", reason }));
        };

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => return fail(format!("LeapC connection: {e:?}")),
        };
        if let Err(e) = connection.open() {
            return fail(format!("LeapMotion device: {e:?}"));
        }

        let start = Instant::now();
        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands = frame
                    .hands()
                    .map(|hand| {
                        let label = if hand.hand_type() == HandType::Left {
                            HandLabel::Left
                        } else {
                            HandLabel::Right
                        };
                        let digits: Vec<_> = hand.digits().collect();
                        let mut lms = vec![Landmark::default(); LANDMARK_COUNT];
                        if let Some(middle) = digits.get(2) {
                            let w = middle.metacarpal().prev_joint();
                            lms[WRIST] = leap_to_landmark(w.x, w.y, w.z);
                        }
                        for (finger, digit) in digits.iter().take(5).enumerate() {
                            let joints = [
                                digit.proximal().prev_joint(),
                                digit.intermediate().prev_joint(),
                                digit.distal().prev_joint(),
                                digit.distal().next_joint(),
                            ];
                            for (j, p) in joints.iter().enumerate() {
                                lms[1 + finger * 4 + j] = leap_to_landmark(p.x, p.y, p.z);
                            }
                        }
                        RawHand::new(label, lms, 1.0)
                    })
                    .collect();

                let frame = DetectorFrame::new(start.elapsed().as_millis() as u64, self.options.admit(hands));
                if tx.send(SourceMessage::Frame(frame)).is_err() {
                    return;
                }
            }
        }
    }
}

/// Millimetres above the controller → normalized camera-space landmark.
pub fn leap_to_landmark(x_mm: f32, y_mm: f32, z_mm: f32) -> Landmark {
    const HALF_WIDTH: f32 = 200.0;
    const FLOOR:      f32 = 100.0;
    const HEIGHT:     f32 = 400.0;
    const DEPTH:      f32 = 400.0;

    Landmark::new(
        1.0 - (x_mm + HALF_WIDTH) / (2.0 * HALF_WIDTH),
        1.0 - (y_mm - FLOOR) / HEIGHT,
        z_mm / DEPTH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinch_core::landmark::INDEX_TIP;
    use pinch_core::{GestureConfig, HandObservation, PinchDetector, PinchError};

    use crate::app::AppState;
    use crate::scene::SceneKind;
    use std::io::Cursor;

    fn sim(rx: Receiver<SimInput>) -> SimFrameSource {
        SimFrameSource::new(rx, CoordinateMapper::default(), DetectorOptions::default())
    }

    #[test]
    fn synthetic_hand_is_well_formed() {
        for label in HandLabel::ALL {
            for pinching in [false, true] {
                let obs = HandObservation::parse(&synthetic_hand(label, 0.4, 0.4, pinching)).unwrap();
                let d = PinchDetector::distance(&obs.thumb_tip(), &obs.index_tip());
                let expect_pinch = d < PinchDetector::CLICK_THRESHOLD;
                assert_eq!(expect_pinch, pinching, "{label} pinching={pinching} d={d}");
            }
        }
    }

    #[test]
    fn sim_places_index_tip_under_the_mouse() {
        let (_tx, rx) = mpsc::channel();
        let src = sim(rx);
        let pointer = SimPointer {
            position: Some(ScreenPoint::new(960.0, 360.0)),
            pinching: false,
            hand: HandLabel::Right,
        };
        let frame = src.frame_at(&pointer, 10);
        assert_eq!(frame.timestamp_ms, 10);
        assert_eq!(frame.hands.len(), 1);
        let tip = frame.hands[0].landmarks[INDEX_TIP];
        let back = src.mapper.map(&tip);
        assert!((back.x - 960.0).abs() < 1e-3 && (back.y - 360.0).abs() < 1e-3);
        assert!(frame.image.is_some());
    }

    #[test]
    fn sim_without_pointer_has_no_hands() {
        let (_tx, rx) = mpsc::channel();
        let frame = sim(rx).frame_at(&SimPointer::default(), 0);
        assert!(frame.hands.is_empty());
    }

    #[test]
    fn sim_thread_stops_on_quit() {
        let (tx, rx) = mpsc::channel();
        tx.send(SimInput::Quit).unwrap();
        let frames = spawn_frame_source(sim(rx));
        // Sender dropped when the thread returns → iteration ends.
        assert_eq!(frames.iter().count(), 0);
    }

    #[test]
    fn replay_reader_skips_blanks_and_numbers_lines() {
        let text = "# recorded\n\n{\"timestamp_ms\": 5, \"hands\": []}\n{\"timestamp_ms\": oops}\n";
        let mut reader = ReplayReader::new(Cursor::new(text));
        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.timestamp_ms, 5);
        match reader.next() {
            Some(Err(SourceError::Replay { line, .. })) => assert_eq!(line, 4),
            other => panic!("expected replay error, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn replay_source_reports_missing_file() {
        let frames = spawn_frame_source(ReplayFrameSource {
            path: PathBuf::from("/nonexistent/pinch-replay.ndjson"),
            options: DetectorOptions::default(),
            realtime: false,
        });
        match frames.recv().unwrap() {
            SourceMessage::Failed(SourceError::Init { source_name, .. }) => assert_eq!(source_name, "replay"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn replay_source_admits_and_finishes() {
        let path = std::env::temp_dir().join(format!("pinch-replay-{}.ndjson", std::process::id()));
        let hand = synthetic_hand(HandLabel::Left, 0.5, 0.5, false);
        let mut low = hand.clone();
        low.confidence = 0.1;
        let frame = DetectorFrame::new(0, vec![low, hand]);
        std::fs::write(&path, format!("{}\n", serde_json::to_string(&frame).unwrap())).unwrap();

        let msgs: Vec<_> = spawn_frame_source(ReplayFrameSource {
            path: path.clone(),
            options: DetectorOptions::default(),
            realtime: false,
        })
        .iter()
        .collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(msgs.len(), 2);
        match &msgs[0] {
            SourceMessage::Frame(f) => {
                assert_eq!(f.hands.len(), 1);
                assert_eq!(f.hands[0].confidence, 0.97);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(msgs[1], SourceMessage::Finished));
    }

    #[test]
    fn replay_rejects_a_badly_shaped_hand_and_keeps_going() {
        let path = std::env::temp_dir().join(format!("pinch-replay-shape-{}.ndjson", std::process::id()));
        let good = serde_json::to_string(&synthetic_hand(HandLabel::Right, 0.5, 0.5, false)).unwrap();
        let bad = r#"{"label":"Left","landmarks":[{"x":0.1}]}"#;
        let next = serde_json::to_string(&DetectorFrame::new(33, vec![])).unwrap();
        std::fs::write(&path, format!("{{\"timestamp_ms\":0,\"hands\":[{good},{bad}]}}\n{next}\n")).unwrap();

        let msgs: Vec<_> = spawn_frame_source(ReplayFrameSource {
            path: path.clone(),
            options: DetectorOptions::default(),
            realtime: false,
        })
        .iter()
        .collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(msgs.len(), 3, "{msgs:?}");
        let SourceMessage::Frame(first) = &msgs[0] else { panic!("unexpected {:?}", msgs[0]) };
        assert_eq!(first.hands.len(), 2);

        let mut app = AppState::new(&GestureConfig::default(), SceneKind::Graph);
        let report = app.handle_frame(first.clone());
        assert_eq!(report.hands.len(), 1);
        assert_eq!(report.hands[0].label, HandLabel::Right);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert!(matches!(report.rejected[0].error, PinchError::Undecodable(_)));

        assert!(matches!(&msgs[1], SourceMessage::Frame(f) if f.timestamp_ms == 33));
        assert!(matches!(msgs[2], SourceMessage::Finished));
    }

    #[test]
    fn leap_projection_corners() {
        let lm = leap_to_landmark(-200.0, 500.0, 0.0);
        assert_eq!((lm.x, lm.y), (1.0, 0.0));
        let lm = leap_to_landmark(200.0, 100.0, 400.0);
        assert_eq!((lm.x, lm.y, lm.z), (0.0, 1.0, 1.0));
    }

    #[test]
    fn procedural_video_has_full_size() {
        let v = procedural_video(16, 9, 1234);
        assert_eq!(v.luma.len(), 144);
    }
}
