//! pinch_replay: run recorded detector frames through the pipeline headless
//! and print what the scene received.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use pinch_core::{ClickTransition, GestureConfig, HandLabel};
use pinch_overlay::app::AppState;
use pinch_overlay::scene::SceneKind;
use pinch_overlay::source::ReplayReader;
use pinch_overlay::telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "pinch_replay", about = "Replay NDJSON detector frames without a window")]
struct Cli {
    /// NDJSON file, one detector frame per line.
    file: PathBuf,

    /// TOML gesture configuration; defaults apply when the file is missing.
    #[arg(long, default_value = "pinch.toml")]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = SceneKind::Graph)]
    scene: SceneKind,

    /// One JSON object per event instead of text lines.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Action {
    Enter,
    Leave,
    Pinch,
    Release,
    Click,
    Rejected,
}

#[derive(Debug, Serialize)]
struct ReplayEvent {
    timestamp_ms: u64,
    hand:         Option<HandLabel>,
    action:       Action,
    target:       Option<String>,
    x:            Option<f32>,
    y:            Option<f32>,
}

fn emit(event: &ReplayEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        let hand = event.hand.map(|h| h.name()).unwrap_or("-");
        let target = event.target.as_deref().unwrap_or("-");
        let at = match (event.x, event.y) {
            (Some(x), Some(y)) => format!("({x:.1}, {y:.1})"),
            _ => String::new(),
        };
        println!("{:>8} ms  {:<5}  {:<8} {} {}", event.timestamp_ms, hand, format!("{:?}", event.action), target, at);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("warn");

    let gesture = GestureConfig::load_or_default(&cli.config);
    let mut app = AppState::new(&gesture, cli.scene);

    let reader = ReplayReader::open(&cli.file)
        .with_context(|| format!("cannot open replay {}", cli.file.display()))?;

    let mut frames = 0u64;
    for item in reader {
        let mut frame = item.with_context(|| format!("reading {}", cli.file.display()))?;
        frame.hands = gesture.detector.admit(std::mem::take(&mut frame.hands));
        let ts = frame.timestamp_ms;
        let report = app.handle_frame(frame);
        frames += 1;

        for r in &report.rejected {
            emit(
                &ReplayEvent {
                    timestamp_ms: ts,
                    hand: None,
                    action: Action::Rejected,
                    target: Some(r.error.to_string()),
                    x: None,
                    y: None,
                },
                cli.json,
            )?;
        }

        for hand in &report.hands {
            let describe = |id: &usize| app.scene().describe(*id);
            let mut events = Vec::new();
            if let Some(old) = &hand.hover.left {
                events.push((Action::Leave, Some(describe(old))));
            }
            if let Some(new) = &hand.hover.entered {
                events.push((Action::Enter, Some(describe(new))));
            }
            match hand.transition {
                ClickTransition::Started  => events.push((Action::Pinch, None)),
                ClickTransition::Released => events.push((Action::Release, None)),
                _ => {}
            }
            if let Some(target) = &hand.click {
                events.push((Action::Click, Some(target.as_ref().map(describe).unwrap_or_else(|| "nothing".into()))));
            }

            for (action, target) in events {
                emit(
                    &ReplayEvent {
                        timestamp_ms: ts,
                        hand: Some(hand.label),
                        action,
                        target,
                        x: Some(hand.pointer.x),
                        y: Some(hand.pointer.y),
                    },
                    cli.json,
                )?;
            }
        }
    }

    app.source_finished();
    app.shutdown();

    if !cli.json {
        let selected: Vec<String> = app.scene().selection().map(|id| app.scene().describe(id)).collect();
        println!();
        println!("  frames   {frames}");
        println!("  clicks   {}", app.clicks());
        println!("  rejected {}", app.rejected());
        println!("  selected {}", if selected.is_empty() { "-".to_string() } else { selected.join(", ") });
    }
    Ok(())
}
