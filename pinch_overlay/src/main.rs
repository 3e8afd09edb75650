//! pinch_overlay: interactive entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use pinch_core::GestureConfig;
use pinch_overlay::app::{run, AppConfig, SourceKind};
use pinch_overlay::scene::SceneKind;
use pinch_overlay::telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "pinch_overlay", about = "Drive a visualization with pinch gestures")]
struct Cli {
    /// TOML gesture configuration; defaults apply when the file is missing.
    #[arg(long, default_value = "pinch.toml")]
    config: PathBuf,

    /// Where detector frames come from.
    #[arg(long, value_enum, default_value_t = SourceKind::Sim)]
    source: SourceKind,

    /// NDJSON file for `--source replay`.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Visualization to drive.
    #[arg(long, value_enum, default_value_t = SceneKind::Graph)]
    scene: SceneKind,

    /// Replay at the recorded pace.
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("info");

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║           Pinch Overlay — gesture-driven pointer             ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    match cli.source {
        SourceKind::Sim    => println!("  Mode: mouse simulation  (hold button or Space to pinch)"),
        SourceKind::Replay => println!("  Mode: replay"),
        SourceKind::Leap   => println!("  Mode: LeapMotion hardware"),
    }
    println!("  Scene: {}", cli.scene);
    println!();

    let cfg = AppConfig {
        gesture:  GestureConfig::load_or_default(&cli.config),
        source:   cli.source,
        replay:   cli.replay,
        scene:    cli.scene,
        realtime: cli.realtime,
    };

    println!("  Opening overlay window…");
    println!();

    run(cfg)
}
