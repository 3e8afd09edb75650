//! The shipped demo files load and replay to the documented result.

use std::path::PathBuf;

use pinch_core::GestureConfig;
use pinch_overlay::app::AppState;
use pinch_overlay::scene::SceneKind;
use pinch_overlay::source::ReplayReader;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos").join(name)
}

#[test]
fn demo_config_matches_defaults() {
    let cfg = GestureConfig::load(demo("pinch.toml")).unwrap();
    assert_eq!(cfg, GestureConfig::default());
}

#[test]
fn demo_replay_selects_a_and_e() {
    let cfg = GestureConfig::default();
    let mut app = AppState::new(&cfg, SceneKind::Graph);

    for frame in ReplayReader::open(&demo("pinch_click.ndjson")).unwrap() {
        app.handle_frame(frame.unwrap());
    }

    assert_eq!(app.clicks(), 2);
    assert_eq!(app.rejected(), 0);
    let selected: Vec<String> = app.scene().selection().map(|id| app.scene().describe(id)).collect();
    assert_eq!(selected, vec!["A", "E"]);

    let a_e = app.scene().find("A-E").unwrap();
    assert!(app.scene().element(a_e).unwrap().on_path);
}
