mod common;

use std::time::Duration;

use common::manual_game;
use framecore::{systems::SceneLoaderSystem, ConfigError, ConfigLoader, Game, SceneLoader};

fn loader() -> ConfigLoader {
    ConfigLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn bundled_loop_config_loads() {
    let config = loader().load_config("config/loop.yaml").expect("config parses");
    assert_eq!(config.desired_framerate, 60.0);
    assert!(config.limit_frame_rate);
    assert_eq!(config.stats_history, 120);

    let game = Game::new(&config).expect("config is valid");
    assert_eq!(game.desired_framerate(), 60.0);
}

#[test]
fn bundled_scene_populates_the_loop() {
    let scene = loader().load_scene("scenes/arena.yaml").expect("scene parses");
    assert_eq!(scene.name, "arena");
    assert_eq!(scene.entity_count(), 14);

    let (mut game, _) = manual_game(Duration::from_millis(16));
    game.load_scene(&scene).unwrap();
    let stats = game.step().unwrap();
    assert_eq!(stats.live_entities, 14);
    assert!(game.entities().find_by_name("enemy-3").is_some());
}

#[test]
fn scene_loader_reads_bundled_scene() {
    let (mut game, pacer) = manual_game(Duration::from_millis(16));
    game.register_as::<dyn SceneLoader, _>(SceneLoaderSystem::new(env!("CARGO_MANIFEST_DIR")));
    if let Some(mut scenes) = game.registry().get_mut::<SceneLoaderSystem>() {
        scenes.request_file("scenes/arena.yaml").expect("scene parses");
    }

    assert!(game.load_pending_scene().unwrap());
    assert_eq!(pacer.resets.get(), 1);
    assert_eq!(game.entities().live_count(), 14);
    assert!(!game.load_pending_scene().unwrap());
}

#[test]
fn malformed_config_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "desired_framerate: [fast]\n").unwrap();

    let err = ConfigLoader::new(dir.path())
        .load_config("broken.yaml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
