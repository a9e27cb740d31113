use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Result};
use clap::Parser;

use framecore::{
    logger,
    systems::{EntityChurnSystem, ExitAfterFramesSystem, SceneLoaderSystem},
    ConfigLoader, Game, LoopConfig, SceneLoader,
};

const LOADER_BATCH: usize = 64;

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless framecore loop runner")]
struct Cli {
    /// Path to a loop config YAML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene YAML file loaded before the loop starts
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Override the desired framerate
    #[arg(long)]
    framerate: Option<f64>,

    /// Disable frame-rate limiting
    #[arg(long)]
    no_limit: bool,

    /// Number of frames to run before exiting
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Initial time scale
    #[arg(long)]
    time_scale: Option<f32>,

    /// Seed for the entity churn workload
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Entities spawned by the churn workload each frame
    #[arg(long, default_value_t = 2)]
    spawn_per_frame: usize,

    /// Chance that a churn entity is destroyed each frame
    #[arg(long, default_value_t = 0.05)]
    destroy_chance: f64,

    /// Background threads constructing entities while the loop runs
    #[arg(long, default_value_t = 0)]
    loader_threads: usize,

    /// Print the last frame's statistics as JSON
    #[arg(long)]
    stats_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ConfigLoader::new(".");
    let mut config = match &cli.config {
        Some(path) => loader.load_config(path)?,
        None => LoopConfig::default(),
    };
    if let Some(framerate) = cli.framerate {
        config.desired_framerate = framerate;
    }
    if cli.no_limit {
        config.limit_frame_rate = false;
    }
    config.validate()?;
    logger::init(&config.logging.level)?;

    let mut game = Game::new(&config)?;
    game.register(EntityChurnSystem::new(
        cli.seed,
        cli.spawn_per_frame,
        cli.destroy_chance,
    ));
    game.register(ExitAfterFramesSystem::new(cli.frames));

    game.register_as::<dyn SceneLoader, _>(SceneLoaderSystem::new("."));
    if let Some(path) = &cli.scene {
        if let Some(mut scenes) = game.registry().get_mut::<SceneLoaderSystem>() {
            scenes.request_file(path)?;
        }
        game.load_pending_scene()?;
    }
    if let Some(scale) = cli.time_scale {
        game.set_time_scale(scale)?;
    }

    let loaders: Vec<_> = (0..cli.loader_threads)
        .map(|worker| {
            let entities = Arc::clone(game.entities());
            thread::spawn(move || {
                for index in 0..LOADER_BATCH {
                    entities.construct(format!("loaded-{worker}-{index}"));
                    thread::yield_now();
                }
            })
        })
        .collect();

    game.run()?;

    for handle in loaders {
        handle
            .join()
            .map_err(|_| anyhow!("entity loader thread panicked"))?;
    }

    let churn = game.registry().get::<EntityChurnSystem>().map(|churn| {
        (churn.spawned(), churn.destroy_requests())
    });
    println!(
        "Ran {} frames. Live entities: {}. Average frame time: {:?}",
        game.frame_count(),
        game.entities().live_count(),
        game.average_frame_time()
    );
    if let Some((spawned, destroyed)) = churn {
        println!("Churn workload spawned {spawned} entities and retired {destroyed}");
    }
    if cli.stats_json {
        if let Some(stats) = game.recent_stats().latest() {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
    }
    Ok(())
}
