use newchunks::logger::{self, log, LogSeverity::*};
use newchunks::service::{replay_capture, spawn_event_loop, spawn_periodic_flush};
use newchunks::world::{DimensionId, Registries, WorldId};
use newchunks::{Module, NewChunksSettings, PaletteNewChunks};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const USAGE: &str = "usage: newchunks <capture> <world> <dimension> [settings.json]";

/// Replays a packet capture through the new-chunks module and prints what it found.
#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log(format!("{}", e), Fatal);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> newchunks::Result<()> {
    let capture = PathBuf::from(&args[0]);
    let world = WorldId::new(args[1].as_str());
    let dimension = DimensionId::new(&args[2]);
    let settings = match args.get(3) {
        Some(path) => NewChunksSettings::load(Path::new(path))?,
        None => NewChunksSettings::default(),
    };
    logger::init(settings.log_level);

    let registries = Arc::new(match &settings.registries {
        Some(manifest) => Registries::load(manifest)?,
        None => Registries::default(),
    });

    log(format!("Replaying {} for {} in {}", capture.display(), world, dimension), Info);
    let module = Arc::new(PaletteNewChunks::new(
        &settings,
        registries.clone(),
        world.clone(),
        dimension.clone(),
    ));
    module.enable();

    let flusher = (settings.save_load_to_disk && settings.flush_interval_secs > 0).then(|| {
        spawn_periodic_flush(
            module.clone(),
            Duration::from_secs(settings.flush_interval_secs),
        )
    });

    let (sender, receiver) = mpsc::channel(256);
    let event_loop = spawn_event_loop(module.clone(), receiver);
    let replay = replay_capture(&capture, dimension.clone(), registries, sender).await;
    let events = event_loop
        .await
        .map_err(std::io::Error::from)?;
    let replay = replay?;

    if let Some(flusher) = flusher {
        flusher.abort();
    }
    let new_chunks = module.get_highlights_snapshot(0, 0, i32::MAX / 2, &dimension).len();
    module.disable();

    let report = json!({
        "world": world.name(),
        "dimension": dimension.as_str(),
        "replay": replay,
        "events": events,
        "highlighted": new_chunks,
        "inverse": module.is_inverse(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
