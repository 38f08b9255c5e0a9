mod simulation;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use tessera_config::{CliArgs, Config};

use crate::simulation::Simulation;

/// Frames between progress reports.
const REPORT_INTERVAL: u32 = 60;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => match tessera_config::default_config_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to resolve config directory: {e}");
                return ExitCode::FAILURE;
            }
        },
    };
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {e}");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    tessera_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    tracing::info!(
        terrain = ?config.terrain.kind,
        seed = config.terrain.seed,
        radius = config.streaming.generation_radius,
        surface_nets = config.meshing.surface_nets,
        "Starting Tessera"
    );

    let mut simulation = match Simulation::new(&config) {
        Ok(simulation) => simulation,
        Err(e) => {
            tracing::error!("Invalid voxel palette: {e}");
            return ExitCode::FAILURE;
        }
    };

    let frame_duration = Duration::from_millis(config.simulation.frame_millis);
    let dt = if config.simulation.frame_millis == 0 {
        1.0 / 60.0
    } else {
        frame_duration.as_secs_f32()
    };

    let started = Instant::now();
    for frame in 1..=config.simulation.frames {
        let frame_start = Instant::now();
        let stats = simulation.step(dt);
        if stats.failed > 0 {
            tracing::warn!(frame, failed = stats.failed, "chunk generation failed");
        }

        if frame % REPORT_INTERVAL == 0 {
            let observer = simulation.observer();
            tracing::info!(
                frame,
                x = observer.x,
                z = observer.z,
                loaded = simulation.store().len(),
                meshes = simulation.totals().meshes,
                "progress"
            );
        }

        if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    let frames = simulation.frames();
    let totals = simulation.shutdown();
    tracing::info!(
        frames,
        elapsed_ms = started.elapsed().as_millis() as u64,
        generated = totals.generated,
        failed = totals.failed,
        meshes = totals.meshes,
        quads = totals.quads,
        released = totals.released,
        "Simulation finished"
    );
    ExitCode::SUCCESS
}
