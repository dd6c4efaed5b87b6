use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, trace, warn};
use std::path::PathBuf;
use std::time::Instant;

mod clock;
mod output;
mod simulation;

use ballpit_common::SimulationConfig;
use clock::FrameClock;
use simulation::BallSimulation;

/// Command-line arguments for the engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulation config file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the number of frames to simulate
    #[arg(long)]
    frames: Option<u64>,

    /// Override the output base filename
    #[arg(long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    info!("Starting Ballpit Engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(base) = args.output {
        config.output.base_filename = base;
    }

    // --- Initialize Simulation ---
    let total_frames = args.frames.unwrap_or(config.get_sim_params().total_frames);
    let mut sim = BallSimulation::new(config, total_frames)?;
    debug!("Simulation Parameters: {:#?}", sim.params());

    let params = sim.params().clone();
    let mut record_interval_frames = params.record_interval_frames;
    if record_interval_frames == 0 {
        warn!("Record interval is 0 frames. Recording every frame.");
        record_interval_frames = 1;
    }
    info!(
        "Simulating {} frames at {} fps ({}), recording every {} frames.",
        total_frames,
        params.fps,
        if params.realtime { "realtime" } else { "headless" },
        record_interval_frames
    );

    let mut clock = FrameClock::new(params.fps, params.realtime);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (frame 0) ---
    if let Err(e) = sim.record_snapshot() {
        error!("Error recording initial snapshot: {}", e);
        anyhow::bail!("Failed to record initial snapshot.");
    }

    // --- Frame Loop ---
    for frame in 0..total_frames {
        let step_start_time = Instant::now();
        if let Err(e) = sim.step() {
            error!("Error during frame {}: {}", frame + 1, e);
            anyhow::bail!("Simulation step failed.");
        }
        let step_duration = step_start_time.elapsed();

        let is_record_step = (frame + 1) % record_interval_frames == 0;
        let is_last_step = frame + 1 == total_frames;
        if is_record_step || is_last_step {
            if let Err(e) = sim.record_snapshot() {
                error!("Error recording snapshot at frame {}: {}", frame + 1, e);
                anyhow::bail!("Failed to record snapshot.");
            }
        }

        // Print status periodically
        let now = Instant::now();
        if now.duration_since(previous_print_time).as_secs_f64() >= 5.0 || is_last_step {
            sim.log_status();
            previous_print_time = now;
        } else {
            trace!("Frame [{}/{}] completed in {:.3} ms", frame + 1, total_frames, step_duration.as_secs_f64() * 1000.0);
        }

        clock.wait_for_next_tick();
    }

    let total_duration = start_time.elapsed();
    info!("Simulation finished in {:.3} seconds.", total_duration.as_secs_f64());
    if clock.overruns() > 0 {
        warn!("{} frames took longer than the {:.2} ms frame interval.", clock.overruns(), clock.interval().as_secs_f64() * 1000.0);
    }

    // --- Save Recorded Data ---
    let output_config = &sim.config().output;
    if output_config.save_stats {
        let path = output::snapshot_path(&output_config.base_filename, output_config.format);
        if let Err(e) = output::save_snapshots(sim.get_recorded_snapshots(), output_config.format, &path) {
            error!("Error saving snapshots: {:#}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if output_config.save_positions {
        let path = PathBuf::from(format!("{}_final_positions.csv", output_config.base_filename));
        output::save_final_positions(&sim.get_results(), &path)?;
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
