use anyhow::{Context, Result};
use ballpit_common::{clamp, SimulationConfig, Snapshot};
use clap::Parser;
use env_logger::Builder;
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use palette::{FromColor, Hsv, Srgb};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Renders a recorded snapshot stream to PNG frames
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bincode snapshot stream written by the engine
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the PNG frames are written to
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,

    /// Width of the output frames in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Height of the output frames in pixels (calculated from aspect ratio if not provided)
    #[arg(long)]
    height: Option<u32>,

    /// Engine config to take the world size from
    #[arg(long)]
    config: Option<PathBuf>,

    /// World width in simulation units (used if config is not provided)
    #[arg(long, default_value_t = 100.0)]
    world_width: f64,

    /// World height in simulation units (used if config is not provided)
    #[arg(long, default_value_t = 100.0 * (2.0 / 3.0))]
    world_height: f64,

    /// "palette" for one color per ball, otherwise a named color
    /// (black, white, red, green, blue, yellow, cyan, magenta)
    #[arg(long, default_value = "palette")]
    color: String,

    /// Named background color
    #[arg(long, default_value = "white")]
    bg_color: String,

    /// Render every n-th snapshot only
    #[arg(long, default_value_t = 1)]
    stride: usize,

    /// Seed for the palette colors
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Named colors accepted by `--color` and `--bg-color`.
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
];

/// Looks up a named color, falling back to black.
fn parse_color(color_name: &str) -> [u8; 4] {
    NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(color_name))
        .map(|&(_, rgba)| rgba)
        .unwrap_or_else(|| {
            warn!("Unknown color '{}', drawing it black.", color_name);
            [0, 0, 0, 255]
        })
}

/// Evenly spaced hues with slightly jittered saturation and value.
fn generate_color_palette(count: usize, seed: u64) -> Vec<[u8; 4]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut swatches = Vec::with_capacity(count);

    for i in 0..count {
        let hue = i as f32 * 360.0 / count as f32;
        let saturation = 0.7 + rng.random_range(-0.1..0.1);
        let value = 0.8 + rng.random_range(-0.1..0.1);

        let hsv: Hsv = Hsv::new(hue, saturation, value);
        let rgb: Srgb = Srgb::from_color(hsv);

        swatches.push([to_channel(rgb.red), to_channel(rgb.green), to_channel(rgb.blue), 255]);
    }

    // Balls launched one after another should not get neighbouring hues
    swatches.shuffle(&mut rng);
    swatches
}

fn to_channel(component: f32) -> u8 {
    (clamp(component as f64, 0.0, 1.0) * 255.0).round() as u8
}

/// Maps a simulation-space point to pixel coordinates. +Y points down in both.
fn to_pixel(x: f64, y: f64, pixels_per_unit: f64) -> (i32, i32) {
    ((x * pixels_per_unit).round() as i32, (y * pixels_per_unit).round() as i32)
}

/// Draw a single snapshot
fn draw_frame(
    snapshot: &Snapshot,
    width: u32,
    height: u32,
    pixels_per_unit: f64,
    bg_color: [u8; 4],
    color_palette: &[[u8; 4]],
) -> RgbaImage {
    let mut image = ImageBuffer::from_pixel(width, height, Rgba(bg_color));

    if let Some(balls) = &snapshot.balls {
        for (i, ball) in balls.iter().enumerate() {
            let (px, py) = to_pixel(ball.x, ball.y, pixels_per_unit);
            let radius_px = ((ball.radius * pixels_per_unit).round() as i32).max(1);
            // Colors follow insertion order, so a ball keeps its color across frames
            let color = color_palette[i % color_palette.len()];
            draw_filled_circle_mut(&mut image, (px, py), radius_px, Rgba(color));
        }
    }

    image
}

/// Reads a snapshot stream: a `u32` count followed by that many snapshots.
fn read_snapshot_stream<R: Read>(mut reader: R) -> Result<Vec<Snapshot>> {
    let snapshot_count: u32 =
        bincode::deserialize_from(&mut reader).context("Failed to read snapshot count from header")?;

    let mut snapshots = Vec::with_capacity(snapshot_count as usize);
    for i in 0..snapshot_count {
        let snapshot: Snapshot =
            bincode::deserialize_from(&mut reader).with_context(|| format!("Failed to read snapshot {}", i))?;
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

fn frame_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("frame_{:05}.png", index))
}

fn main() -> Result<()> {
    let args = Args::parse();
    Builder::from_default_env().filter(None, LevelFilter::Info).init();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    info!("Starting Ballpit Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output directory: {}", args.output.display());

    // --- Determine World Dimensions ---
    let (world_width, world_height) = if let Some(config_path) = &args.config {
        match SimulationConfig::load(config_path) {
            Ok(config) => {
                info!("Loaded world dimensions from {}", config_path.display());
                let dims = config.dimensions();
                (dims.width, dims.height)
            }
            Err(e) => {
                warn!(
                    "Failed to load config file '{}': {}. Using provided dimensions.",
                    config_path.display(),
                    e
                );
                (args.world_width, args.world_height)
            }
        }
    } else {
        info!("Using provided world dimensions.");
        (args.world_width, args.world_height)
    };
    anyhow::ensure!(world_width > 0.0 && world_height > 0.0, "World dimensions must be positive.");
    anyhow::ensure!(args.stride > 0, "stride must be at least 1.");

    // --- Calculate Output Dimensions and Scale ---
    let output_width_px = args.width;
    let aspect_ratio = world_width / world_height;
    let output_height_px = args.height.unwrap_or_else(|| (output_width_px as f64 / aspect_ratio).round() as u32);

    let scale_x = output_width_px as f64 / world_width;
    let scale_y = output_height_px as f64 / world_height;
    let pixels_per_unit = scale_x.min(scale_y); // Use smaller scale to ensure everything fits

    info!("World size: {:.1} x {:.1} units", world_width, world_height);
    info!("Frame dimensions: {}x{} px, {:.3} pixels per unit", output_width_px, output_height_px, pixels_per_unit);

    // --- Set up Colors ---
    let bg_color = parse_color(&args.bg_color);
    let color_palette: Vec<[u8; 4]> = if args.color.eq_ignore_ascii_case("palette") {
        info!("Using color palette mode for ball coloring");
        generate_color_palette(64, args.seed)
    } else {
        let single_color = parse_color(&args.color);
        info!("Using single color for all balls: {:?}", single_color);
        vec![single_color]
    };

    // --- Read Snapshots ---
    let input_file =
        File::open(&args.input).with_context(|| format!("Failed to open input file: {}", args.input.display()))?;
    let snapshots = read_snapshot_stream(BufReader::new(input_file))?;
    info!("Found {} snapshots in the file", snapshots.len());

    if snapshots.is_empty() {
        warn!("Input file contains no snapshots. Exiting.");
        return Ok(());
    }
    if snapshots.iter().all(|s| s.balls.is_none()) {
        warn!("No snapshots contain ball positions! Frames will be blank.");
        warn!("Enable save_positions_in_snapshot in the engine config.");
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    let selected: Vec<&Snapshot> = snapshots.iter().step_by(args.stride).collect();

    let progress_bar = ProgressBar::new(selected.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();

    // --- Render Frames in Parallel ---
    selected
        .par_iter()
        .enumerate()
        .try_for_each(|(index, snapshot)| -> Result<()> {
            let image = draw_frame(
                snapshot,
                output_width_px,
                output_height_px,
                pixels_per_unit,
                bg_color,
                &color_palette,
            );
            let path = frame_path(&args.output, index);
            image
                .save(&path)
                .with_context(|| format!("Failed to write frame {}", path.display()))?;
            progress_bar.inc(1);
            Ok(())
        })?;

    progress_bar.finish_with_message(format!("Rendered {} frames", selected.len()));

    let duration = start_time.elapsed();
    info!(
        "Rendering completed in {:.2?} ({:.1} frames per second)",
        duration,
        selected.len() as f64 / duration.as_secs_f64().max(1e-9)
    );
    info!("Frames saved to: {}", args.output.display());

    Ok(())
}
