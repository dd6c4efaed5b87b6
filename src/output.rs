use anyhow::{Context, Result};
use ballpit_common::{OutputFormat, Snapshot};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Path of the snapshot file for a base filename and format.
pub fn snapshot_path(base_filename: &str, format: OutputFormat) -> PathBuf {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Bincode => "bin",
        OutputFormat::Messagepack => "msgpack",
    };
    PathBuf::from(format!("{}_snapshots.{}", base_filename, extension))
}

/// Writes all snapshots in the requested format.
///
/// The bincode layout is a `u32` snapshot count followed by the snapshots one
/// after another, which is what the visualizer streams from.
pub fn save_snapshots(snapshots: &[Snapshot], format: OutputFormat, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Error creating snapshot file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, snapshots).context("Error serializing snapshots to JSON")?;
        }
        OutputFormat::Bincode => {
            write_snapshot_stream(&mut writer, snapshots)?;
        }
        OutputFormat::Messagepack => {
            rmp_serde::encode::write(&mut writer, snapshots).context("Error serializing snapshots to MessagePack")?;
        }
    }
    writer.flush()?;

    info!("{} snapshots saved to {} ({:?} format)", snapshots.len(), path.display(), format);
    Ok(())
}

/// Count header followed by each snapshot.
pub fn write_snapshot_stream<W: Write>(mut writer: W, snapshots: &[Snapshot]) -> Result<()> {
    let count = u32::try_from(snapshots.len()).context("Too many snapshots for the stream header")?;
    bincode::serialize_into(&mut writer, &count).context("Error writing snapshot count")?;
    for snapshot in snapshots {
        bincode::serialize_into(&mut writer, snapshot).context("Error serializing snapshot to bincode")?;
    }
    Ok(())
}

/// Writes final ball positions as CSV.
pub fn save_final_positions(positions: &[(f64, f64, f64)], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["x", "y", "radius"])?;
    for (x, y, radius) in positions {
        writer.write_record(&[format!("{:.4}", x), format!("{:.4}", y), format!("{:.4}", radius)])?;
    }
    writer.flush()?;
    info!("Final positions saved to {}", path.display());
    Ok(())
}
