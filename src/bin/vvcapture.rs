use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kdam::tqdm;
use log::info;
use vvcapture::args::{CaptureArgs, DatasetArgs};
use vvcapture::capture::plan;
use vvcapture::driver::FrameDriver;
use vvcapture::formats::{Bounds, PointCloudFrame};
use vvcapture::ply::read_ply_file;
use vvcapture::render::Scene;

/// Renders point cloud frames from rings of cameras around a target.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture every frame in a directory, one pass per frame
    Capture {
        #[clap(flatten)]
        dataset: DatasetArgs,
        #[clap(flatten)]
        capture: CaptureArgs,
    },
    /// Capture a single frame, labelled with the current time
    Snapshot {
        /// The frame to capture
        file: PathBuf,
        /// Stop after this many images
        #[clap(long)]
        max_shots: Option<usize>,
        #[clap(flatten)]
        capture: CaptureArgs,
    },
    /// Print the planned camera poses without rendering
    Plan {
        /// Frame used to resolve `--target center`
        #[clap(long)]
        frame: Option<PathBuf>,
        #[clap(flatten)]
        capture: CaptureArgs,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Capture { dataset, capture } => run_capture(dataset, capture),
        Command::Snapshot {
            file,
            max_shots,
            capture,
        } => run_snapshot(file, max_shots, capture),
        Command::Plan { frame, capture } => run_plan(frame, capture),
    }
}

fn run_capture(dataset: DatasetArgs, capture: CaptureArgs) -> Result<()> {
    let config = capture.to_config()?;
    let mut driver = FrameDriver::new(dataset.driver_config(&config), config.orchestrator());
    driver.initialize();

    for _ in tqdm!(0..driver.total_frames()) {
        driver.tick()?;
    }
    driver.tick()?;
    info!(
        "Captured {} of {} frames into {:?}",
        driver.frame_counter(),
        driver.total_frames(),
        config.settings.output_dir
    );
    driver.shutdown();
    Ok(())
}

fn run_snapshot(file: PathBuf, max_shots: Option<usize>, capture: CaptureArgs) -> Result<()> {
    let config = capture.to_config()?;
    let frame = read_ply_file(&file).with_context(|| format!("Failed to read {:?}", file))?;
    if let Some(bounds) = Bounds::of(&frame) {
        info!("{:?} has {} points within {:?}", file, frame.number_of_points, bounds);
    }
    let shots = plan(&config.rings, config.target.resolve(&frame, config.scale))?;

    let mut orchestrator = config.orchestrator();
    orchestrator.initialize();
    orchestrator.scene_mut().replace_points(&frame);

    let mut capture = orchestrator.run_cooperative(&shots)?;
    let mut written = 0;
    while let Some(record) = capture.next() {
        let record = record?;
        println!("{}", record.path.display());
        written += 1;
        if max_shots.map_or(false, |max| written >= max) {
            capture.cancel();
        }
    }
    drop(capture);
    orchestrator.shutdown();
    Ok(())
}

fn run_plan(frame: Option<PathBuf>, capture: CaptureArgs) -> Result<()> {
    let config = capture.to_config()?;
    let frame = match frame {
        Some(path) => read_ply_file(&path).with_context(|| format!("Failed to read {:?}", path))?,
        None => PointCloudFrame::default(),
    };
    let target = config.target.resolve(&frame, config.scale);
    println!("target ({:.3}, {:.3}, {:.3})", target.x, target.y, target.z);
    for shot in plan(&config.rings, target)? {
        let (p, f) = (shot.pose.position, shot.pose.forward);
        println!(
            "{}\t{:02}\tyaw {:8.3}\tposition ({:.3}, {:.3}, {:.3})\tforward ({:.3}, {:.3}, {:.3})",
            shot.ring, shot.index, shot.yaw_degrees, p.x, p.y, p.z, f.x, f.y, f.z
        );
    }
    Ok(())
}
