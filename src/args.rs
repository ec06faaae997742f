use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use thiserror::Error;

use crate::capture::{CaptureOrchestrator, CaptureSettings, RingConfig, Target};
use crate::driver::DriverConfig;
use crate::render::color::parse_rgb8;
use crate::render::{Lens, PngEncoder, SoftwareRenderer};
use crate::utils::FileFilter;

#[derive(Error, Debug)]
pub enum ArgsError {
    #[error("Invalid background color {color:?}: {reason}")]
    InvalidColor { color: String, reason: &'static str },
    #[error("Failed to read rings from {path:?}: {source}")]
    RingsFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid rings file {path:?}: {source}")]
    RingsJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Options shared by every subcommand that places capture cameras.
#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Directory the captured images are written to
    #[clap(short, long, default_value = "pngs")]
    pub output_dir: PathBuf,
    /// First component of every image name
    #[clap(long, default_value = "longdress")]
    pub prefix: String,
    #[clap(short = 'W', long, default_value_t = 1024)]
    pub width: u32,
    #[clap(short = 'H', long, default_value_t = 1024)]
    pub height: u32,
    /// Vertical field of view in degrees
    #[clap(long, default_value_t = 60.0)]
    pub fov: f32,
    #[clap(long, default_value_t = 0.1)]
    pub znear: f32,
    #[clap(long, default_value_t = 100.0)]
    pub zfar: f32,
    #[clap(long, default_value = "rgb(0,0,0)")]
    pub bg_color: String,
    /// Splat size in pixels
    #[clap(long, default_value_t = 1)]
    pub point_size: u32,
    /// Factor applied to every position before rendering
    #[clap(long, default_value_t = 1.0)]
    pub scale: f32,
    /// Point the cameras look at: `x,y,z`, or `center` for the centre of each frame
    #[clap(long, default_value = "0,0,0", allow_hyphen_values = true)]
    pub target: Target,
    /// A ring of cameras as `name:count:radius:height:pitch:offset[:off]`. Repeatable.
    ///
    /// Angles are in degrees. Without any ring, a single ring `Ring:8:5:5:0:0` is used.
    #[clap(long = "ring", allow_hyphen_values = true)]
    pub rings: Vec<RingConfig>,
    /// JSON file holding an array of rings. These come before any `--ring`.
    #[clap(long = "rings")]
    pub rings_file: Option<PathBuf>,
}

/// Resolved capture configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub settings: CaptureSettings,
    pub lens: Lens,
    pub bg_color: [u8; 3],
    pub point_size: u32,
    pub scale: f32,
    pub target: Target,
    pub rings: Vec<RingConfig>,
}

impl CaptureArgs {
    pub fn to_config(&self) -> Result<CaptureConfig, ArgsError> {
        let bg_color = parse_rgb8(&self.bg_color).map_err(|reason| ArgsError::InvalidColor {
            color: self.bg_color.clone(),
            reason,
        })?;

        let mut rings = match &self.rings_file {
            Some(path) => read_rings(path)?,
            None => vec![],
        };
        rings.extend(self.rings.iter().cloned());
        if rings.is_empty() {
            rings.push(RingConfig::default());
        }

        Ok(CaptureConfig {
            settings: CaptureSettings {
                output_dir: self.output_dir.clone(),
                prefix: self.prefix.clone(),
                width: self.width,
                height: self.height,
            },
            lens: Lens {
                fovy: self.fov,
                znear: self.znear,
                zfar: self.zfar,
            },
            bg_color,
            point_size: self.point_size,
            scale: self.scale,
            target: self.target,
            rings,
        })
    }
}

fn read_rings(path: &Path) -> Result<Vec<RingConfig>, ArgsError> {
    let json = fs::read_to_string(path).map_err(|source| ArgsError::RingsFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ArgsError::RingsJson {
        path: path.to_path_buf(),
        source,
    })
}

impl CaptureConfig {
    pub fn renderer(&self) -> SoftwareRenderer {
        SoftwareRenderer::new(self.lens)
            .with_scale(self.scale)
            .with_point_size(self.point_size)
            .with_background_color(self.bg_color)
    }

    pub fn orchestrator(&self) -> CaptureOrchestrator<SoftwareRenderer, PngEncoder> {
        CaptureOrchestrator::new(self.renderer(), PngEncoder, self.settings.clone())
    }
}

/// Input selection for a dataset run
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Directory holding the point cloud frames
    pub input_dir: PathBuf,
    /// Extension of the frame files
    #[clap(long, default_value = "ply")]
    pub ext: String,
    /// Only use files whose name starts with this
    #[clap(long)]
    pub file_prefix: Option<String>,
    /// Log and skip frames that fail to decode instead of stopping
    #[clap(long, action = clap::ArgAction::SetTrue)]
    pub skip_failed_frames: bool,
}

impl DatasetArgs {
    pub fn filter(&self) -> FileFilter {
        match &self.file_prefix {
            Some(prefix) => FileFilter::prefix_and_extension(prefix, &self.ext),
            None => FileFilter::extension(&self.ext),
        }
    }

    pub fn driver_config(&self, config: &CaptureConfig) -> DriverConfig {
        DriverConfig {
            input_dir: self.input_dir.clone(),
            filter: self.filter(),
            rings: config.rings.clone(),
            target: config.target,
            scale: config.scale,
            skip_failed_frames: self.skip_failed_frames,
        }
    }
}
