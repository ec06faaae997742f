//! Rendering collaborators used by the capture stage.
//!
//! The capture orchestrator only talks to the traits in this module: a [Scene] that holds the
//! currently displayed frame, a [RenderBackend] that draws the scene into an [OffscreenTarget],
//! and an [Encoder] that turns the read back pixels into file bytes.

pub mod camera;
pub mod color;
pub mod png;
pub mod software;
pub mod target;

use image::{ImageError, RgbImage};
use thiserror::Error;

use crate::formats::PointCloudFrame;

pub use camera::{CameraPose, Lens, Projection};
pub use png::PngEncoder;
pub use software::SoftwareRenderer;
pub use target::OffscreenTarget;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render backend failure: {0}")]
    Backend(String),
}

/// The displayed scene. Replacing the points copies them; the caller keeps ownership of `frame`.
pub trait Scene {
    fn replace_points(&mut self, frame: &PointCloudFrame);
}

pub trait RenderBackend: Scene {
    /// Synchronously renders the current scene as seen from `pose` into `target`.
    fn render(&mut self, pose: &CameraPose, target: &mut OffscreenTarget)
        -> Result<(), RenderError>;
}

pub trait Encoder {
    /// File extension of the encoded images, without the dot
    fn extension(&self) -> &'static str;
    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, ImageError>;
}
