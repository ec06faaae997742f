use cgmath::*;
use serde::{Deserialize, Serialize};

const DEFAULT_FOVY: f32 = 60.0;
const DEFAULT_ZNEAR: f32 = 0.1;
const DEFAULT_ZFAR: f32 = 100.0;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

#[derive(Debug, Copy, Clone, PartialEq)]
/// Where a capture camera sits and which way it looks
pub struct CameraPose {
    pub position: Point3<f32>,
    /// Unit viewing direction
    pub forward: Vector3<f32>,
}

impl CameraPose {
    pub fn new(position: Point3<f32>, forward: Vector3<f32>) -> Self {
        Self { position, forward }
    }

    /// Left handed view matrix with world +y as up: screen right is `up × forward`.
    ///
    /// Decoded frames have x negated into a left handed world, so a right handed view would
    /// mirror every capture.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0)
            * Matrix4::look_to_rh(self.position, self.forward, Vector3::unit_y())
    }
}

/// Lens settings shared by every capture camera.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fovy: DEFAULT_FOVY,
            znear: DEFAULT_ZNEAR,
            zfar: DEFAULT_ZFAR,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_lens(width: u32, height: u32, lens: &Lens) -> Self {
        Self::new(width, height, Deg(lens.fovy), lens.znear, lens.zfar)
    }

    /// Get projection matrix, depth mapped to `[0, 1]`
    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}
