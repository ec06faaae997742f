use std::str::FromStr;

use cgmath::{InnerSpace, Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::camera::CameraPose;

type Result<T> = std::result::Result<T, PlanError>;

#[derive(Error, Debug, PartialEq)]
pub enum PlanError {
    #[error("Invalid ring {ring:?}: {reason}")]
    InvalidRing { ring: String, reason: String },
    /// The camera sits on the vertical line through the target, so there is no horizontal
    /// direction to look along.
    #[error("Camera {index} of ring {ring:?} has no defined look direction (zero radius?)")]
    DegeneratePose { ring: String, index: u32 },
}

/// One circle of cameras around the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Used in output file names
    pub name: String,
    pub camera_count: u32,
    pub radius: f32,
    /// Vertical offset above the target
    pub height: f32,
    /// Degrees, within [-90, 90]. Positive tilts the camera up.
    pub pitch_angle: f32,
    /// Degrees added to every camera's yaw in this ring
    pub horizontal_offset: f32,
    pub enabled: bool,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            name: "Ring".to_string(),
            camera_count: 8,
            radius: 5.0,
            height: 5.0,
            pitch_angle: 0.0,
            horizontal_offset: 0.0,
            enabled: true,
        }
    }
}

impl RingConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| PlanError::InvalidRing {
            ring: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.camera_count == 0 {
            return Err(invalid("camera count must be positive"));
        }
        if !(-90.0..=90.0).contains(&self.pitch_angle) {
            return Err(invalid("pitch angle must be within [-90, 90] degrees"));
        }
        if !self.radius.is_finite()
            || !self.height.is_finite()
            || !self.horizontal_offset.is_finite()
        {
            return Err(invalid("radius, height and offset must be finite"));
        }
        Ok(())
    }

    /// Yaw of camera `index` in degrees
    pub fn yaw_degrees(&self, index: u32) -> f32 {
        (360.0 / self.camera_count as f32) * index as f32 + self.horizontal_offset
    }

    /// Pose of a camera on this ring at the given yaw, looking towards `target`.
    ///
    /// The horizontal bearing towards the target gets `sin(pitch)` as its y component and is
    /// normalized once more. The horizontal part is not rescaled by `cos(pitch)`, so under a
    /// steep pitch this is not an exact look-at. Existing datasets depend on this construction.
    pub fn pose_at(&self, target: Point3<f32>, yaw_degrees: f32) -> Option<CameraPose> {
        let (sin_yaw, cos_yaw) = yaw_degrees.to_radians().sin_cos();
        let position = Point3::new(
            target.x + self.radius * cos_yaw,
            target.y + self.height,
            target.z + self.radius * sin_yaw,
        );

        let to_target = target - position;
        if to_target.magnitude2() == 0.0 {
            return None;
        }
        let direction = to_target.normalize();
        let horizontal = Vector3::new(direction.x, 0.0, direction.z);
        if horizontal.magnitude2() == 0.0 {
            return None;
        }
        let horizontal = horizontal.normalize();

        let forward = Vector3::new(
            horizontal.x,
            self.pitch_angle.to_radians().sin(),
            horizontal.z,
        )
        .normalize();
        Some(CameraPose::new(position, forward))
    }
}

/// Parses `name:count:radius:height:pitch:offset`, optionally followed by `:off` to disable the
/// ring.
impl FromStr for RingConfig {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 && parts.len() != 7 {
            return Err(format!(
                "Invalid ring {s:?}, expected name:count:radius:height:pitch:offset[:off]"
            ));
        }
        let float = |i: usize, what: &str| {
            parts[i]
                .trim()
                .parse::<f32>()
                .map_err(|e| format!("Invalid {what} {:?} in ring {s:?}: {e}", parts[i]))
        };
        let enabled = match parts.get(6).map(|p| p.trim()) {
            None | Some("on") => true,
            Some("off") => false,
            Some(other) => return Err(format!("Invalid ring state {other:?}, expected on or off")),
        };
        let ring = RingConfig {
            name: parts[0].trim().to_string(),
            camera_count: parts[1]
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("Invalid camera count {:?} in ring {s:?}: {e}", parts[1]))?,
            radius: float(2, "radius")?,
            height: float(3, "height")?,
            pitch_angle: float(4, "pitch")?,
            horizontal_offset: float(5, "offset")?,
            enabled,
        };
        if ring.name.is_empty() {
            return Err(format!("Ring {s:?} has an empty name"));
        }
        Ok(ring)
    }
}

/// A single camera placement of a capture pass
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedShot {
    pub ring: String,
    pub index: u32,
    pub yaw_degrees: f32,
    pub pose: CameraPose,
}

/// Plans every camera pose of a capture pass around `target`.
///
/// Disabled rings contribute nothing. Enabled rings are visited in the given order, and each
/// ring's cameras in ascending index order.
pub fn plan(rings: &[RingConfig], target: Point3<f32>) -> Result<Vec<PlannedShot>> {
    let mut shots = vec![];
    for ring in rings.iter().filter(|ring| ring.enabled) {
        ring.validate()?;
        for index in 0..ring.camera_count {
            let yaw_degrees = ring.yaw_degrees(index);
            let pose = ring
                .pose_at(target, yaw_degrees)
                .ok_or_else(|| PlanError::DegeneratePose {
                    ring: ring.name.clone(),
                    index,
                })?;
            shots.push(PlannedShot {
                ring: ring.name.clone(),
                index,
                yaw_degrees,
                pose,
            });
        }
    }
    Ok(shots)
}
