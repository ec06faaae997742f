//! Multi-ring capture: planning camera poses around a target and rendering an image per pose.

pub mod orchestrator;
pub mod planner;

use std::str::FromStr;

use cgmath::Point3;

use crate::formats::{Bounds, PointCloudFrame};

pub use orchestrator::{
    CaptureError, CaptureJob, CaptureOrchestrator, CaptureRecord, CaptureSettings, CaptureShot,
    CooperativeCapture,
};
pub use planner::{plan, PlanError, PlannedShot, RingConfig};

/// The point every ring is centred on and every camera looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Fixed(Point3<f32>),
    /// Centre of the bounds of the frame being captured, after scaling
    Center,
}

impl Default for Target {
    fn default() -> Self {
        Target::Fixed(Point3::new(0.0, 0.0, 0.0))
    }
}

impl Target {
    /// An empty frame has no bounds and resolves to the origin.
    pub fn resolve(&self, frame: &PointCloudFrame, scale: f32) -> Point3<f32> {
        match self {
            Target::Fixed(point) => *point,
            Target::Center => Bounds::of(frame)
                .map(|bounds| bounds.scaled(scale).center())
                .unwrap_or_else(|| Point3::new(0.0, 0.0, 0.0)),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("center") {
            return Ok(Target::Center);
        }
        let coords = s
            .split(',')
            .map(|c| c.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("Invalid target {s:?}: {e}"))?;
        match coords[..] {
            [x, y, z] => Ok(Target::Fixed(Point3::new(x, y, z))),
            _ => Err(format!("Invalid target {s:?}, expected x,y,z or center")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_target() {
        assert_eq!("center".parse::<Target>(), Ok(Target::Center));
        assert_eq!(
            "1, -2.5,3".parse::<Target>(),
            Ok(Target::Fixed(Point3::new(1.0, -2.5, 3.0)))
        );
        assert!("1,2".parse::<Target>().is_err());
        assert!("a,b,c".parse::<Target>().is_err());
    }

    #[test]
    fn center_target_follows_scaled_bounds() {
        let frame = PointCloudFrame::new(
            vec![[0.0, 0.0, 0.0], [4.0, 2.0, -2.0]],
            vec![[0, 0, 0, 255]; 2],
        );
        assert_eq!(Target::Center.resolve(&frame, 0.5), Point3::new(1.0, 0.5, -0.5));
        assert_eq!(
            Target::Center.resolve(&PointCloudFrame::default(), 2.0),
            Point3::new(0.0, 0.0, 0.0)
        );
        let fixed = Target::Fixed(Point3::new(7.0, 8.0, 9.0));
        assert_eq!(fixed.resolve(&frame, 0.5), Point3::new(7.0, 8.0, 9.0));
    }
}
