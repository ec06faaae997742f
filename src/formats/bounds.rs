use cgmath::Point3;
use serde::{Deserialize, Serialize};

use super::PointCloudFrame;

/// Axis aligned bounding box of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Bounds {
    fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        }
    }

    /// Returns `None` for an empty frame.
    pub fn of(frame: &PointCloudFrame) -> Option<Self> {
        let mut positions = frame.positions.iter();
        let first = positions.next()?;
        let init = Bounds::new(first[0], first[0], first[1], first[1], first[2], first[2]);
        Some(positions.fold(init, |mut b, p| {
            b.min_x = b.min_x.min(p[0]);
            b.max_x = b.max_x.max(p[0]);
            b.min_y = b.min_y.min(p[1]);
            b.max_y = b.max_y.max(p[1]);
            b.min_z = b.min_z.min(p[2]);
            b.max_z = b.max_z.max(p[2]);
            b
        }))
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min_x + self.max_x) / 2f32,
            (self.min_y + self.max_y) / 2f32,
            (self.min_z + self.max_z) / 2f32,
        )
    }

    pub fn scaled(&self, factor: f32) -> Self {
        // a negative factor flips min and max
        let (min_x, max_x) = minmax(self.min_x * factor, self.max_x * factor);
        let (min_y, max_y) = minmax(self.min_y * factor, self.max_y * factor);
        let (min_z, max_z) = minmax(self.min_z * factor, self.max_z * factor);
        Bounds::new(min_x, max_x, min_y, max_y, min_z, max_z)
    }

}

fn minmax(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
