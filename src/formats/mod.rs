use std::fmt::Debug;

pub mod bounds;

pub use bounds::Bounds;

/// A decoded point cloud frame, stored as two parallel attribute buffers.
///
/// Positions are the stored 16-bit coordinates widened to `f32` (x already negated).
/// Colors are RGBA with the alpha channel always fully opaque.
#[derive(Clone, Default, PartialEq)]
pub struct PointCloudFrame {
    pub number_of_points: usize,
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[u8; 4]>,
}

impl PointCloudFrame {
    pub fn new(positions: Vec<[f32; 3]>, colors: Vec<[u8; 4]>) -> Self {
        assert_eq!(
            positions.len(),
            colors.len(),
            "position and color buffers must have the same length"
        );
        Self {
            number_of_points: positions.len(),
            positions,
            colors,
        }
    }

    pub fn with_capacity(number_of_points: usize) -> Self {
        Self {
            number_of_points: 0,
            positions: Vec::with_capacity(number_of_points),
            colors: Vec::with_capacity(number_of_points),
        }
    }

    pub fn push(&mut self, position: [f32; 3], color: [u8; 4]) {
        self.positions.push(position);
        self.colors.push(color);
        self.number_of_points += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_points == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f32; 3], &[u8; 4])> {
        self.positions.iter().zip(self.colors.iter())
    }
}

impl Debug for PointCloudFrame {
    // first print the number of points in one line
    // then each point on its own line
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PointCloudFrame {{")?;
        writeln!(f, "   number_of_points: {}", self.number_of_points)?;
        for (position, color) in self.iter() {
            writeln!(f, "   {:?} {:?}", position, color)?;
        }
        writeln!(f, "}}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_buffers_in_step() {
        let mut frame = PointCloudFrame::with_capacity(2);
        assert!(frame.is_empty());
        frame.push([1.0, 2.0, 3.0], [10, 20, 30, 255]);
        frame.push([-1.0, 0.0, 5.0], [0, 0, 0, 255]);
        assert_eq!(frame.number_of_points, 2);
        assert_eq!(frame.positions.len(), frame.colors.len());
        assert_eq!(frame.iter().nth(1), Some((&[-1.0, 0.0, 5.0], &[0, 0, 0, 255])));
    }

    #[test]
    #[should_panic]
    fn new_rejects_mismatched_buffers() {
        PointCloudFrame::new(vec![[0.0; 3]], vec![]);
    }
}
