use cgmath::{Matrix4, Vector4};
use log::trace;

use super::camera::{CameraPose, Lens, Projection};
use super::target::OffscreenTarget;
use super::{RenderBackend, RenderError, Scene};
use crate::formats::PointCloudFrame;

/// Renders points as depth tested square splats on the CPU.
///
/// Vertex data is copied in by [Scene::replace_points], scaled by `scale` on the way in, the
/// same way a GPU renderer uploads into its vertex buffer.
pub struct SoftwareRenderer {
    positions: Vec<[f32; 3]>,
    colors: Vec<[u8; 4]>,
    lens: Lens,
    scale: f32,
    point_size: u32,
    bg_color: [u8; 3],
}

impl SoftwareRenderer {
    pub fn new(lens: Lens) -> Self {
        Self {
            positions: vec![],
            colors: vec![],
            lens,
            scale: 1.0,
            point_size: 1,
            bg_color: [0, 0, 0],
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Side length of each splat in pixels, at least 1
    pub fn with_point_size(mut self, point_size: u32) -> Self {
        self.point_size = point_size.max(1);
        self
    }

    pub fn with_background_color(mut self, color: [u8; 3]) -> Self {
        self.bg_color = color;
        self
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    fn splat(&self, target: &mut OffscreenTarget, view_proj: Matrix4<f32>, index: usize) {
        let [x, y, z] = self.positions[index];
        let clip = view_proj * Vector4::new(x, y, z, 1.0);
        if clip.w <= 0.0 {
            return;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) || ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return;
        }

        let (width, height) = (target.width() as f32, target.height() as f32);
        let px = ((ndc.x + 1.0) * 0.5 * width).floor() as i64;
        let py = ((1.0 - ndc.y) * 0.5 * height).floor() as i64;
        let half = (self.point_size / 2) as i64;
        for dy in 0..self.point_size as i64 {
            for dx in 0..self.point_size as i64 {
                let (sx, sy) = (px - half + dx, py - half + dy);
                if sx >= 0 && sy >= 0 {
                    target.plot(sx as u32, sy as u32, ndc.z, self.colors[index]);
                }
            }
        }
    }
}

impl Scene for SoftwareRenderer {
    fn replace_points(&mut self, frame: &PointCloudFrame) {
        // reuse the existing allocation when the new frame fits
        self.positions.clear();
        self.colors.clear();
        let scale = self.scale;
        self.positions.extend(
            frame
                .positions
                .iter()
                .map(|p| [p[0] * scale, p[1] * scale, p[2] * scale]),
        );
        self.colors.extend_from_slice(&frame.colors);
    }
}

impl RenderBackend for SoftwareRenderer {
    fn render(
        &mut self,
        pose: &CameraPose,
        target: &mut OffscreenTarget,
    ) -> Result<(), RenderError> {
        if target.width() == 0 || target.height() == 0 {
            return Err(RenderError::Backend(
                "render target has a zero dimension".to_string(),
            ));
        }
        let projection = Projection::from_lens(target.width(), target.height(), &self.lens);
        let view_proj = projection.matrix() * pose.calc_matrix();

        target.clear(self.bg_color);
        for index in 0..self.positions.len() {
            self.splat(target, view_proj, index);
        }
        trace!("Rendered {} points", self.positions.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Vector3};
    use image::Rgb;

    fn pose() -> CameraPose {
        CameraPose::new(Point3::new(5.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0))
    }

    #[test]
    fn point_in_front_lands_in_the_middle() {
        let frame = PointCloudFrame::new(vec![[0.0, 0.0, 0.0]], vec![[255, 0, 0, 255]]);
        let mut renderer = SoftwareRenderer::new(Lens::default())
            .with_point_size(3)
            .with_background_color([0, 0, 255]);
        renderer.replace_points(&frame);

        let mut target = OffscreenTarget::new(32, 32);
        renderer.render(&pose(), &mut target).unwrap();
        let image = target.read_back();
        assert_eq!(image.get_pixel(16, 16), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn positive_z_lands_right_of_center() {
        let frame = PointCloudFrame::new(vec![[0.0, 0.0, 1.0]], vec![[255, 0, 0, 255]]);
        let mut renderer = SoftwareRenderer::new(Lens::default());
        renderer.replace_points(&frame);
        let mut target = OffscreenTarget::new(64, 64);
        renderer.render(&pose(), &mut target).unwrap();

        let image = target.read_back();
        let (column, _, _) = image
            .enumerate_pixels()
            .find(|(_, _, p)| **p == Rgb([255, 0, 0]))
            .unwrap();
        assert!(column > 32, "column {column} is not right of center");
    }

    #[test]
    fn nearer_point_wins() {
        let frame = PointCloudFrame::new(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![[255, 0, 0, 255], [0, 255, 0, 255]],
        );
        let mut renderer = SoftwareRenderer::new(Lens::default());
        renderer.replace_points(&frame);
        let mut target = OffscreenTarget::new(16, 16);
        renderer.render(&pose(), &mut target).unwrap();
        assert_eq!(target.read_back().get_pixel(8, 8), &Rgb([0, 255, 0]));
    }

    #[test]
    fn points_behind_camera_are_culled() {
        let frame = PointCloudFrame::new(vec![[10.0, 0.0, 0.0]], vec![[255, 255, 255, 255]]);
        let mut renderer = SoftwareRenderer::new(Lens::default()).with_point_size(64);
        renderer.replace_points(&frame);
        let mut target = OffscreenTarget::new(16, 16);
        renderer.render(&pose(), &mut target).unwrap();
        assert!(target.read_back().pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn replace_points_applies_scale_and_drops_old_points() {
        let mut renderer = SoftwareRenderer::new(Lens::default()).with_scale(0.5);
        renderer.replace_points(&PointCloudFrame::new(
            vec![[2.0, 4.0, -6.0], [0.0; 3]],
            vec![[0; 4]; 2],
        ));
        assert_eq!(renderer.num_vertices(), 2);
        renderer.replace_points(&PointCloudFrame::new(vec![[2.0, 4.0, -6.0]], vec![[0; 4]]));
        assert_eq!(renderer.num_vertices(), 1);
        assert_eq!(renderer.positions[0], [1.0, 2.0, -3.0]);
    }
}
