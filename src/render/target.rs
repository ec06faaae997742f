use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Fixed size render target the capture camera draws into.
///
/// Holds a color attachment and a depth attachment with depth in `[0, 1]`, `1.0` being the far
/// plane.
pub struct OffscreenTarget {
    color: RgbaImage,
    depth: Vec<f32>,
}

impl OffscreenTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: RgbaImage::new(width, height),
            depth: vec![1.0; pixel_count(width, height)],
        }
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Clears color to `background` and depth to the far plane
    pub fn clear(&mut self, background: [u8; 3]) {
        let [r, g, b] = background;
        for pixel in self.color.pixels_mut() {
            *pixel = Rgba([r, g, b, 255]);
        }
        self.depth.fill(1.0);
    }

    /// Writes `color` at `(x, y)` if `depth` is closer than what is already there.
    pub fn plot(&mut self, x: u32, y: u32, depth: f32, color: [u8; 4]) {
        if x >= self.width() || y >= self.height() {
            return;
        }
        let index = y as usize * self.width() as usize + x as usize;
        if depth < self.depth[index] {
            self.depth[index] = depth;
            self.color.put_pixel(x, y, Rgba(color));
        }
    }

    /// Copies the color attachment out as an RGB image
    pub fn read_back(&self) -> RgbImage {
        RgbImage::from_fn(self.width(), self.height(), |x, y| {
            let Rgba([r, g, b, _]) = *self.color.get_pixel(x, y);
            Rgb([r, g, b])
        })
    }
}

/// Widened before multiplying so large targets do not wrap in `u32`.
fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
