use image::codecs::png::PngEncoder as ImagePngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbImage};

use super::Encoder;

/// Encodes captures as 8 bit RGB PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngEncoder;

impl Encoder for PngEncoder {
    fn extension(&self) -> &'static str {
        "png"
    }

    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, ImageError> {
        let mut bytes = Vec::new();
        ImagePngEncoder::new(&mut bytes).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}
