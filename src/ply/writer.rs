use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::formats::PointCloudFrame;

type IOResult = Result<(), std::io::Error>;

/// Writes the frame into the file
pub fn write_ply_file<P: AsRef<Path>>(frame: &PointCloudFrame, p: P) -> IOResult {
    let file = File::create(p)?;
    let mut writer = BufWriter::new(file);
    Writer::new(frame, &mut writer).write()?;
    writer.flush()
}

/// Writes the frame into the provided writer
pub fn write_ply<W: Write>(frame: &PointCloudFrame, writer: &mut W) -> IOResult {
    Writer::new(frame, writer).write()
}

struct Writer<'a, W: Write> {
    writer: W,
    frame: &'a PointCloudFrame,
}

impl<'a, W: Write> Writer<'a, W> {
    fn new(frame: &'a PointCloudFrame, writer: W) -> Self {
        Self { frame, writer }
    }

    fn write(mut self) -> IOResult {
        self.write_header()?;
        self.write_data()
    }

    fn write_header(&mut self) -> IOResult {
        writeln!(self.writer, "ply")?;
        writeln!(self.writer, "format binary_little_endian 1.0")?;
        writeln!(self.writer, "element vertex {}", self.frame.number_of_points)?;
        for axis in ["x", "y", "z"] {
            writeln!(self.writer, "property short {axis}")?;
        }
        for channel in ["red", "green", "blue"] {
            writeln!(self.writer, "property uchar {channel}")?;
        }
        writeln!(self.writer, "end_header")
    }

    fn write_data(&mut self) -> IOResult {
        for (position, color) in self.frame.iter() {
            // x is stored negated, mirroring the reader
            self.writer
                .write_i16::<LittleEndian>((-position[0]).round() as i16)?;
            self.writer.write_i16::<LittleEndian>(position[1].round() as i16)?;
            self.writer.write_i16::<LittleEndian>(position[2].round() as i16)?;
            self.writer.write_all(&color[..3])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::RECORD_SIZE;

    #[test]
    fn header_then_packed_records() {
        let frame = PointCloudFrame::new(
            vec![[1.0, 2.0, 3.0], [-4.0, 5.0, -6.0]],
            vec![[7, 8, 9, 255], [10, 11, 12, 128]],
        );
        let mut bytes = vec![];
        write_ply(&frame, &mut bytes).unwrap();

        let header = "ply\n\
            format binary_little_endian 1.0\n\
            element vertex 2\n\
            property short x\n\
            property short y\n\
            property short z\n\
            property uchar red\n\
            property uchar green\n\
            property uchar blue\n\
            end_header\n";
        assert!(bytes.starts_with(header.as_bytes()));

        let body = &bytes[header.len()..];
        assert_eq!(body.len(), 2 * RECORD_SIZE);
        assert_eq!(&body[..RECORD_SIZE], &[0xff, 0xff, 2, 0, 3, 0, 7, 8, 9]);
        assert_eq!(&body[RECORD_SIZE..], &[4, 0, 5, 0, 0xfa, 0xff, 10, 11, 12]);
    }
}
