use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use thiserror::Error;

use super::RECORD_SIZE;
use crate::formats::PointCloudFrame;

type Result<T> = std::result::Result<T, PlyReadError>;

const VERTEX_ELEMENT: &str = "element vertex";
const HEADER_TERMINATORS: [&str; 2] = ["end_header", "end header"];
/// Upper bound on the points reserved before any record is read. The header count is not
/// trusted, buffers grow past this as records arrive.
const MAX_RESERVED_POINTS: usize = 1 << 20;

/// Reads a [PointCloudFrame] directly from a file given the path
pub fn read_ply_file<P: AsRef<Path>>(p: P) -> Result<PointCloudFrame> {
    let path = p.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PlyReadError::NotFound(path.to_path_buf()),
        _ => PlyReadError::IOError(e),
    })?;
    let frame = Parser::new(BufReader::new(file)).parse()?;
    debug!(
        "Decoded {} points from {}",
        frame.number_of_points,
        path.display()
    );
    Ok(frame)
}

/// Parses a [PointCloudFrame] from the reader
/// ```no_run
/// use vvcapture::ply::{read_ply, PlyReadError};
///
/// fn main() -> Result<(), PlyReadError> {
///     let frame = read_ply("ply\nelement vertex 0\nend_header\n".as_bytes())?;
///     assert!(frame.is_empty());
///     Ok(())
/// }
/// ```
pub fn read_ply<R: Read>(r: R) -> Result<PointCloudFrame> {
    Parser::new(r).parse()
}

/// Parses a [PointCloudFrame] from an in-memory buffer
pub fn read_ply_bytes(bytes: &[u8]) -> Result<PointCloudFrame> {
    Parser::new(bytes).parse()
}

/// Represents possible error scenarios when decoding a binary point cloud frame.
#[derive(Error, Debug)]
pub enum PlyReadError {
    #[error("Point cloud file not found: {0:?}")]
    NotFound(PathBuf),
    /// For ease of conversion from IO errors to PlyReadError.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The input ended before a line containing `end_header` was found.
    #[error("Input ended before the end of the header")]
    MissingEndHeader,
    /// Represents an error with a header line.
    #[error("Invalid header: {error_msg}\n\t{actual_line:?}")]
    InvalidHeader {
        /// A custom error messaging describing the error
        error_msg: String,
        /// The line which caused the error
        actual_line: String,
    },
    /// The body holds fewer records than the header announced.
    #[error("Expected {expected} points, input ended after {decoded}")]
    Truncated { expected: usize, decoded: usize },
}

struct Parser<R: Read> {
    reader: R,
    line: Vec<u8>,
}

impl<R: Read> Parser<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<PointCloudFrame> {
        let number_of_points = self.parse_header()?;
        self.parse_body(number_of_points)
    }

    /// Scans header lines until the terminator, returning the vertex count.
    fn parse_header(&mut self) -> Result<usize> {
        let mut number_of_points = 0;
        loop {
            if !self.next_line()? {
                return Err(PlyReadError::MissingEndHeader);
            }
            let line = String::from_utf8_lossy(&self.line).into_owned();
            if line.contains(VERTEX_ELEMENT) {
                number_of_points = parse_vertex_count(&line)?;
            }
            if HEADER_TERMINATORS.iter().any(|t| line.contains(t)) {
                return Ok(number_of_points);
            }
        }
    }

    fn parse_body(mut self, number_of_points: usize) -> Result<PointCloudFrame> {
        let mut frame = PointCloudFrame::with_capacity(number_of_points.min(MAX_RESERVED_POINTS));
        let mut record = [0u8; RECORD_SIZE];
        for decoded in 0..number_of_points {
            self.reader.read_exact(&mut record).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => PlyReadError::Truncated {
                    expected: number_of_points,
                    decoded,
                },
                _ => PlyReadError::IOError(e),
            })?;
            let x = LittleEndian::read_i16(&record[0..2]);
            let y = LittleEndian::read_i16(&record[2..4]);
            let z = LittleEndian::read_i16(&record[4..6]);
            // widen before negating, -i16::MIN does not fit in an i16
            frame.push(
                [-(x as f32), y as f32, z as f32],
                [record[6], record[7], record[8], 255],
            );
        }
        Ok(frame)
    }

    /// Reads the next `\n` terminated line one byte at a time, so that no body bytes are
    /// consumed past the header. Returns `false` once the input is exhausted, including
    /// partway through a line.
    fn next_line(&mut self) -> Result<bool> {
        self.line.clear();
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(false),
                Ok(_) if byte[0] == b'\n' => return Ok(true),
                Ok(_) => self.line.push(byte[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PlyReadError::IOError(e)),
            }
        }
    }
}

fn parse_vertex_count(line: &str) -> Result<usize> {
    let header_err = |error_msg: String| PlyReadError::InvalidHeader {
        error_msg,
        actual_line: line.to_string(),
    };
    line.split_whitespace()
        .nth(2)
        .ok_or_else(|| header_err("Expected a vertex count".to_string()))?
        .parse::<usize>()
        .map_err(|e| header_err(e.to_string()))
}
