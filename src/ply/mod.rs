//! Binary point cloud frames (.ply)
//!
//! Each frame is a newline separated text header followed by fixed size little endian records.
//! Only two things in the header matter: the `element vertex <count>` line (the last one wins)
//! and the terminating line, which contains `end_header` or `end header`.
//!
//! Every record is 9 bytes long: `i16 x, i16 y, i16 z, u8 r, u8 g, u8 b`. x is negated on read.
//!
//! # Examples
//!
//! ## Reading from a file
//! ```no_run
//! use vvcapture::ply::{read_ply_file, PlyReadError};
//!
//! fn main() -> Result<(), PlyReadError> {
//!     let frame = read_ply_file("longdress_vox10_1051.ply")?;
//!     println!("{}", frame.number_of_points);
//!     Ok(())
//! }
//! ```
//!
//! ## Writing a frame back out
//! ```no_run
//! use vvcapture::ply::{read_ply_file, write_ply_file, PlyReadError};
//!
//! fn main() -> Result<(), PlyReadError> {
//!     let frame = read_ply_file("longdress_vox10_1051.ply")?;
//!     write_ply_file(&frame, "copy.ply")?;
//!     Ok(())
//! }
//! ```

mod reader;
mod writer;

pub use reader::{read_ply, read_ply_bytes, read_ply_file, PlyReadError};
pub use writer::{write_ply, write_ply_file};

/// Size in bytes of one point record.
pub const RECORD_SIZE: usize = 9;
