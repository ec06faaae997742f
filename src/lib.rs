pub mod args;
pub mod capture;
pub mod driver;
pub mod formats;
pub mod ply;
pub mod render;
pub mod utils;

pub use formats::PointCloudFrame;
