pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Download, Folders, Search, Upload};
