//! Channel data: scan-file backed sources and synthetic samples.

pub mod sample;
pub mod source;

pub use sample::*;
pub use source::*;
