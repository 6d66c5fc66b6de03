pub mod assembler;
pub mod audio;
pub mod bin_common;
pub mod detector;
pub mod frame_extractor;
pub mod normalize;
pub mod pipeline;
pub mod similarity;

/// For stand-alone functionality that fit comfortably within one file.
pub mod utils;
