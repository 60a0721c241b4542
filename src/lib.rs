//! quadfit - keeps texture sizes divisible by four
//!
//! Block-compressed GPU formats work on 4x4 pixel blocks, so a texture whose
//! imported size is not a multiple of four gets padded or rejected. This
//! crate finds such assets, works out a source size that imports cleanly
//! (taking the importer's max-size clamp into account), and resizes the
//! files in place with nearest-neighbour sampling.

pub mod batch;
pub mod config;
pub mod error;
pub mod paths;
pub mod textures;
