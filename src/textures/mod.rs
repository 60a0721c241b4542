//! Quad-alignment resize engine
//!
//! Size math, asset classification and nearest-neighbour resampling. The
//! codec module is the only part that knows about file formats.

pub mod analyzer;
pub mod codec;
pub mod dimensions;
pub mod resample;

pub use analyzer::{
    analyze, analyze_verified, ImageDimensions, ImportConstraint, PlanCheck, ResizePlan,
};
pub use codec::{ColorFormat, DecodedImage, ImageCodec, ImageCrateCodec, OutputFormat, Pixels};
pub use dimensions::{
    clamp_to_bound, is_quad_aligned, quantize_up4, required_source_for_target_imported,
};
pub use resample::{
    resize, resize_chunked, Band, PixelBuffer, ResampleStrategy, DEFAULT_CHUNK_ROWS,
};
