//! Batch scan/process over a collection of assets
//!
//! Discovery finds candidate files, the pipeline scans them into
//! [`BatchItem`]s and then processes the selected ones one at a time.
//! Per-item failures are logged and counted, never propagated.

mod discover;
mod host;
mod pipeline;

pub use discover::{discover_assets, DiscoverOptions};
pub use host::{AssetStore, ConstraintSource, FsStore};
pub use pipeline::{
    BatchItem, BatchPipeline, BatchResult, CancelFlag, PipelineState, ProcessOptions, Progress,
};
