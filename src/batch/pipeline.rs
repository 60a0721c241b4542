//! Scan-then-process batch pipeline
//!
//! Runs synchronously on the calling thread. Each asset is fully handled
//! (read, decode, resample, encode, write) before the next one starts, and
//! the progress callback fires after every item. Cancellation is only
//! observed between items.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::host::{AssetStore, ConstraintSource};
use crate::error::QuadResult;
use crate::paths;
use crate::textures::{
    analyze, analyze_verified, DecodedImage, ImageCodec, PlanCheck, ResampleStrategy, ResizePlan,
};

/// Where a pipeline is in its scan/process cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    Scanned,
    Processing,
    Done,
}

/// One asset that needs resizing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub path: PathBuf,
    pub plan: ResizePlan,
    /// Only selected items are processed
    pub selected: bool,
}

/// Outcome counts of a process run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// The run stopped early; counts cover only the items handled
    pub cancelled: bool,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}

/// Progress report sent after each item
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub name: &'a str,
    pub current: usize,
    pub total: usize,
}

/// Shared flag a caller can set to stop a run at the next item boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for [`BatchPipeline::process`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub strategy: ResampleStrategy,
    /// Do everything except write the result back
    pub dry_run: bool,
}

/// What happened to a single processed item
enum ItemOutcome {
    Resized,
    AlreadySized,
}

/// Scans assets for misaligned sizes and resizes the selected ones
///
/// Methods take `&mut self`, so a pipeline cannot run two batches at once.
pub struct BatchPipeline<C, S> {
    codec: C,
    store: S,
    state: PipelineState,
    cancel: CancelFlag,
    verify_plans: bool,
}

impl<C: ImageCodec, S: AssetStore> BatchPipeline<C, S> {
    pub fn new(codec: C, store: S) -> Self {
        Self {
            codec,
            store,
            state: PipelineState::Idle,
            cancel: CancelFlag::new(),
            verify_plans: false,
        }
    }

    /// Use a caller-owned cancel flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Re-check constrained plans and nudge source sizes that miss by a pixel
    pub fn with_plan_verification(mut self, enabled: bool) -> Self {
        self.verify_plans = enabled;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Analyze every asset and return the ones that need resizing
    ///
    /// Assets that cannot be read or decoded are logged and skipped. All
    /// returned items start out selected.
    pub fn scan<P, F>(
        &mut self,
        asset_paths: &[P],
        constraints: &dyn ConstraintSource,
        mut on_progress: F,
    ) -> Vec<BatchItem>
    where
        P: AsRef<Path>,
        F: FnMut(Progress<'_>),
    {
        self.state = PipelineState::Scanning;
        let total = asset_paths.len();
        let mut items = Vec::new();

        for (index, path) in asset_paths.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Scan cancelled after {} of {} assets", index, total);
                break;
            }

            let path = path.as_ref();
            match self.scan_one(path, constraints) {
                Ok(plan) if plan.needs_processing => {
                    debug!(
                        "{}: {} imported as {}, wants {}",
                        path.display(),
                        plan.source(),
                        plan.imported(),
                        plan.target()
                    );
                    items.push(BatchItem {
                        path: path.to_path_buf(),
                        plan,
                        selected: true,
                    });
                }
                Ok(_) => {}
                Err(e) => error!(kind = e.kind(), "Error reading texture {}: {}", path.display(), e),
            }

            on_progress(Progress {
                name: &paths::display_name(path),
                current: index + 1,
                total,
            });
        }

        info!("Scan complete: {} of {} assets need resizing", items.len(), total);
        self.state = PipelineState::Scanned;
        items
    }

    fn scan_one(&self, path: &Path, constraints: &dyn ConstraintSource) -> QuadResult<ResizePlan> {
        let bytes = self.store.read(path)?;
        let dims = self.codec.dimensions(&bytes, &paths::extension_of(path))?;
        let constraint = constraints.constraint_for(path);

        if !self.verify_plans {
            return Ok(analyze(dims, constraint));
        }

        let (plan, check) = analyze_verified(dims, constraint);
        match check {
            PlanCheck::Corrected => debug!(
                "{}: adjusted source target to {} so the import lands on {}",
                path.display(),
                plan.target(),
                plan.new_imported()
            ),
            PlanCheck::Unverified => warn!(
                "{}: {} may not import as {}",
                path.display(),
                plan.target(),
                plan.new_imported()
            ),
            PlanCheck::Exact | PlanCheck::NotApplicable => {}
        }
        Ok(plan)
    }

    /// Resize every selected item, in order
    ///
    /// A failure on one item is logged and counted, and processing moves on.
    /// Files written for earlier items stay written.
    pub fn process<F>(
        &mut self,
        items: &[BatchItem],
        options: &ProcessOptions,
        mut on_progress: F,
    ) -> BatchResult
    where
        F: FnMut(Progress<'_>),
    {
        self.state = PipelineState::Processing;
        let eligible: Vec<&BatchItem> = items.iter().filter(|item| item.selected).collect();
        let total = eligible.len();
        let mut result = BatchResult::default();

        for (index, item) in eligible.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Processing cancelled after {} of {} assets", index, total);
                result.cancelled = true;
                break;
            }

            result.total += 1;
            match self.process_one(item, options) {
                Ok(ItemOutcome::Resized) => result.succeeded += 1,
                Ok(ItemOutcome::AlreadySized) => {
                    info!(
                        "No resize needed for '{}' - already at target size {}",
                        item.path.display(),
                        item.plan.target()
                    );
                    result.succeeded += 1;
                }
                Err(e) => {
                    error!(kind = e.kind(), "Failed to process {}: {}", item.path.display(), e);
                    result.failed += 1;
                }
            }

            on_progress(Progress {
                name: &paths::display_name(&item.path),
                current: index + 1,
                total,
            });
        }

        info!(
            "Processing complete: {}/{} succeeded, {} failed",
            result.succeeded, result.total, result.failed
        );
        self.state = PipelineState::Done;
        result
    }

    fn process_one(&self, item: &BatchItem, options: &ProcessOptions) -> QuadResult<ItemOutcome> {
        let path = item.path.as_path();
        let extension = paths::extension_of(path);
        let target = item.plan.target();

        let decoded = {
            let bytes = self.store.read(path)?;
            self.codec.decode(&bytes, &extension)?
        };

        let current = decoded.dimensions();
        if current == target {
            return Ok(ItemOutcome::AlreadySized);
        }

        let DecodedImage {
            pixels,
            has_mipmaps,
        } = decoded;
        let pixels = pixels.resized(target, options.strategy)?;
        let encoded = self.codec.encode(
            DecodedImage {
                pixels,
                has_mipmaps,
            },
            &extension,
        )?;

        if options.dry_run {
            info!(
                "Would resize '{}' from {} to {} ({} bytes)",
                path.display(),
                current,
                target,
                encoded.len()
            );
        } else {
            self.store.write(path, &encoded)?;
            info!("Resized: '{}' from {} to {}", path.display(), current, target);
        }

        Ok(ItemOutcome::Resized)
    }
}
