//! Decides whether an image needs resizing and to what size

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dimensions::{
    clamp_to_bound, is_quad_aligned, quantize_up4, required_source_for_target_imported,
    verify_required_source, SourceFit,
};

/// Pixel dimensions of a decoded image (both non-zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "image dimensions must be non-zero");
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl std::fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Max-size clamp an importer applies to the longer axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConstraint {
    pub max_size: u32,
}

impl ImportConstraint {
    pub fn new(max_size: u32) -> Self {
        assert!(max_size > 0, "max size must be non-zero");
        Self { max_size }
    }
}

/// Current and target sizes for one asset
///
/// "Imported" is what the importer produces today; "new imported" is the
/// quad-aligned size we want it to produce, and "new source" is the file
/// size that should get it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizePlan {
    pub source_width: u32,
    pub source_height: u32,
    pub imported_width: u32,
    pub imported_height: u32,
    pub new_imported_width: u32,
    pub new_imported_height: u32,
    pub new_source_width: u32,
    pub new_source_height: u32,
    pub needs_processing: bool,
}

impl ResizePlan {
    pub fn source(&self) -> ImageDimensions {
        ImageDimensions::new(self.source_width, self.source_height)
    }

    pub fn imported(&self) -> ImageDimensions {
        ImageDimensions::new(self.imported_width, self.imported_height)
    }

    pub fn new_imported(&self) -> ImageDimensions {
        ImageDimensions::new(self.new_imported_width, self.new_imported_height)
    }

    /// Size the file itself has to be resized to
    pub fn target(&self) -> ImageDimensions {
        ImageDimensions::new(self.new_source_width, self.new_source_height)
    }
}

/// Classify an image and compute its target size
pub fn analyze(dims: ImageDimensions, constraint: Option<ImportConstraint>) -> ResizePlan {
    let source = dims.as_tuple();
    let imported = match constraint {
        Some(c) => clamp_to_bound(source.0, source.1, c.max_size),
        None => source,
    };

    if is_quad_aligned(imported.0, imported.1) {
        return ResizePlan {
            source_width: source.0,
            source_height: source.1,
            imported_width: imported.0,
            imported_height: imported.1,
            new_imported_width: imported.0,
            new_imported_height: imported.1,
            new_source_width: source.0,
            new_source_height: source.1,
            needs_processing: false,
        };
    }

    let new_imported = (quantize_up4(imported.0), quantize_up4(imported.1));
    let new_source = match constraint {
        Some(_) => required_source_for_target_imported(source, imported, new_imported),
        None => new_imported,
    };

    ResizePlan {
        source_width: source.0,
        source_height: source.1,
        imported_width: imported.0,
        imported_height: imported.1,
        new_imported_width: new_imported.0,
        new_imported_height: new_imported.1,
        new_source_width: new_source.0,
        new_source_height: new_source.1,
        needs_processing: true,
    }
}

/// How a plan held up when its source size was re-clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCheck {
    /// Nothing to check (no constraint, or no processing needed)
    NotApplicable,
    Exact,
    Corrected,
    Unverified,
}

/// [`analyze`], then re-clamp the new source size and nudge it if needed
///
/// The returned plan differs from `analyze` only in `new_source_*`, and only
/// when a neighbouring size lands on the intended imported size.
pub fn analyze_verified(
    dims: ImageDimensions,
    constraint: Option<ImportConstraint>,
) -> (ResizePlan, PlanCheck) {
    let mut plan = analyze(dims, constraint);

    let Some(constraint) = constraint else {
        return (plan, PlanCheck::NotApplicable);
    };
    if !plan.needs_processing {
        return (plan, PlanCheck::NotApplicable);
    }

    let target = (plan.new_imported_width, plan.new_imported_height);
    match verify_required_source(
        (plan.new_source_width, plan.new_source_height),
        constraint.max_size,
        target,
    ) {
        SourceFit::Exact => (plan, PlanCheck::Exact),
        SourceFit::Corrected { width, height } => {
            plan.new_source_width = width;
            plan.new_source_height = height;
            (plan, PlanCheck::Corrected)
        }
        SourceFit::Unverified => {
            warn!(
                "No source size near {}x{} clamps to a quad-aligned size under max {}",
                plan.new_source_width, plan.new_source_height, constraint.max_size
            );
            (plan, PlanCheck::Unverified)
        }
    }
}
