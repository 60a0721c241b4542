//! Quad-alignment arithmetic
//!
//! Block-compressed texture formats (BC1-BC7, ETC, ASTC 4x4) encode 4x4
//! pixel blocks, so both axes of an image need to be multiples of four.
//! These helpers decide what size an image should become, including the
//! case where an importer clamps the longer axis to a maximum size before
//! the image reaches the GPU.

/// Round a dimension up to the next multiple of four
///
/// `d` must be at least 1.
pub fn quantize_up4(d: u32) -> u32 {
    assert!(d > 0, "dimension must be non-zero");
    if d % 4 == 0 {
        d
    } else {
        d.div_ceil(4) * 4
    }
}

/// Whether both axes are multiples of four
pub fn is_quad_aligned(width: u32, height: u32) -> bool {
    width % 4 == 0 && height % 4 == 0
}

/// Apply an importer-style max size clamp
///
/// The longer axis becomes exactly `max_size`; the shorter one is scaled by
/// the same ratio and rounded half away from zero. Square images are treated
/// as width-constrained. Images that already fit are returned unchanged.
pub fn clamp_to_bound(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    if width <= max_size && height <= max_size {
        return (width, height);
    }

    if width >= height {
        (max_size, scale_axis(height, max_size, width))
    } else {
        (scale_axis(width, max_size, height), max_size)
    }
}

/// Source size that, once clamped, should land on the target imported size
///
/// Inverts the clamp ratio per axis: `round(source * target / imported)`.
/// The clamp rounds, so this is not an exact inverse; see
/// [`verify_required_source`] for the optional correction pass.
pub fn required_source_for_target_imported(
    source: (u32, u32),
    imported: (u32, u32),
    target_imported: (u32, u32),
) -> (u32, u32) {
    assert!(
        imported.0 > 0 && imported.1 > 0,
        "imported dimensions must be non-zero"
    );
    (
        scale_axis(source.0, target_imported.0, imported.0),
        scale_axis(source.1, target_imported.1, imported.1),
    )
}

/// `round(value * numerator / denominator)`, never below 1
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (value as f64 * numerator as f64 / denominator as f64).round();
    (scaled as u32).max(1)
}

/// Outcome of re-checking a computed source size against the clamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFit {
    /// Clamping the computed size already gives the target
    Exact,
    /// A neighbouring size (each axis nudged by at most one) was needed
    Corrected { width: u32, height: u32 },
    /// No size within one pixel clamps to a quad-aligned result
    Unverified,
}

/// Re-clamp `candidate` and nudge it by ±1 per axis if it misses `target`
///
/// Prefers a neighbour that clamps exactly to `target`; failing that, any
/// neighbour whose clamped size is quad-aligned.
pub fn verify_required_source(
    candidate: (u32, u32),
    max_size: u32,
    target: (u32, u32),
) -> SourceFit {
    if clamp_to_bound(candidate.0, candidate.1, max_size) == target {
        return SourceFit::Exact;
    }

    let neighbours = nudged(candidate);

    let exact = neighbours
        .iter()
        .find(|&&(w, h)| clamp_to_bound(w, h, max_size) == target);
    let aligned = || {
        neighbours.iter().find(|&&(w, h)| {
            let (cw, ch) = clamp_to_bound(w, h, max_size);
            is_quad_aligned(cw, ch)
        })
    };

    match exact.or_else(aligned) {
        Some(&(width, height)) => SourceFit::Corrected { width, height },
        None => SourceFit::Unverified,
    }
}

/// Neighbours of a size, closest first, skipping zero dimensions
fn nudged((width, height): (u32, u32)) -> Vec<(u32, u32)> {
    const OFFSETS: [(i64, i64); 8] = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];

    OFFSETS
        .iter()
        .filter_map(|&(dw, dh)| {
            let w = width as i64 + dw;
            let h = height as i64 + dh;
            (w > 0 && h > 0).then_some((w as u32, h as u32))
        })
        .collect()
}
