//! Nearest-neighbour resampling
//!
//! Sampling is edge-anchored: destination pixel `x` reads source pixel
//! `floor(x * (src - 1) / (dst - 1))`, so the four corners of the source and
//! destination images always coincide. The chunked variant walks the
//! destination in bands of rows and only asks for the source rows a band
//! needs; it produces the same pixels as the whole-image variant.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::ops::Range;

use crate::error::{QuadError, QuadResult};

/// Default band height for [`resize_chunked`]
pub const DEFAULT_CHUNK_ROWS: u32 = 128;

/// Row-major pixel storage with known dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<P> {
    width: u32,
    height: u32,
    pixels: Vec<P>,
}

impl<P: Copy> PixelBuffer<P> {
    pub fn new(width: u32, height: u32, pixels: Vec<P>) -> Self {
        assert!(width > 0 && height > 0, "pixel buffer dimensions must be non-zero");
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "pixel count does not match {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[P] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<P> {
        self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> P {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    fn row(&self, y: u32) -> &[P] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Borrow rows `y0..y0 + rows` as one row-major slice
    pub fn rows(&self, y0: u32, rows: u32) -> &[P] {
        assert!(y0 + rows <= self.height, "row range out of bounds");
        let start = y0 as usize * self.width as usize;
        &self.pixels[start..start + rows as usize * self.width as usize]
    }
}

/// Empty pixel storage with room for `width * height` pixels
///
/// Allocation failure is reported instead of aborting.
fn try_alloc<P>(width: u32, height: u32) -> QuadResult<Vec<P>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or(QuadError::Reinitialize { width, height })?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| QuadError::Reinitialize { width, height })?;
    Ok(pixels)
}

/// Source coordinate sampled by destination coordinate `i`
fn source_index(i: u32, src: u32, dst: u32) -> u32 {
    if dst == 1 {
        return 0;
    }
    let mapped = i as u64 * (src as u64 - 1) / (dst as u64 - 1);
    (mapped as u32).min(src - 1)
}

fn column_map(src_w: u32, dst_w: u32) -> Vec<u32> {
    (0..dst_w).map(|x| source_index(x, src_w, dst_w)).collect()
}

/// Fill `out` with one destination row sampled from `src_row`
fn sample_row<P: Copy>(src_row: &[P], columns: &[u32], out: &mut Vec<P>) {
    out.extend(columns.iter().map(|&sx| src_row[sx as usize]));
}

fn sample_into<P: Copy>(src: &PixelBuffer<P>, dst_w: u32, dst_h: u32, mut pixels: Vec<P>) -> PixelBuffer<P> {
    let columns = column_map(src.width, dst_w);
    for y in 0..dst_h {
        let sy = source_index(y, src.height, dst_h);
        sample_row(src.row(sy), &columns, &mut pixels);
    }
    PixelBuffer::new(dst_w, dst_h, pixels)
}

/// Resize a whole image in one pass
///
/// Returns the input untouched when the size does not change.
pub fn resize<P: Copy>(src: PixelBuffer<P>, dst_w: u32, dst_h: u32) -> PixelBuffer<P> {
    assert!(dst_w > 0 && dst_h > 0, "target dimensions must be non-zero");
    if (dst_w, dst_h) == (src.width, src.height) {
        return src;
    }
    let pixels = Vec::with_capacity(dst_w as usize * dst_h as usize);
    sample_into(&src, dst_w, dst_h, pixels)
}

/// [`resize`], reporting a destination that cannot be allocated
pub fn try_resize<P: Copy>(
    src: PixelBuffer<P>,
    dst_w: u32,
    dst_h: u32,
) -> QuadResult<PixelBuffer<P>> {
    assert!(dst_w > 0 && dst_h > 0, "target dimensions must be non-zero");
    if (dst_w, dst_h) == (src.width, src.height) {
        return Ok(src);
    }
    let pixels = try_alloc(dst_w, dst_h)?;
    Ok(sample_into(&src, dst_w, dst_h, pixels))
}

/// Source rows needed to produce destination rows `band_start..band_end`
///
/// Covers the proportional range `floor(start * src / dst)..ceil(end * src / dst)`
/// widened to whatever the edge-anchored mapping actually samples, clamped
/// to the source height.
pub fn source_rows_for_band(src_h: u32, dst_h: u32, band_start: u32, band_end: u32) -> Range<u32> {
    assert!(band_start < band_end && band_end <= dst_h, "invalid band");
    let src = src_h as u64;
    let dst = dst_h as u64;

    let proportional_lo = (band_start as u64 * src / dst) as u32;
    let proportional_hi = (band_end as u64 * src).div_ceil(dst) as u32;
    let sampled_lo = source_index(band_start, src_h, dst_h);
    let sampled_hi = source_index(band_end - 1, src_h, dst_h) + 1;

    let lo = proportional_lo.min(sampled_lo).min(src_h - 1);
    let hi = proportional_hi.max(sampled_hi).min(src_h);
    lo..hi
}

/// One band of destination rows
#[derive(Debug, Clone, PartialEq)]
pub struct Band<P> {
    pub dst_y0: u32,
    pub pixels: PixelBuffer<P>,
}

/// Iterator returned by [`resize_chunked`]
pub struct ChunkedResize<'a, P, F> {
    provider: F,
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    chunk_rows: u32,
    next_row: u32,
    columns: Vec<u32>,
    _rows: PhantomData<&'a [P]>,
}

/// Resize band by band, pulling source rows on demand
///
/// `provider(y0, rows)` returns source rows `y0..y0 + rows`, `src_w` pixels
/// each, row-major. It can lend them from a decoded image or hand over rows
/// it just produced; only one source band is requested at a time.
pub fn resize_chunked<'a, P, F>(
    provider: F,
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    chunk_rows: u32,
) -> ChunkedResize<'a, P, F>
where
    P: Copy,
    F: FnMut(u32, u32) -> Cow<'a, [P]>,
{
    assert!(src_w > 0 && src_h > 0, "source dimensions must be non-zero");
    assert!(dst_w > 0 && dst_h > 0, "target dimensions must be non-zero");
    assert!(chunk_rows > 0, "chunk height must be non-zero");

    ChunkedResize {
        provider,
        src_w,
        src_h,
        dst_w,
        dst_h,
        chunk_rows,
        next_row: 0,
        columns: column_map(src_w, dst_w),
        _rows: PhantomData,
    }
}

impl<'a, P, F> ChunkedResize<'a, P, F>
where
    P: Copy,
    F: FnMut(u32, u32) -> Cow<'a, [P]>,
{
    /// Append the next band's rows to `out`; returns its first destination row
    fn sample_next_band(&mut self, out: &mut Vec<P>) -> Option<u32> {
        if self.next_row >= self.dst_h {
            return None;
        }

        let band_start = self.next_row;
        let band_end = band_start.saturating_add(self.chunk_rows).min(self.dst_h);
        self.next_row = band_end;

        let rows = source_rows_for_band(self.src_h, self.dst_h, band_start, band_end);
        let source = (self.provider)(rows.start, rows.end - rows.start);
        let width = self.src_w as usize;
        assert_eq!(
            source.len(),
            width * (rows.end - rows.start) as usize,
            "provider returned the wrong number of pixels"
        );

        for y in band_start..band_end {
            let sy = (source_index(y, self.src_h, self.dst_h) - rows.start) as usize;
            sample_row(&source[sy * width..(sy + 1) * width], &self.columns, out);
        }
        Some(band_start)
    }
}

impl<'a, P, F> Iterator for ChunkedResize<'a, P, F>
where
    P: Copy,
    F: FnMut(u32, u32) -> Cow<'a, [P]>,
{
    type Item = Band<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let band_rows = self.chunk_rows.min(self.dst_h.saturating_sub(self.next_row));
        let mut pixels = Vec::with_capacity(self.dst_w as usize * band_rows as usize);
        let dst_y0 = self.sample_next_band(&mut pixels)?;

        Some(Band {
            dst_y0,
            pixels: PixelBuffer::new(self.dst_w, band_rows, pixels),
        })
    }
}

/// How the batch pipeline runs the resampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleStrategy {
    /// One pass over the full destination buffer
    WholeImage,
    /// Bands of `rows` destination rows at a time
    Chunked { rows: u32 },
}

impl Default for ResampleStrategy {
    fn default() -> Self {
        ResampleStrategy::Chunked {
            rows: DEFAULT_CHUNK_ROWS,
        }
    }
}

impl ResampleStrategy {
    /// Resize `src` into one buffer for the encoder
    ///
    /// Both strategies allocate the destination once, up front. The chunked
    /// one lends source rows band by band instead of copying them, so its
    /// peak memory matches the whole-image pass; it only saves memory over
    /// it when [`resize_chunked`] is fed rows that are not all resident.
    pub fn apply<P: Copy>(
        self,
        src: PixelBuffer<P>,
        dst_w: u32,
        dst_h: u32,
    ) -> QuadResult<PixelBuffer<P>> {
        match self {
            ResampleStrategy::WholeImage => try_resize(src, dst_w, dst_h),
            ResampleStrategy::Chunked { .. } if (dst_w, dst_h) == (src.width, src.height) => Ok(src),
            ResampleStrategy::Chunked { rows } => {
                let mut pixels = try_alloc(dst_w, dst_h)?;
                let source = &src;
                let mut bands = resize_chunked(
                    move |y0, count| Cow::Borrowed(source.rows(y0, count)),
                    src.width,
                    src.height,
                    dst_w,
                    dst_h,
                    rows,
                );
                while bands.sample_next_band(&mut pixels).is_some() {}
                Ok(PixelBuffer::new(dst_w, dst_h, pixels))
            }
        }
    }
}
