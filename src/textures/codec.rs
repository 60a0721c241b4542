//! Image decode/encode at the file boundary
//!
//! Decoding goes through the `image` crate. Pixels come out in one of three
//! precision classes so a resize round-trip does not quietly drop 16-bit or
//! HDR sources to 8 bits. Which output formats can be written depends on the
//! enabled cargo features: PNG and JPEG always, TGA and EXR optionally.

use image::{
    codecs::jpeg::JpegEncoder, ColorType, DynamicImage, ImageBuffer, ImageFormat, ImageReader,
};
use std::io::Cursor;
use tracing::debug;

use super::analyzer::ImageDimensions;
use super::resample::{PixelBuffer, ResampleStrategy};
use crate::error::{QuadError, QuadResult};

/// JPEG quality used when re-encoding
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// File formats the encoder can write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Tga,
    Exr,
}

impl OutputFormat {
    /// Parse a file extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "tga" => Some(OutputFormat::Tga),
            "exr" => Some(OutputFormat::Exr),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Tga => "TGA",
            OutputFormat::Exr => "EXR",
        }
    }

    /// Whether this build can encode the format
    pub fn is_available(&self) -> bool {
        match self {
            OutputFormat::Png | OutputFormat::Jpeg => true,
            OutputFormat::Tga => cfg!(feature = "tga"),
            OutputFormat::Exr => cfg!(feature = "exr"),
        }
    }

    /// Lowercase extensions (no dot) of every format this build can write
    pub fn available_extensions() -> Vec<&'static str> {
        let mut exts = vec!["png", "jpg", "jpeg"];
        if OutputFormat::Tga.is_available() {
            exts.push("tga");
        }
        if OutputFormat::Exr.is_available() {
            exts.push("exr");
        }
        exts
    }
}

/// Precision class of decoded pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Rgba8,
    Rgba16,
    Rgba32F,
}

/// Decoded RGBA pixels in their precision class
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    Rgba8(PixelBuffer<[u8; 4]>),
    Rgba16(PixelBuffer<[u16; 4]>),
    Rgba32F(PixelBuffer<[f32; 4]>),
}

impl Pixels {
    pub fn dimensions(&self) -> ImageDimensions {
        let (w, h) = match self {
            Pixels::Rgba8(buf) => (buf.width(), buf.height()),
            Pixels::Rgba16(buf) => (buf.width(), buf.height()),
            Pixels::Rgba32F(buf) => (buf.width(), buf.height()),
        };
        ImageDimensions::new(w, h)
    }

    pub fn format(&self) -> ColorFormat {
        match self {
            Pixels::Rgba8(_) => ColorFormat::Rgba8,
            Pixels::Rgba16(_) => ColorFormat::Rgba16,
            Pixels::Rgba32F(_) => ColorFormat::Rgba32F,
        }
    }

    /// Resample to `target`, keeping the precision class
    pub fn resized(self, target: ImageDimensions, strategy: ResampleStrategy) -> QuadResult<Self> {
        let (w, h) = target.as_tuple();
        Ok(match self {
            Pixels::Rgba8(buf) => Pixels::Rgba8(strategy.apply(buf, w, h)?),
            Pixels::Rgba16(buf) => Pixels::Rgba16(strategy.apply(buf, w, h)?),
            Pixels::Rgba32F(buf) => Pixels::Rgba32F(strategy.apply(buf, w, h)?),
        })
    }

    fn into_dynamic(self) -> Option<DynamicImage> {
        Some(match self {
            Pixels::Rgba8(buf) => {
                let (w, h) = (buf.width(), buf.height());
                let raw: Vec<u8> = buf.into_pixels().into_iter().flatten().collect();
                DynamicImage::ImageRgba8(ImageBuffer::from_raw(w, h, raw)?)
            }
            Pixels::Rgba16(buf) => {
                let (w, h) = (buf.width(), buf.height());
                let raw: Vec<u16> = buf.into_pixels().into_iter().flatten().collect();
                DynamicImage::ImageRgba16(ImageBuffer::from_raw(w, h, raw)?)
            }
            Pixels::Rgba32F(buf) => {
                let (w, h) = (buf.width(), buf.height());
                let raw: Vec<f32> = buf.into_pixels().into_iter().flatten().collect();
                DynamicImage::ImageRgba32F(ImageBuffer::from_raw(w, h, raw)?)
            }
        })
    }
}

/// A decoded image plus the metadata the encoder needs to keep
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub pixels: Pixels,
    /// File formats handled here never carry a mip chain; kept so callers
    /// that do (e.g. a texture importer) can round-trip the flag.
    pub has_mipmaps: bool,
}

impl DecodedImage {
    pub fn dimensions(&self) -> ImageDimensions {
        self.pixels.dimensions()
    }

    pub fn format(&self) -> ColorFormat {
        self.pixels.format()
    }
}

/// Decode/encode boundary used by the batch pipeline
pub trait ImageCodec {
    /// Read only the header to get the image size
    ///
    /// `extension` is a hint for formats without a magic number (TGA).
    fn dimensions(&self, bytes: &[u8], extension: &str) -> QuadResult<ImageDimensions>;

    fn decode(&self, bytes: &[u8], extension: &str) -> QuadResult<DecodedImage>;

    /// Encode for a file with the given extension
    fn encode(&self, image: DecodedImage, extension: &str) -> QuadResult<Vec<u8>>;
}

/// [`ImageCodec`] backed by the `image` crate
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateCodec {
    pub jpeg_quality: u8,
}

impl Default for ImageCrateCodec {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

fn reader<'a>(bytes: &'a [u8], extension: &str) -> QuadResult<ImageReader<Cursor<&'a [u8]>>> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(QuadError::decode)?;
    if reader.format().is_none() {
        if let Some(format) = ImageFormat::from_extension(extension.trim_start_matches('.')) {
            reader.set_format(format);
        }
    }
    Ok(reader)
}

impl ImageCodec for ImageCrateCodec {
    fn dimensions(&self, bytes: &[u8], extension: &str) -> QuadResult<ImageDimensions> {
        let (width, height) = reader(bytes, extension)?
            .into_dimensions()
            .map_err(QuadError::decode)?;
        if width == 0 || height == 0 {
            return Err(QuadError::decode(format!("empty image ({}x{})", width, height)));
        }
        Ok(ImageDimensions::new(width, height))
    }

    fn decode(&self, bytes: &[u8], extension: &str) -> QuadResult<DecodedImage> {
        let image = reader(bytes, extension)?.decode().map_err(QuadError::decode)?;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(QuadError::decode(format!("empty image ({}x{})", width, height)));
        }

        let pixels = match image.color() {
            ColorType::Rgb32F | ColorType::Rgba32F => Pixels::Rgba32F(PixelBuffer::new(
                width,
                height,
                image.to_rgba32f().pixels().map(|p| p.0).collect(),
            )),
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
                Pixels::Rgba16(PixelBuffer::new(
                    width,
                    height,
                    image.to_rgba16().pixels().map(|p| p.0).collect(),
                ))
            }
            _ => Pixels::Rgba8(PixelBuffer::new(
                width,
                height,
                image.to_rgba8().pixels().map(|p| p.0).collect(),
            )),
        };

        debug!("Decoded {}x{} as {:?}", width, height, pixels.format());
        Ok(DecodedImage {
            pixels,
            has_mipmaps: false,
        })
    }

    fn encode(&self, image: DecodedImage, extension: &str) -> QuadResult<Vec<u8>> {
        let format = OutputFormat::from_extension(extension)
            .filter(OutputFormat::is_available)
            .ok_or_else(|| QuadError::UnsupportedExtension {
                extension: extension.to_string(),
            })?;

        let dynamic = image
            .pixels
            .into_dynamic()
            .ok_or_else(|| QuadError::encode(extension, "pixel buffer does not match its size"))?;
        let mut out = Vec::new();
        let result = match format {
            OutputFormat::Png => dynamic.write_to(&mut Cursor::new(&mut out), ImageFormat::Png),
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(dynamic.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, self.jpeg_quality))
            }
            OutputFormat::Tga => DynamicImage::ImageRgba8(dynamic.to_rgba8())
                .write_to(&mut Cursor::new(&mut out), ImageFormat::Tga),
            OutputFormat::Exr => DynamicImage::ImageRgba32F(dynamic.to_rgba32f())
                .write_to(&mut Cursor::new(&mut out), ImageFormat::OpenExr),
        };
        result.map_err(|e| QuadError::encode(extension, e))?;

        debug!("Encoded {} bytes as {}", out.len(), format.name());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> DecodedImage {
        let pixels = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    if (x + y) % 2 == 0 {
                        [255, 0, 0, 255]
                    } else {
                        [0, 0, 255, 128]
                    }
                })
            })
            .collect();
        DecodedImage {
            pixels: Pixels::Rgba8(PixelBuffer::new(width, height, pixels)),
            has_mipmaps: false,
        }
    }

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(OutputFormat::from_extension(".png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension(".jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension(".tga"), Some(OutputFormat::Tga));
        assert_eq!(OutputFormat::from_extension(".exr"), Some(OutputFormat::Exr));
        assert_eq!(OutputFormat::from_extension(".bmp"), None);
    }

    #[test]
    fn test_png_is_lossless() {
        let codec = ImageCrateCodec::default();
        let image = checker(5, 3);
        let bytes = codec.encode(image.clone(), ".png").unwrap();
        assert_eq!(codec.dimensions(&bytes, ".png").unwrap(), ImageDimensions::new(5, 3));
        assert_eq!(codec.decode(&bytes, ".png").unwrap(), image);
    }

    #[test]
    fn test_jpeg_keeps_dimensions() {
        let codec = ImageCrateCodec::default();
        let bytes = codec.encode(checker(12, 8), ".JPG").unwrap();
        let decoded = codec.decode(&bytes, ".jpg").unwrap();
        assert_eq!(decoded.dimensions(), ImageDimensions::new(12, 8));
        assert_eq!(decoded.format(), ColorFormat::Rgba8);
    }

    #[test]
    fn test_sixteen_bit_png_stays_sixteen_bit() {
        let codec = ImageCrateCodec::default();
        let image = DecodedImage {
            pixels: Pixels::Rgba16(PixelBuffer::new(2, 1, vec![[1000, 2000, 3000, 65535], [7, 8, 9, 10]])),
            has_mipmaps: false,
        };
        let bytes = codec.encode(image.clone(), "png").unwrap();
        assert_eq!(codec.decode(&bytes, "png").unwrap(), image);
    }

    #[test]
    fn test_unsupported_extension() {
        let codec = ImageCrateCodec::default();
        let err = codec.encode(checker(4, 4), ".bmp").unwrap_err();
        assert!(matches!(err, QuadError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_corrupt_bytes() {
        let codec = ImageCrateCodec::default();
        assert!(matches!(
            codec.decode(b"definitely not an image", ".png"),
            Err(QuadError::Decode { .. })
        ));
        assert!(matches!(
            codec.dimensions(b"\x89PNG\r\n\x1a\ntruncated", ".png"),
            Err(QuadError::Decode { .. })
        ));
    }

    #[test]
    fn test_resized_keeps_format() {
        let image = checker(3, 3);
        let resized = image
            .pixels
            .resized(ImageDimensions::new(4, 4), ResampleStrategy::default())
            .unwrap();
        assert_eq!(resized.format(), ColorFormat::Rgba8);
        assert_eq!(resized.dimensions(), ImageDimensions::new(4, 4));
    }

    #[cfg(feature = "tga")]
    #[test]
    fn test_tga_round_trip() {
        let codec = ImageCrateCodec::default();
        let image = checker(6, 2);
        let bytes = codec.encode(image.clone(), ".tga").unwrap();
        // TGA has no magic number, so this relies on the extension hint
        assert_eq!(codec.dimensions(&bytes, ".tga").unwrap(), ImageDimensions::new(6, 2));
        assert_eq!(codec.decode(&bytes, ".tga").unwrap(), image);
    }

    #[cfg(feature = "exr")]
    #[test]
    fn test_exr_keeps_float_pixels() {
        let codec = ImageCrateCodec::default();
        let image = DecodedImage {
            pixels: Pixels::Rgba32F(PixelBuffer::new(1, 2, vec![[2.5, 0.0, 1.0, 1.0], [0.125, 4.0, 0.5, 1.0]])),
            has_mipmaps: false,
        };
        let bytes = codec.encode(image.clone(), ".exr").unwrap();
        let decoded = codec.decode(&bytes, ".exr").unwrap();
        assert_eq!(decoded.format(), ColorFormat::Rgba32F);
        assert_eq!(decoded, image);
    }
}
