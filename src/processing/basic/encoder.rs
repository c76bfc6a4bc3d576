//! Basic backend: per-format raster decoders plus libwebp's lossy encoder.
//!
//! Only the formats with a dedicated decoder are accepted (JPEG, PNG, GIF,
//! BMP, ICO). TIFF has no decoder here and is rejected.

use std::path::Path;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::processing::backend::{ConversionBackend, ConversionJob};
use crate::processing::WEBP_QUALITY;
use crate::utils::{ConverterError, ConverterResult, DecodeHint, SourceFormat, extract_filename};

/// Decoder chosen for a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RasterDecoder {
    /// Decode with a fixed format
    Fixed(ImageFormat),
    /// Icon containers may hold PNG or BMP data; decode by content
    Sniffed,
}

pub struct BasicEncoder;

impl BasicEncoder {
    /// Verifies the libwebp encoder works by encoding a single pixel.
    pub fn probe() -> ConverterResult<Self> {
        encode_webp(&DynamicImage::new_rgb8(1, 1))?;
        Ok(Self)
    }
}

impl ConversionBackend for BasicEncoder {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn convert(&self, job: &ConversionJob<'_>) -> ConverterResult<()> {
        let decoder = decoder_for(job.declared_type)?;

        // The raster is dropped at the end of this scope whether or not the
        // encode or write below succeeds.
        let raster = decode(job.source, decoder)?;
        let raster = match job.hint {
            DecodeHint::PaletteToTruecolor => expand_to_truecolor(raster),
            DecodeHint::Direct => into_encodable(raster),
        };

        debug!(
            "Decoded '{}': {}×{} {:?}",
            extract_filename(&job.source.to_string_lossy()),
            raster.width(),
            raster.height(),
            raster.color()
        );

        let encoded = encode_webp(&raster)?;
        std::fs::write(job.destination, &*encoded).map_err(|e| {
            ConverterError::io(format!("Cannot write '{}': {e}", job.destination.display()))
        })
    }
}

fn decoder_for(declared_type: &str) -> ConverterResult<RasterDecoder> {
    match SourceFormat::from_mime(declared_type) {
        Some(SourceFormat::Jpeg) => Ok(RasterDecoder::Fixed(ImageFormat::Jpeg)),
        Some(SourceFormat::Png) => Ok(RasterDecoder::Fixed(ImageFormat::Png)),
        Some(SourceFormat::Gif) => Ok(RasterDecoder::Fixed(ImageFormat::Gif)),
        Some(SourceFormat::Bmp) => Ok(RasterDecoder::Fixed(ImageFormat::Bmp)),
        Some(SourceFormat::Ico) => Ok(RasterDecoder::Sniffed),
        Some(SourceFormat::Tiff) | None => Err(ConverterError::format(format!(
            "No basic decoder for '{declared_type}'"
        ))),
    }
}

fn decode(source: &Path, decoder: RasterDecoder) -> ConverterResult<DynamicImage> {
    let reader = ImageReader::open(source)
        .map_err(|e| ConverterError::io(format!("Cannot open '{}': {e}", source.display())))?;

    let reader = match decoder {
        RasterDecoder::Fixed(format) => {
            let mut reader = reader;
            reader.set_format(format);
            reader
        }
        RasterDecoder::Sniffed => reader.with_guessed_format()?,
    };

    reader
        .decode()
        .map_err(|e| ConverterError::processing(format!("Failed to decode '{}': {e}", source.display())))
}

/// Expands palette (and any other sub-8-bit or grey) rasters to 8-bit RGBA.
///
/// Encoding a paletted raster without this step visibly degrades the WebP.
fn expand_to_truecolor(raster: DynamicImage) -> DynamicImage {
    match raster {
        DynamicImage::ImageRgba8(_) => raster,
        other => DynamicImage::ImageRgba8(other.into_rgba8()),
    }
}

/// Brings a raster into one of the two layouts libwebp accepts.
fn into_encodable(raster: DynamicImage) -> DynamicImage {
    match raster {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => raster,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.into_rgba8()),
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

/// Lossy WebP at the fixed quality. The output carries no metadata chunks.
fn encode_webp(raster: &DynamicImage) -> ConverterResult<webp::WebPMemory> {
    let (width, height) = (raster.width(), raster.height());
    let encoder = match raster {
        DynamicImage::ImageRgb8(buffer) => webp::Encoder::from_rgb(buffer.as_raw(), width, height),
        DynamicImage::ImageRgba8(buffer) => webp::Encoder::from_rgba(buffer.as_raw(), width, height),
        other => {
            return Err(ConverterError::processing(format!(
                "Raster layout {:?} cannot be encoded",
                other.color()
            )));
        }
    };

    encoder
        .encode_simple(false, WEBP_QUALITY as f32)
        .map_err(|e| ConverterError::processing(format!("WebP encoding failed: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, Rgb};

    fn job<'a>(source: &'a Path, destination: &'a Path, declared_type: &'a str) -> ConversionJob<'a> {
        let hint = SourceFormat::from_mime(declared_type)
            .map(|f| f.decode_hint())
            .unwrap_or(DecodeHint::Direct);
        ConversionJob { source, destination, declared_type, hint }
    }

    #[test]
    fn probe_succeeds() {
        assert!(BasicEncoder::probe().is_ok());
    }

    #[test]
    fn converts_gif_and_bmp() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_fn(16, 8, |x, _| Rgb([(x * 16) as u8, 80, 160]));

        for (name, format, mime) in [
            ("anim.gif", ImageFormat::Gif, "image/gif"),
            ("legacy.bmp", ImageFormat::Bmp, "image/bmp"),
        ] {
            let source = dir.path().join(name);
            img.save_with_format(&source, format).unwrap();
            let destination = source.with_extension("webp");

            BasicEncoder.convert(&job(&source, &destination, mime)).unwrap();

            let decoded = image::open(&destination).unwrap();
            assert_eq!(decoded.dimensions(), (16, 8), "{name}");
        }
    }

    #[test]
    fn icon_is_decoded_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("favicon.ico");
        image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 128, 255, 255]))
            .save_with_format(&source, ImageFormat::Ico)
            .unwrap();
        let destination = dir.path().join("favicon.webp");

        BasicEncoder.convert(&job(&source, &destination, "image/x-icon")).unwrap();
        assert_eq!(image::open(&destination).unwrap().dimensions(), (16, 16));
    }

    #[test]
    fn grey_rasters_are_widened() {
        let grey = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(2, 2, Luma([7])));
        assert!(matches!(into_encodable(grey), DynamicImage::ImageRgb8(_)));

        let grey = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(2, 2, Luma([7])));
        assert!(matches!(expand_to_truecolor(grey), DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn tiff_has_no_basic_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.tiff");
        std::fs::write(&source, b"II*\0").unwrap();
        let destination = dir.path().join("scan.webp");

        let err = BasicEncoder.convert(&job(&source, &destination, "image/tiff")).unwrap_err();
        assert!(matches!(err, ConverterError::Format(_)));
        assert!(!destination.exists());
    }

    #[test]
    fn corrupt_input_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, b"\xFF\xD8\xFF\xE0 truncated").unwrap();
        let destination = dir.path().join("broken.webp");

        assert!(BasicEncoder.convert(&job(&source, &destination, "image/jpeg")).is_err());
        assert!(!destination.exists());
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("gone.png");
        let destination = dir.path().join("gone.webp");

        let err = BasicEncoder.convert(&job(&source, &destination, "image/png")).unwrap_err();
        assert!(matches!(err, ConverterError::IO(_)));
    }
}
