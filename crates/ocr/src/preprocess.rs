//! Decoding and enhancement of uploaded rasters.
//!
//! Every color buffer leaving this module is 8-bit RGB (`RgbImage`); every
//! enhanced buffer is 8-bit single-channel (`GrayImage`).

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::filter::separable_filter_equal;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
    #[error("PDF rasterizer not found at '{}'", .0.display())]
    RasterizerUnavailable(PathBuf),
    #[error("PDF rasterization failed: {0}")]
    Rasterize(String),
    #[error("PDF document is empty")]
    EmptyDocument,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// 5-tap smoothing kernel: the fixed binomial weights 1 4 6 4 1.
const BLUR_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

// Adaptive threshold neighborhood: 11-tap Gaussian-weighted mean, offset 2.
// Sigma follows the 0.3*((k-1)/2 - 1) + 0.8 rule.
const THRESHOLD_TAPS: usize = 11;
const THRESHOLD_SIGMA: f32 = 2.0;
const THRESHOLD_OFFSET: i16 = 2;

/// Decode JPEG / PNG / any format `image` understands into canonical RGB.
pub fn decode_image(data: &[u8]) -> Result<RgbImage, PreprocessError> {
    match image::load_from_memory(data) {
        Ok(img) => {
            debug!(width = img.width(), height = img.height(), color = ?img.color(), "decoded upload");
            Ok(img.to_rgb8())
        }
        Err(e) => {
            warn!(error = %e, "failed to decode uploaded image");
            Err(PreprocessError::Decode(e))
        }
    }
}

/// Reserved for geometric correction; currently the identity transform.
pub fn correct_perspective(img: DynamicImage) -> DynamicImage {
    img
}

/// Grayscale → 5×5 Gaussian blur → Gaussian adaptive threshold.
///
/// Uneven lighting across a card defeats a single global cutoff, so each
/// pixel is compared against its own neighborhood instead. The result only
/// ever contains 0 and 255.
pub fn enhance(img: &DynamicImage) -> GrayImage {
    let gray = to_luma8(img);
    if gray.width() == 0 || gray.height() == 0 {
        warn!("enhance called on an empty raster, returning plain grayscale");
        return gray;
    }

    let blurred = separable_filter_equal(&gray, &BLUR_KERNEL[..]);
    let local_mean =
        separable_filter_equal(&blurred, &gaussian_kernel(THRESHOLD_TAPS, THRESHOLD_SIGMA));

    GrayImage::from_fn(blurred.width(), blurred.height(), |x, y| {
        let p = blurred.get_pixel(x, y)[0] as i16;
        let mean = local_mean.get_pixel(x, y)[0] as i16;
        if p > mean - THRESHOLD_OFFSET {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Single-channel 8-bit view of any raster.
///
/// Integer images use the standard luminance conversion. Floating-point
/// images are treated as [0, 1] when no sample exceeds 1.0 and as [0, 255]
/// otherwise, clamped either way.
pub fn to_luma8(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageRgb32F(buf) => float_to_luma8(buf.width(), buf.height(), buf.as_raw(), 3),
        DynamicImage::ImageRgba32F(buf) => {
            float_to_luma8(buf.width(), buf.height(), buf.as_raw(), 4)
        }
        other => other.to_luma8(),
    }
}

fn float_to_luma8(width: u32, height: u32, samples: &[f32], channels: usize) -> GrayImage {
    let max = samples.iter().copied().fold(0.0f32, f32::max);
    let scale = if max <= 1.0 { 255.0 } else { 1.0 };

    GrayImage::from_fn(width, height, |x, y| {
        let i = (y as usize * width as usize + x as usize) * channels;
        let luma = 0.2126 * samples[i] + 0.7152 * samples[i + 1] + 0.0722 * samples[i + 2];
        Luma([(luma * scale).round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalized 1-D Gaussian kernel with `taps` entries.
fn gaussian_kernel(taps: usize, sigma: f32) -> Vec<f32> {
    let center = (taps / 2) as f32;
    let raw: Vec<f32> = (0..taps)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

/// PNG bytes of a grayscale raster, as handed to the OCR engine.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgb32FImage, Rgba};

    fn white_with_bar(width: u32, height: u32, bar: std::ops::Range<u32>) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            if bar.contains(&x) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    fn encode(img: DynamicImage, format: image::ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn decode_png_yields_rgb() {
        let bytes = encode(DynamicImage::ImageRgb8(white_with_bar(8, 6, 2..4)), image::ImageFormat::Png);
        let img = decode_image(&bytes).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(2, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn decode_jpeg_yields_rgb() {
        let bytes = encode(DynamicImage::ImageRgb8(white_with_bar(16, 16, 4..8)), image::ImageFormat::Jpeg);
        let img = decode_image(&bytes).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
    }

    #[test]
    fn decode_converts_rgba_and_gray_to_rgb() {
        let rgba: image::RgbaImage = ImageBuffer::from_fn(3, 3, |_, _| Rgba([10, 20, 30, 128]));
        let img = decode_image(&encode(DynamicImage::ImageRgba8(rgba), image::ImageFormat::Png)).unwrap();
        assert_eq!(img.get_pixel(1, 1), &Rgb([10, 20, 30]));

        let gray: GrayImage = ImageBuffer::from_fn(3, 3, |_, _| Luma([77]));
        let img = decode_image(&encode(DynamicImage::ImageLuma8(gray), image::ImageFormat::Png)).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([77, 77, 77]));
    }

    #[test]
    fn decode_rejects_truncated_bytes() {
        let bytes = encode(DynamicImage::ImageRgb8(white_with_bar(32, 32, 4..8)), image::ImageFormat::Png);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(decode_image(truncated).is_err());
        assert!(decode_image(b"definitely not an image").is_err());
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn enhance_output_is_binary_single_channel() {
        let img = DynamicImage::ImageRgb8(white_with_bar(40, 20, 18..21));
        let out = enhance(&img);
        assert_eq!(out.dimensions(), (40, 20));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn enhance_keeps_thin_strokes_dark() {
        let img = DynamicImage::ImageRgb8(white_with_bar(40, 20, 18..21));
        let out = enhance(&img);
        assert_eq!(out.get_pixel(19, 10)[0], 0);
        assert_eq!(out.get_pixel(2, 10)[0], 255);
        assert_eq!(out.get_pixel(37, 10)[0], 255);
    }

    #[test]
    fn enhance_uniform_page_is_white() {
        let gray: GrayImage = ImageBuffer::from_fn(16, 16, |_, _| Luma([128]));
        let out = enhance(&DynamicImage::ImageLuma8(gray));
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn enhance_handles_degenerate_sizes() {
        let one = enhance(&DynamicImage::ImageLuma8(GrayImage::new(1, 1)));
        assert_eq!(one.dimensions(), (1, 1));
        let empty = enhance(&DynamicImage::ImageLuma8(GrayImage::new(0, 0)));
        assert_eq!(empty.dimensions(), (0, 0));
    }

    #[test]
    fn enhance_accepts_sixteen_bit_input() {
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(12, 12, |x, _| Luma([if x == 6 { 0 } else { u16::MAX }]));
        let out = enhance(&DynamicImage::ImageLuma16(img));
        assert_eq!(out.dimensions(), (12, 12));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn enhance_accepts_float_input() {
        let img: Rgb32FImage = ImageBuffer::from_fn(40, 20, |x, _| {
            if (18..21).contains(&x) { Rgb([0.0, 0.0, 0.0]) } else { Rgb([1.0, 1.0, 1.0]) }
        });
        let out = enhance(&DynamicImage::ImageRgb32F(img));
        assert_eq!(out.dimensions(), (40, 20));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(19, 10)[0], 0);
        assert_eq!(out.get_pixel(2, 10)[0], 255);
    }

    #[test]
    fn blur_kernel_is_binomial() {
        assert!((BLUR_KERNEL.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(BLUR_KERNEL[2], 0.375);
        assert_eq!(BLUR_KERNEL[0], BLUR_KERNEL[4]);
    }

    #[test]
    fn to_luma8_scales_unit_floats() {
        let img: Rgb32FImage = ImageBuffer::from_fn(2, 2, |_, _| Rgb([1.0, 1.0, 1.0]));
        let gray = to_luma8(&DynamicImage::ImageRgb32F(img));
        assert!(gray.pixels().all(|p| p[0] == 255));

        let img: Rgb32FImage = ImageBuffer::from_fn(2, 2, |_, _| Rgb([0.6, 0.6, 0.6]));
        let gray = to_luma8(&DynamicImage::ImageRgb32F(img));
        assert!(gray.pixels().all(|p| p[0] == 153));
    }

    #[test]
    fn to_luma8_casts_byte_range_floats() {
        let img: Rgb32FImage = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([200.0, 200.0, 200.0]) } else { Rgb([300.0, 300.0, 300.0]) }
        });
        let gray = to_luma8(&DynamicImage::ImageRgb32F(img));
        assert_eq!(gray.get_pixel(0, 0)[0], 200);
        assert_eq!(gray.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn perspective_correction_is_identity() {
        let img = DynamicImage::ImageRgb8(white_with_bar(5, 5, 1..2));
        let out = correct_perspective(img.clone());
        assert_eq!(out, img);
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(THRESHOLD_TAPS, THRESHOLD_SIGMA);
        assert_eq!(k.len(), 11);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(k[0], k[10]);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn encode_png_has_magic_header() {
        let gray: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([100]));
        let bytes = encode_png(&gray).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
