//! Image preprocessing
//!
//! Deterministic enhancement applied to rasterized pages before
//! recognition. Two profiles exist:
//!
//! - **OCR**: grayscale, contrast stretch, 1.5x Lanczos upscale,
//!   binarization at a fixed threshold, then a sharpening pass. Contrast
//!   runs before upscaling so resampling does not amplify noise; the
//!   threshold runs after upscaling to avoid aliasing; sharpening comes
//!   last to restore edges softened by resampling.
//! - **Vision**: grayscale, contrast x2.0 around the mean, sharpness x2.0.
//!   Lighter, since the vision model copes with gray levels.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};

/// Luminance below this becomes black after binarization
pub const BINARIZE_THRESHOLD: u8 = 150;

/// Upscale factor applied before binarization
pub const UPSCALE_FACTOR: f32 = 1.5;

/// Enhancement factor for both vision adjustments
const VISION_ENHANCE_FACTOR: f32 = 2.0;

const SHARPEN_KERNEL: [i32; 9] = [-2, -2, -2, -2, 32, -2, -2, -2, -2];
const SHARPEN_DIVISOR: i32 = 16;

const SMOOTH_KERNEL: [i32; 9] = [1, 1, 1, 1, 5, 1, 1, 1, 1];
const SMOOTH_DIVISOR: i32 = 13;

/// Page image enhancement
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Full OCR pipeline; output is 1.5x the input size
    pub fn for_ocr(&self, page: &RgbImage) -> GrayImage {
        let gray = grayscale(page);
        let stretched = autocontrast(&gray);
        let upscaled = upscale(&stretched, UPSCALE_FACTOR);
        let binary = binarize(&upscaled, BINARIZE_THRESHOLD);
        convolve3x3(&binary, &SHARPEN_KERNEL, SHARPEN_DIVISOR)
    }

    /// Lighter pipeline for the vision extraction path
    pub fn for_vision(&self, page: &RgbImage) -> GrayImage {
        let gray = grayscale(page);
        let contrasted = enhance_contrast(&gray, VISION_ENHANCE_FACTOR);
        enhance_sharpness(&contrasted, VISION_ENHANCE_FACTOR)
    }
}

pub fn grayscale(page: &RgbImage) -> GrayImage {
    DynamicImage::ImageRgb8(page.clone()).to_luma8()
}

/// Stretch the luminance range so the darkest pixel maps to 0 and the
/// lightest to 255. Flat images are returned unchanged.
pub fn autocontrast(img: &GrayImage) -> GrayImage {
    let (lo, hi) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));

    if hi <= lo {
        return img.clone();
    }

    let scale = 255.0 / (hi - lo) as f32;
    let offset = -(lo as f32) * scale;
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = (i as f32 * scale + offset).clamp(0.0, 255.0) as u8;
    }

    map_pixels(img, |v| lut[v as usize])
}

/// Resize by `factor`, truncating the target dimensions
pub fn upscale(img: &GrayImage, factor: f32) -> GrayImage {
    let width = ((img.width() as f32 * factor) as u32).max(1);
    let height = ((img.height() as f32 * factor) as u32).max(1);
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    map_pixels(img, |v| if v < threshold { 0 } else { 255 })
}

/// Blend every pixel away from the image mean by `factor`
pub fn enhance_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let count = (img.width() as u64 * img.height() as u64).max(1);
    let total: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (total as f32 / count as f32 + 0.5).floor();

    map_pixels(img, |v| blend(mean, v as f32, factor))
}

/// Blend every pixel away from a smoothed copy by `factor`
pub fn enhance_sharpness(img: &GrayImage, factor: f32) -> GrayImage {
    let smooth = convolve3x3(img, &SMOOTH_KERNEL, SMOOTH_DIVISOR);
    let mut out = img.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let base = smooth.get_pixel(x, y).0[0] as f32;
        pixel.0[0] = blend(base, pixel.0[0] as f32, factor);
    }
    out
}

/// 3x3 integer convolution. Border pixels are copied through unfiltered.
pub fn convolve3x3(img: &GrayImage, kernel: &[i32; 9], divisor: i32) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = img.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0i32;
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let v = img.get_pixel(x + kx - 1, y + ky - 1).0[0] as i32;
                    acc += v * kernel[(ky * 3 + kx) as usize];
                }
            }
            let value = (acc as f32 / divisor as f32).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// PNG bytes, as handed to the OCR engine
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// JPEG bytes (RGB), as embedded in vision requests
pub fn encode_jpeg(img: &GrayImage) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageLuma8(img.clone()).to_rgb8();
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;
    Ok(buffer)
}

fn blend(base: f32, value: f32, factor: f32) -> u8 {
    (base + factor * (value - base)).round().clamp(0.0, 255.0) as u8
}

fn map_pixels(img: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = f(pixel.0[0]);
    }
    out
}
