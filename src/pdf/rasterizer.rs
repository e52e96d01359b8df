//! Page rasterization
//!
//! Renders every page of a PDF to an RGB image at a fixed resolution.

use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix};
use thiserror::Error;

use super::{has_pdf_header, PDF_MIME};

/// PDF user space is 72 points per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterization errors
#[derive(Error, Debug)]
pub enum RasterizeError {
    #[error("Not a PDF: missing %PDF- header")]
    NotAPdf,
    #[error("Failed to load PDF: {0}")]
    LoadError(String),
    #[error("Failed to render page {page}: {message}")]
    RenderError { page: usize, message: String },
    #[error("Image buffer error on page {0}")]
    ImageError(usize),
}

impl From<mupdf::Error> for RasterizeError {
    fn from(e: mupdf::Error) -> Self {
        RasterizeError::LoadError(e.to_string())
    }
}

/// Converts PDF pages to raster images
#[derive(Debug, Clone, Copy)]
pub struct PageRasterizer {
    dpi: u32,
}

impl PageRasterizer {
    /// Resolution used ahead of OCR
    pub const OCR_DPI: u32 = 300;
    /// Resolution used ahead of vision extraction
    pub const VISION_DPI: u32 = 200;

    pub fn new(dpi: u32) -> Self {
        Self { dpi: dpi.max(1) }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Render every page, in order.
    ///
    /// A document without pages yields an empty vector; callers decide
    /// whether that is an error.
    pub fn rasterize(&self, pdf_bytes: &[u8]) -> Result<Vec<RgbImage>, RasterizeError> {
        if !has_pdf_header(pdf_bytes) {
            return Err(RasterizeError::NotAPdf);
        }

        let doc = Document::from_bytes(pdf_bytes, PDF_MIME)?;
        let page_count = doc.page_count()?.max(0) as usize;

        let scale = self.dpi as f32 / POINTS_PER_INCH;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        let mut images = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let render_err = |e: mupdf::Error| RasterizeError::RenderError {
                page: index + 1,
                message: e.to_string(),
            };

            let page = doc.load_page(index as i32).map_err(render_err)?;
            // to_pixmap signature: (ctm, colorspace, alpha, show_extras) -> Pixmap
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, true)
                .map_err(render_err)?;

            images.push(pixmap_to_rgb(&pixmap, index + 1)?);
        }

        tracing::debug!(pages = images.len(), dpi = self.dpi, "Rasterized PDF");
        Ok(images)
    }
}

fn pixmap_to_rgb(pixmap: &mupdf::Pixmap, page: usize) -> Result<RgbImage, RasterizeError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = (pixmap.n() as usize).max(1);

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(255);
            // Single-channel pixmaps replicate gray into all three channels
            let (g, b) = if n >= 3 {
                (
                    samples.get(offset + 1).copied().unwrap_or(255),
                    samples.get(offset + 2).copied().unwrap_or(255),
                )
            } else {
                (r, r)
            };
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    RgbImage::from_raw(width, height, rgb).ok_or(RasterizeError::ImageError(page))
}
