//! PDF access
//!
//! Native text extraction and page rasterization on top of MuPDF.
//! Both entry points are synchronous and CPU-bound; async callers
//! run them through `tokio::task::spawn_blocking`.

mod native;
mod rasterizer;
mod types;

#[doc(hidden)]
pub mod fixtures;

pub use native::{NativeTextExtractor, PdfExtractionError};
pub use rasterizer::{PageRasterizer, RasterizeError};
pub use types::{ExtractionResult, SCANNED_CHARS_PER_PAGE};

/// MIME type handed to MuPDF when opening from memory
pub(crate) const PDF_MIME: &str = "application/pdf";

/// The PDF header may be preceded by up to 1024 bytes of junk
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Check for a `%PDF-` header within the leading window
pub(crate) fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
