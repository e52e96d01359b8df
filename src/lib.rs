//! ID Scan Server Library
//!
//! Identity-document field extraction from PDF uploads. The main server
//! binary is in main.rs.
//!
//! # Modules
//!
//! - `pdf`: native text extraction and page rasterization via MuPDF
//! - `preprocess`: page image enhancement for OCR and vision
//! - `ocr`: multi-configuration OCR fallback for scanned PDFs
//! - `extraction`: language-model field extraction and validation
//! - `store`: session-scoped JSON record store
//! - `pipeline`: the end-to-end flow for one upload

pub mod config;
pub mod error;
pub mod extraction;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod routes;
pub mod state;
pub mod store;
