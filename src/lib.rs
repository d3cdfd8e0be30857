//! Renders the first page of a PDF file into a PNG image.
//!
//! The Pdfium library is loaded lazily, once per process, and shared by every
//! conversion. [`convert_pdf_to_image`] never fails: errors are reported in the
//! returned [`ConversionResult`].

pub mod common_types;
pub mod errors;
pub mod file_converters;
pub mod file_systems;
pub mod file_tools;
pub mod object_urls;
pub mod reporter;

use crate::errors::AppError;

pub type AppResult<T> = Result<T, AppError>;

pub use common_types::{png_file_name, BinaryFile, ConversionResult, ObjectUrl};
pub use file_converters::{convert_pdf_to_image, PdfPageRasterizer};
pub use object_urls::ObjectUrlRegistry;
