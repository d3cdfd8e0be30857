use indicatif::style::TemplateError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Environment error: {message}")]
    EnvironmentError { message: String },
    #[error("Rendering library load error: {message}")]
    LibraryLoadError { message: String },
    #[error("Document error: {message}")]
    DocumentError { message: String },
    #[error("Render error: {message}")]
    RenderError { message: String },
    #[error("Encode error: {message}")]
    EncodeError { message: String },
    #[error("Unknown file system is specified: {file_path}")]
    UnknownFileSystem { file_path: String },
    #[error("Input/output error")]
    InputOutputError(#[from] std::io::Error),
    #[cfg(feature = "pdf-render")]
    #[error("PDF conversion error: {0}")]
    PdfiumError(#[from] pdfium_render::prelude::PdfiumError),
    #[error("Image conversion error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),
    #[error("Destination '{destination}' doesn't support multiple files. Trailing slash needed?")]
    DestinationDoesNotSupportMultipleFiles { destination: String },
    #[error("System error: {message}")]
    SystemError { message: String },
    #[error(transparent)]
    SharedError(Arc<AppError>),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::SystemError {
            message: format!("Background task failed: {err}"),
        }
    }
}
