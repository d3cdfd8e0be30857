use crate::errors::AppError;
use crate::file_converters::pdf::PdfRenderLibrary;
use crate::AppResult;
use rsb_derive::Builder;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

#[cfg(feature = "pdf-render")]
pub use crate::file_converters::pdf_image_converter::PdfiumRenderLibrary;

#[cfg(not(feature = "pdf-render"))]
pub use unavailable::PdfiumRenderLibrary;

pub trait RenderLibraryLoader {
    type Library: PdfRenderLibrary;

    async fn load(&self) -> AppResult<Self::Library>;
}

#[derive(Debug, Clone, Builder)]
pub struct PdfiumLoaderOptions {
    /// Directory holding the Pdfium dynamic library, tried before the default locations.
    pub library_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PdfiumLibraryLoader {
    options: PdfiumLoaderOptions,
}

impl PdfiumLibraryLoader {
    pub fn new(options: PdfiumLoaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PdfiumLoaderOptions {
        &self.options
    }
}

impl Default for PdfiumLibraryLoader {
    fn default() -> Self {
        Self::new(PdfiumLoaderOptions::new())
    }
}

impl RenderLibraryLoader for PdfiumLibraryLoader {
    type Library = PdfiumRenderLibrary;

    #[cfg(feature = "pdf-render")]
    async fn load(&self) -> AppResult<Self::Library> {
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || PdfiumRenderLibrary::bind(&options)).await?
    }

    #[cfg(not(feature = "pdf-render"))]
    async fn load(&self) -> AppResult<Self::Library> {
        Err(AppError::EnvironmentError {
            message: "PDF rendering can only be used in builds with the pdf-render feature."
                .to_string(),
        })
    }
}

/// Outcome of one load attempt, shared by every caller that waited on it.
type LoadOutcome<T> = Result<Arc<T>, Arc<AppError>>;

/// Lazily loaded rendering library shared by every conversion.
///
/// Callers arriving while a load is in flight wait for it instead of starting
/// their own, and all of them receive its outcome, failed or not. A failed
/// generation is discarded afterwards, so a later call loads again.
pub struct RenderLibrary<L: RenderLibraryLoader> {
    loader: L,
    handle: Mutex<Arc<OnceCell<LoadOutcome<L::Library>>>>,
}

static GLOBAL_PDFIUM_LIBRARY: LazyLock<RenderLibrary<PdfiumLibraryLoader>> =
    LazyLock::new(|| RenderLibrary::new(PdfiumLibraryLoader::default()));

impl RenderLibrary<PdfiumLibraryLoader> {
    pub fn global() -> &'static RenderLibrary<PdfiumLibraryLoader> {
        &GLOBAL_PDFIUM_LIBRARY
    }
}

impl<L: RenderLibraryLoader> RenderLibrary<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            handle: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    pub async fn ensure_loaded(&self) -> AppResult<Arc<L::Library>> {
        let handle = self.current_handle();
        let outcome = handle
            .get_or_init(|| async {
                info!("Loading PDF rendering library");
                match self.loader.load().await {
                    Ok(library) => {
                        debug!("PDF rendering library loaded");
                        Ok(Arc::new(library))
                    }
                    Err(err) => {
                        warn!("Failed to load PDF rendering library: {err}");
                        Err(Arc::new(err))
                    }
                }
            })
            .await;
        match outcome {
            Ok(library) => Ok(library.clone()),
            Err(err) => {
                self.discard_failed(&handle);
                Err(AppError::SharedError(err.clone()))
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.current_handle().get(), Some(Ok(_)))
    }

    /// Forgets the loaded library; the next caller loads it again.
    pub fn reset(&self) {
        *self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(OnceCell::new());
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    fn current_handle(&self) -> Arc<OnceCell<LoadOutcome<L::Library>>> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // Only the failed generation itself is replaced; a newer one is left alone.
    fn discard_failed(&self, failed: &Arc<OnceCell<LoadOutcome<L::Library>>>) {
        let mut handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if Arc::ptr_eq(&handle, failed) {
            *handle = Arc::new(OnceCell::new());
        }
    }
}

#[cfg(not(feature = "pdf-render"))]
mod unavailable {
    use crate::file_converters::pdf::{PdfRenderLibrary, RenderedPage};
    use crate::AppResult;

    /// Stands in for Pdfium in builds that cannot render; it has no values.
    pub enum PdfiumRenderLibrary {}

    impl PdfRenderLibrary for PdfiumRenderLibrary {
        fn render_page(
            &self,
            _pdf_bytes: &[u8],
            _page_number: u16,
            _scale: f32,
        ) -> AppResult<RenderedPage> {
            match *self {}
        }
    }
}
