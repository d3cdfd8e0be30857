use crate::common_types::{png_file_name, BinaryFile, ConversionResult, ObjectUrl};
use crate::file_converters::library::{PdfiumLibraryLoader, RenderLibrary, RenderLibraryLoader};
use crate::file_converters::pdf::{PdfRenderLibrary, FIRST_PAGE, RENDER_SCALE};
use crate::file_converters::png::encode_png;
use crate::object_urls::ObjectUrlRegistry;
use crate::AppResult;
use tracing::{debug, warn};

pub const BLOB_CREATION_ERROR: &str = "Failed to create image blob";
pub const CONVERSION_ERROR_PREFIX: &str = "Failed to convert PDF: ";

/// Renders the first page of PDF files into PNG images.
pub struct PdfPageRasterizer<'a, L: RenderLibraryLoader> {
    library: &'a RenderLibrary<L>,
    object_urls: &'a ObjectUrlRegistry,
}

enum RasterizeOutcome {
    Rendered { image_url: ObjectUrl, file: BinaryFile },
    NoImageData,
}

impl PdfPageRasterizer<'static, PdfiumLibraryLoader> {
    /// Rasterizer backed by the process-wide Pdfium library and object URL registry.
    pub fn global() -> Self {
        Self::new(RenderLibrary::global(), ObjectUrlRegistry::global())
    }
}

impl<'a, L: RenderLibraryLoader> PdfPageRasterizer<'a, L> {
    pub fn new(library: &'a RenderLibrary<L>, object_urls: &'a ObjectUrlRegistry) -> Self {
        Self {
            library,
            object_urls,
        }
    }

    pub fn object_urls(&self) -> &'a ObjectUrlRegistry {
        self.object_urls
    }

    /// Converts the first page of `file` into a PNG image.
    ///
    /// Never fails: errors are reported through [`ConversionResult::error`].
    pub async fn convert(&self, file: &BinaryFile) -> ConversionResult {
        debug!("Converting {} ({} bytes)", file.name, file.size());
        match self.rasterize(file).await {
            Ok(RasterizeOutcome::Rendered { image_url, file }) => {
                debug!("Converted into {} ({} bytes)", file.name, file.size());
                ConversionResult::success(image_url, file)
            }
            Ok(RasterizeOutcome::NoImageData) => {
                warn!("Rendering {} produced no image data", file.name);
                ConversionResult::failure(BLOB_CREATION_ERROR)
            }
            Err(err) => {
                warn!("Unable to convert {}: {}", file.name, err);
                ConversionResult::failure(format!("{CONVERSION_ERROR_PREFIX}{err}"))
            }
        }
    }

    async fn rasterize(&self, file: &BinaryFile) -> AppResult<RasterizeOutcome> {
        let library = self.library.ensure_loaded().await?;
        let pdf_bytes = file.data.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            library.render_page(&pdf_bytes, FIRST_PAGE, RENDER_SCALE)
        })
        .await??;
        debug!(
            "Rendered page {} of {} ({}x{} pt) into {}x{} px",
            FIRST_PAGE,
            file.name,
            rendered.page_width,
            rendered.page_height,
            rendered.image.width(),
            rendered.image.height()
        );

        let image = rendered.image;
        let blob = match tokio::task::spawn_blocking(move || encode_png(&image)).await?? {
            Some(blob) => blob,
            None => return Ok(RasterizeOutcome::NoImageData),
        };

        Ok(RasterizeOutcome::Rendered {
            image_url: self.object_urls.create_object_url(blob.clone()),
            file: BinaryFile::png(png_file_name(&file.name), blob),
        })
    }
}

/// Converts the first page of `file` with the process-wide rasterizer.
pub async fn convert_pdf_to_image(file: &BinaryFile) -> ConversionResult {
    PdfPageRasterizer::global().convert(file).await
}

#[cfg(test)]
#[allow(unused_imports)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::file_converters::library::PdfiumLoaderOptions;
    use crate::file_converters::pdf::{PdfViewport, RenderedPage};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FAKE_PDF_HEADER: &[u8] = b"%PDF-";

    /// Treats anything starting with a PDF header as a single page document.
    struct FakeLibrary {
        page_size: (f32, f32),
    }

    impl FakeLibrary {
        fn check_header(pdf_bytes: &[u8]) -> AppResult<()> {
            if pdf_bytes.starts_with(FAKE_PDF_HEADER) {
                Ok(())
            } else {
                Err(AppError::DocumentError {
                    message: "Invalid PDF structure".to_string(),
                })
            }
        }
    }

    impl PdfRenderLibrary for FakeLibrary {
        fn render_page(
            &self,
            pdf_bytes: &[u8],
            page_number: u16,
            scale: f32,
        ) -> AppResult<RenderedPage> {
            Self::check_header(pdf_bytes)?;
            assert_eq!(page_number, FIRST_PAGE);
            let viewport = PdfViewport::for_page(self.page_size.0, self.page_size.1, scale);
            let mut surface = RgbaImage::from_pixel(
                viewport.width,
                viewport.height,
                Rgba([255, 255, 255, 255]),
            );
            if viewport.width > 0 && viewport.height > 0 {
                surface.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
            }
            Ok(RenderedPage {
                page_width: self.page_size.0,
                page_height: self.page_size.1,
                viewport,
                image: DynamicImage::ImageRgba8(surface),
            })
        }
    }

    struct FakeLoader {
        loads: AtomicUsize,
        page_size: (f32, f32),
        failure: Option<fn() -> AppError>,
    }

    impl FakeLoader {
        fn with_page_size(width: f32, height: f32) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                page_size: (width, height),
                failure: None,
            }
        }

        fn failing(failure: fn() -> AppError) -> Self {
            Self {
                failure: Some(failure),
                ..Self::with_page_size(10.0, 10.0)
            }
        }
    }

    impl RenderLibraryLoader for FakeLoader {
        type Library = FakeLibrary;

        async fn load(&self) -> AppResult<FakeLibrary> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            match self.failure {
                Some(failure) => Err(failure()),
                None => Ok(FakeLibrary {
                    page_size: self.page_size,
                }),
            }
        }
    }

    fn fake_pdf(name: &str) -> BinaryFile {
        BinaryFile::pdf(name, b"%PDF-1.7\n%fake document\n".to_vec())
    }

    #[tokio::test]
    async fn test_convert_first_page() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let library = RenderLibrary::new(FakeLoader::with_page_size(20.0, 15.5));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer.convert(&fake_pdf("report.PDF")).await;

        assert!(result.is_success());
        assert_eq!(result.error, None);
        assert!(ObjectUrlRegistry::is_object_url(&result.image_url));
        let file = result.file.ok_or("Expected an output file")?;
        assert_eq!(file.name, "report.png");
        assert_eq!(file.media_type, mime::IMAGE_PNG);

        let image = image::load_from_memory_with_format(&file.data, ImageFormat::Png)?;
        assert_eq!((image.width(), image.height()), (80, 62));

        let blob = object_urls
            .resolve(&ObjectUrl(result.image_url.clone()))
            .ok_or("Expected the object URL to resolve")?;
        assert_eq!(blob, file.data);
        Ok(())
    }

    #[tokio::test]
    async fn test_output_name_without_pdf_extension() {
        let library = RenderLibrary::new(FakeLoader::with_page_size(10.0, 10.0));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer.convert(&fake_pdf("notes.txt")).await;

        assert_eq!(
            result.file.map(|file| file.name),
            Some("notes.txt.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrent_conversions_load_library_once() {
        let library = RenderLibrary::new(FakeLoader::with_page_size(10.0, 10.0));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let first_file = fake_pdf("first.pdf");
        let second_file = fake_pdf("second.pdf");
        let (first, second) = tokio::join!(
            rasterizer.convert(&first_file),
            rasterizer.convert(&second_file)
        );

        assert!(first.is_success());
        assert!(second.is_success());
        assert_ne!(first.image_url, second.image_url);
        assert_eq!(library.loader().loads.load(Ordering::SeqCst), 1);
        assert_eq!(object_urls.len(), 2);
    }

    #[tokio::test]
    async fn test_non_pdf_bytes() {
        let library = RenderLibrary::new(FakeLoader::with_page_size(10.0, 10.0));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer
            .convert(&BinaryFile::pdf("broken.pdf", b"plain text".to_vec()))
            .await;

        assert!(!result.is_success());
        assert!(result.image_url.is_empty());
        assert!(result.file.is_none());
        let error = result.error.unwrap_or_default();
        assert!(error.starts_with("Failed to convert PDF:"));
        assert!(error.contains("Invalid PDF structure"));
        assert!(object_urls.is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_has_no_blob() {
        let library = RenderLibrary::new(FakeLoader::with_page_size(0.0, 0.0));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer.convert(&fake_pdf("empty.pdf")).await;

        assert_eq!(result.error.as_deref(), Some(BLOB_CREATION_ERROR));
        assert!(result.image_url.is_empty());
        assert!(result.file.is_none());
    }

    #[tokio::test]
    async fn test_library_load_failure() {
        let library = RenderLibrary::new(FakeLoader::failing(|| AppError::EnvironmentError {
            message: "PDF rendering can only be used in builds with the pdf-render feature."
                .to_string(),
        }));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer.convert(&fake_pdf("report.pdf")).await;

        assert!(result.image_url.is_empty());
        assert!(result.file.is_none());
        let error = result.error.unwrap_or_default();
        assert!(error.starts_with(CONVERSION_ERROR_PREFIX));
        assert!(error.contains("pdf-render feature"));
    }

    #[tokio::test]
    async fn test_reset_between_conversions() {
        let library = RenderLibrary::new(FakeLoader::with_page_size(10.0, 10.0));
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        assert!(rasterizer.convert(&fake_pdf("a.pdf")).await.is_success());
        library.reset();
        assert!(rasterizer.convert(&fake_pdf("b.pdf")).await.is_success());
        assert_eq!(library.loader().loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[cfg(not(feature = "pdf-render"))]
    async fn test_convert_without_render_support() {
        let library = RenderLibrary::new(PdfiumLibraryLoader::default());
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer.convert(&fake_pdf("report.pdf")).await;

        assert!(result.image_url.is_empty());
        assert!(result
            .error
            .unwrap_or_default()
            .contains("can only be used in builds with the pdf-render feature"));
    }

    #[tokio::test]
    #[cfg(feature = "pdf-render")]
    #[cfg_attr(not(feature = "ci-pdfium"), ignore)]
    async fn test_convert_with_pdfium() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let library = RenderLibrary::new(PdfiumLibraryLoader::new(PdfiumLoaderOptions::new()));
        let pdf_bytes = library
            .ensure_loaded()
            .await?
            .create_blank_document(&[(612.0, 792.0), (300.0, 300.0)])?;
        let object_urls = ObjectUrlRegistry::new();
        let rasterizer = PdfPageRasterizer::new(&library, &object_urls);

        let result = rasterizer
            .convert(&BinaryFile::pdf("letter.pdf", pdf_bytes))
            .await;

        assert_eq!(result.error, None);
        let file = result.file.ok_or("Expected an output file")?;
        assert_eq!(file.name, "letter.png");
        let image = image::load_from_memory_with_format(&file.data, ImageFormat::Png)?;
        assert_eq!((image.width(), image.height()), (2448, 3168));

        let result = rasterizer
            .convert(&BinaryFile::pdf("garbage.pdf", b"garbage".to_vec()))
            .await;
        assert!(result
            .error
            .unwrap_or_default()
            .starts_with("Failed to convert PDF:"));
        Ok(())
    }
}
