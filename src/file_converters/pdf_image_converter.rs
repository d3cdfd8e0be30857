use crate::errors::AppError;
use crate::file_converters::library::PdfiumLoaderOptions;
use crate::file_converters::pdf::{PdfRenderLibrary, PdfViewport, RenderedPage};
use crate::AppResult;
use bytes::Bytes;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

pub struct PdfiumRenderLibrary {
    pdfium: Pdfium,
}

impl PdfiumRenderLibrary {
    pub fn bind(options: &PdfiumLoaderOptions) -> AppResult<Self> {
        let executable = std::env::current_exe()?;
        let current_dir = executable
            .parent()
            .ok_or(AppError::SystemError {
                message: "No parent directory for executable".to_string(),
            })?
            .to_path_buf();

        let candidate_dirs: Vec<PathBuf> = vec![
            options.library_path.clone(),
            Some(PathBuf::from("./")),
            Some(PathBuf::from("./lib")),
            current_dir.parent().map(|p| p.join("lib")),
            Some(current_dir),
            dirs::home_dir().map(|p| p.join(".cache").join("pdfium")),
        ]
        .into_iter()
        .flatten()
        .collect();

        let bindings = candidate_dirs
            .iter()
            .find_map(|dir| {
                match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                    Ok(bindings) => {
                        debug!("Bound Pdfium library in {}", dir.display());
                        Some(bindings)
                    }
                    Err(err) => {
                        debug!("No usable Pdfium library in {}: {err}", dir.display());
                        None
                    }
                }
            })
            .map(Ok)
            .unwrap_or_else(Pdfium::bind_to_system_library)
            .map_err(|err| AppError::LibraryLoadError {
                message: format!("Unable to bind the Pdfium library: {err}"),
            })?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Builds a document of blank pages with the given sizes in points.
    pub fn create_blank_document(&self, page_sizes: &[(f32, f32)]) -> AppResult<Bytes> {
        let mut document = self.pdfium.create_new_pdf()?;
        for (width, height) in page_sizes.iter().rev() {
            document
                .pages_mut()
                .create_page_at_start(PdfPagePaperSize::from_points(
                    PdfPoints::new(*width),
                    PdfPoints::new(*height),
                ))?;
        }
        Ok(document.save_to_bytes()?.into())
    }

    fn open_document<'a>(&'a self, pdf_bytes: &'a [u8]) -> AppResult<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|err| AppError::DocumentError {
                message: format!("Unable to open PDF document: {err}"),
            })
    }
}

impl PdfRenderLibrary for PdfiumRenderLibrary {
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: u16,
        scale: f32,
    ) -> AppResult<RenderedPage> {
        let document = self.open_document(pdf_bytes)?;
        let page_index = page_number
            .checked_sub(1)
            .ok_or_else(|| AppError::DocumentError {
                message: "Page numbers start at 1".to_string(),
            })?;
        let page = document
            .pages()
            .get(page_index)
            .map_err(|err| AppError::DocumentError {
                message: format!("Page {page_number} is not available: {err}"),
            })?;

        let viewport = PdfViewport::for_page(page.width().value, page.height().value, scale);
        if viewport.width == 0 || viewport.height == 0 {
            return Ok(RenderedPage {
                page_width: page.width().value,
                page_height: page.height().value,
                viewport,
                image: image::DynamicImage::new_rgba8(viewport.width, viewport.height),
            });
        }
        let render_config = PdfRenderConfig::new()
            .set_target_size(viewport.width as i32, viewport.height as i32)
            .set_text_smoothing(true)
            .set_image_smoothing(true)
            .set_path_smoothing(true)
            .render_form_data(true);
        let image = page
            .render_with_config(&render_config)
            .map_err(|err| AppError::RenderError {
                message: format!("Unable to render page {page_number}: {err}"),
            })?
            .as_image();

        Ok(RenderedPage {
            page_width: page.width().value,
            page_height: page.height().value,
            viewport,
            image,
        })
    }
}

#[cfg(test)]
#[allow(unused_imports)]
mod tests {
    use super::*;
    use crate::file_converters::pdf::RENDER_SCALE;

    #[test]
    #[cfg_attr(not(feature = "ci-pdfium"), ignore)]
    fn test_render_first_page_at_scale() -> AppResult<()> {
        let library = PdfiumRenderLibrary::bind(&PdfiumLoaderOptions::new())?;
        let pdf_bytes = library.create_blank_document(&[(200.0, 100.0), (50.0, 50.0)])?;

        let rendered = library.render_page(&pdf_bytes, 1, RENDER_SCALE)?;
        assert_eq!(rendered.viewport.width, 800);
        assert_eq!(rendered.viewport.height, 400);
        assert_eq!(rendered.image.width(), 800);
        assert_eq!(rendered.image.height(), 400);
        Ok(())
    }

    #[test]
    #[cfg_attr(not(feature = "ci-pdfium"), ignore)]
    fn test_surface_matches_truncated_viewport() -> AppResult<()> {
        let library = PdfiumRenderLibrary::bind(&PdfiumLoaderOptions::new())?;
        let pdf_bytes = library.create_blank_document(&[(595.28, 841.89)])?;

        let rendered = library.render_page(&pdf_bytes, 1, RENDER_SCALE)?;
        assert_eq!(
            (rendered.image.width(), rendered.image.height()),
            (rendered.viewport.width, rendered.viewport.height)
        );
        assert_eq!(rendered.image.height(), 3367);
        Ok(())
    }

    #[test]
    #[cfg_attr(not(feature = "ci-pdfium"), ignore)]
    fn test_reject_invalid_documents() -> AppResult<()> {
        let library = PdfiumRenderLibrary::bind(&PdfiumLoaderOptions::new())?;
        let result = library.render_page(b"definitely not a pdf", 1, RENDER_SCALE);
        assert!(matches!(result, Err(AppError::DocumentError { .. })));

        let pdf_bytes = library.create_blank_document(&[(100.0, 100.0)])?;
        let result = library.render_page(&pdf_bytes, 2, RENDER_SCALE);
        assert!(matches!(result, Err(AppError::DocumentError { .. })));
        Ok(())
    }
}
