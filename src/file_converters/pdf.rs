use crate::AppResult;

/// Pages are rendered at four times their native size.
pub const RENDER_SCALE: f32 = 4.0;

/// Page numbers are 1-based; only the first one is ever rendered.
pub const FIRST_PAGE: u16 = 1;

/// Output pixel region of a page rendered at `scale`. Fractional pixels are
/// dropped, so the surface never extends past the scaled page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfViewport {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl PdfViewport {
    pub fn for_page(page_width: f32, page_height: f32, scale: f32) -> Self {
        Self {
            width: (page_width * scale).max(0.0) as u32,
            height: (page_height * scale).max(0.0) as u32,
            scale,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Native page size in PDF points.
    pub page_width: f32,
    pub page_height: f32,
    pub viewport: PdfViewport,
    pub image: image::DynamicImage,
}

/// A loaded PDF rendering library.
///
/// Opening the document, fetching the page and rendering it happen in one
/// call because the library's document and page handles borrow from each
/// other. Implementations are blocking.
pub trait PdfRenderLibrary: Send + Sync + 'static {
    fn render_page(&self, pdf_bytes: &[u8], page_number: u16, scale: f32)
        -> AppResult<RenderedPage>;
}

#[cfg(test)]
#[allow(unused_imports)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_scales_page_size() {
        let letter = PdfViewport::for_page(612.0, 792.0, RENDER_SCALE);
        assert_eq!(letter.width, 2448);
        assert_eq!(letter.height, 3168);

        let a4 = PdfViewport::for_page(595.28, 841.89, RENDER_SCALE);
        assert_eq!(a4.width, 2381);
        assert_eq!(a4.height, 3367);
        assert_eq!(a4.scale, 4.0);
    }

    #[test]
    fn test_viewport_drops_fractional_pixels() {
        let viewport = PdfViewport::for_page(10.9, 0.2, 1.0);
        assert_eq!((viewport.width, viewport.height), (10, 0));

        let viewport = PdfViewport::for_page(100.24, 50.26, RENDER_SCALE);
        assert_eq!((viewport.width, viewport.height), (400, 201));
    }

    #[test]
    fn test_viewport_of_empty_page() {
        let viewport = PdfViewport::for_page(0.0, 0.0, RENDER_SCALE);
        assert_eq!(viewport.width, 0);
        assert_eq!(viewport.height, 0);
    }
}
