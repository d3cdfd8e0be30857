pub mod library;
pub mod pdf;
#[cfg(feature = "pdf-render")]
pub mod pdf_image_converter;
pub mod png;
pub mod rasterizer;

pub use library::{
    PdfiumLibraryLoader, PdfiumLoaderOptions, PdfiumRenderLibrary, RenderLibrary,
    RenderLibraryLoader,
};
pub use pdf::{PdfRenderLibrary, PdfViewport, RenderedPage, FIRST_PAGE, RENDER_SCALE};
pub use rasterizer::{convert_pdf_to_image, PdfPageRasterizer};
