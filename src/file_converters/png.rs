use crate::errors::AppError;
use crate::AppResult;
use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;

/// Encodes a rendered surface as PNG.
///
/// Returns `None` when the surface holds no pixels and there is nothing to
/// encode.
pub fn encode_png(image: &DynamicImage) -> AppResult<Option<Bytes>> {
    if image.width() == 0 || image.height() == 0 {
        return Ok(None);
    }
    let mut output = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut output, CompressionType::Best, FilterType::Adaptive);
    image
        .to_rgba8()
        .write_with_encoder(encoder)
        .map_err(|err| AppError::EncodeError {
            message: format!("Unable to encode PNG: {err}"),
        })?;
    if output.is_empty() {
        Ok(None)
    } else {
        Ok(Some(output.into()))
    }
}
