use bytes::Bytes;
use mime::Mime;
use rvstruct::ValueStruct;

#[derive(Debug, Clone, PartialEq, Eq, Hash, ValueStruct)]
pub struct ObjectUrl(pub String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        self.value().as_str()
    }
}

/// In-memory file: a name, a media type and the whole content.
#[derive(Debug, Clone)]
pub struct BinaryFile {
    pub name: String,
    pub media_type: Mime,
    pub data: Bytes,
}

impl BinaryFile {
    pub fn new<S: Into<String>, B: Into<Bytes>>(name: S, media_type: Mime, data: B) -> Self {
        Self {
            name: name.into(),
            media_type,
            data: data.into(),
        }
    }

    pub fn pdf<S: Into<String>, B: Into<Bytes>>(name: S, data: B) -> Self {
        Self::new(name, mime::APPLICATION_PDF, data)
    }

    pub fn png<S: Into<String>, B: Into<Bytes>>(name: S, data: B) -> Self {
        Self::new(name, mime::IMAGE_PNG, data)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Outcome of a single PDF to PNG conversion.
///
/// Either `image_url` and `file` are populated, or `error` is. Failed results
/// always carry an empty `image_url` and no `file`.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub image_url: String,
    pub file: Option<BinaryFile>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn success(image_url: ObjectUrl, file: BinaryFile) -> Self {
        Self {
            image_url: image_url.value().clone(),
            file: Some(file),
            error: None,
        }
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.file.is_some()
    }
}

/// `report.PDF` becomes `report.png`, `notes.txt` becomes `notes.txt.png`.
pub fn png_file_name(pdf_file_name: &str) -> String {
    let stem = pdf_file_name
        .len()
        .checked_sub(4)
        .and_then(|split_at| {
            pdf_file_name
                .get(split_at..)
                .filter(|ext| ext.eq_ignore_ascii_case(".pdf"))
                .and_then(|_| pdf_file_name.get(..split_at))
        })
        .unwrap_or(pdf_file_name);
    format!("{stem}.png")
}

#[cfg(test)]
#[allow(unused_imports)]
mod tests {
    use super::*;

    #[test]
    fn test_png_file_name() {
        assert_eq!(png_file_name("report.PDF"), "report.png");
        assert_eq!(png_file_name("report.pdf"), "report.png");
        assert_eq!(png_file_name("Report.Pdf"), "Report.png");
        assert_eq!(png_file_name("notes.txt"), "notes.txt.png");
        assert_eq!(png_file_name("archive.pdf.zip"), "archive.pdf.zip.png");
        assert_eq!(png_file_name("pdf"), "pdf.png");
        assert_eq!(png_file_name(".pdf"), ".png");
        assert_eq!(png_file_name(""), ".png");
        assert_eq!(png_file_name("résumé.pdf"), "résumé.png");
        assert_eq!(png_file_name("ü.txt"), "ü.txt.png");
    }

    #[test]
    fn test_conversion_result_invariants() {
        let failed = ConversionResult::failure("Failed to create image blob");
        assert!(!failed.is_success());
        assert!(failed.image_url.is_empty());
        assert!(failed.file.is_none());

        let succeeded = ConversionResult::success(
            ObjectUrl("blob:pdf2png/0".to_string()),
            BinaryFile::png("page.png", vec![1u8, 2, 3]),
        );
        assert!(succeeded.is_success());
        assert_eq!(succeeded.image_url, "blob:pdf2png/0");
        assert_eq!(
            succeeded.file.map(|file| file.media_type),
            Some(mime::IMAGE_PNG)
        );
    }
}
