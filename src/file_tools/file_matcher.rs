use crate::file_systems::FileSystemRef;
use mime::Mime;
use rvstruct::ValueStruct;

/// Selects the files a batch conversion picks up.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    pub filename_matcher: Option<globset::GlobMatcher>,
    pub max_size_limit: Option<u64>,
    /// Accepted media types; empty accepts everything.
    pub media_types: Vec<Mime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileMatcherResult {
    Matched,
    SkippedDueToSize,
    SkippedDueToName,
    SkippedDueToMediaType,
}

impl FileMatcher {
    pub fn new(
        filename_matcher: Option<globset::GlobMatcher>,
        max_size_limit: Option<u64>,
    ) -> Self {
        FileMatcher {
            filename_matcher,
            max_size_limit,
            media_types: Vec::new(),
        }
    }

    pub fn with_media_types(self, media_types: Vec<Mime>) -> Self {
        FileMatcher {
            media_types,
            ..self
        }
    }

    pub fn matches(&self, file_ref: &FileSystemRef) -> FileMatcherResult {
        if let (Some(max_size_limit), Some(file_size)) = (self.max_size_limit, file_ref.file_size) {
            if file_size > max_size_limit {
                return FileMatcherResult::SkippedDueToSize;
            }
        }

        if let Some(filename_matcher) = &self.filename_matcher {
            if !filename_matcher.is_match(file_ref.relative_path.value().as_str()) {
                return FileMatcherResult::SkippedDueToName;
            }
        }

        if !self.media_types.is_empty()
            && !file_ref
                .media_type
                .as_ref()
                .is_some_and(|media_type| self.media_types.contains(media_type))
        {
            return FileMatcherResult::SkippedDueToMediaType;
        }

        FileMatcherResult::Matched
    }
}
