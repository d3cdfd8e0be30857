use mime::Mime;
use rvstruct::ValueStruct;

mod local;

pub use local::LocalFileSystem;

/// Path below a listed directory, always `/`-separated.
#[derive(Debug, Clone, ValueStruct)]
pub struct RelativeFilePath(pub String);

impl RelativeFilePath {
    /// Same directory, file name replaced.
    pub fn with_filename(&self, filename: &str) -> RelativeFilePath {
        match self.value().rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{filename}").into(),
            None => filename.to_string().into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileSystemRef {
    pub relative_path: RelativeFilePath,
    pub media_type: Option<Mime>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ListFilesResult {
    pub files: Vec<FileSystemRef>,
    pub skipped: usize,
}
