use crate::common_types::BinaryFile;
use crate::errors::AppError;
use crate::file_systems::{FileSystemRef, ListFilesResult, RelativeFilePath};
use crate::file_tools::{FileMatcher, FileMatcherResult};
use crate::reporter::AppReporter;
use crate::AppResult;
use rvstruct::ValueStruct;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local file or directory used as a conversion source or destination.
///
/// Accepts plain paths and `file://` URLs. A trailing slash or an existing
/// directory makes the path a directory root; anything else names one file.
pub struct LocalFileSystem<'a> {
    root_path: PathBuf,
    is_dir: bool,
    reporter: &'a AppReporter<'a>,
}

impl<'a> LocalFileSystem<'a> {
    pub fn open(path: &str, reporter: &'a AppReporter<'a>) -> AppResult<Self> {
        let local_path = match path.strip_prefix("file://") {
            Some(local_path) => local_path,
            None if path.contains("://") => {
                return Err(AppError::UnknownFileSystem {
                    file_path: path.to_string(),
                })
            }
            None => path,
        };
        let root_path = PathBuf::from(local_path);
        let is_dir = local_path.ends_with('/') || root_path.is_dir();
        debug!(
            "Opened local {} {}",
            if is_dir { "directory" } else { "file" },
            root_path.display()
        );
        Ok(LocalFileSystem {
            root_path,
            is_dir,
            reporter,
        })
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Walks the directory tree, sorted by relative path.
    pub async fn list_files(&self, file_matcher: &FileMatcher) -> AppResult<ListFilesResult> {
        self.reporter
            .report(format!("Listing files in dir: {}", self.root_path.display()))?;

        let mut files = Vec::new();
        let mut skipped: usize = 0;
        let mut pending_dirs = vec![self.root_path.clone()];
        while let Some(dir_path) = pending_dirs.pop() {
            let mut entries = tokio::fs::read_dir(&dir_path).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let entry_path = entry.path();
                if file_type.is_dir() {
                    pending_dirs.push(entry_path);
                } else if file_type.is_file() {
                    let file_ref = FileSystemRef {
                        relative_path: self.relative_path(&entry_path)?,
                        media_type: mime_guess::from_path(&entry_path).first(),
                        file_size: Some(entry.metadata().await?.len()),
                    };
                    match file_matcher.matches(&file_ref) {
                        FileMatcherResult::Matched => files.push(file_ref),
                        _ => skipped += 1,
                    }
                }
            }
        }
        files.sort_by(|a, b| a.relative_path.value().cmp(b.relative_path.value()));
        Ok(ListFilesResult { files, skipped })
    }

    /// Reads a whole file. `None` reads the root itself when it names a file.
    pub async fn read_file(
        &self,
        relative_path: Option<&RelativeFilePath>,
    ) -> AppResult<(FileSystemRef, BinaryFile)> {
        let file_path = self.resolve(relative_path);
        let data = tokio::fs::read(&file_path).await?;
        let file_name = file_path
            .file_name()
            .ok_or_else(|| AppError::SystemError {
                message: format!("No file name in {}", file_path.display()),
            })?
            .to_string_lossy()
            .to_string();
        let media_type = mime_guess::from_path(&file_path).first();
        let file_ref = FileSystemRef {
            relative_path: relative_path
                .cloned()
                .unwrap_or_else(|| file_name.clone().into()),
            media_type: media_type.clone(),
            file_size: Some(data.len() as u64),
        };
        let file = BinaryFile::new(
            file_name,
            media_type.unwrap_or(mime::APPLICATION_OCTET_STREAM),
            data,
        );
        Ok((file_ref, file))
    }

    /// Writes `file`, creating missing parent directories. Returns the written path.
    pub async fn write_file(
        &self,
        file: &BinaryFile,
        relative_path: Option<&RelativeFilePath>,
    ) -> AppResult<PathBuf> {
        let file_path = self.resolve(relative_path);
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&file_path, &file.data).await?;
        Ok(file_path)
    }

    pub fn resolve(&self, relative_path: Option<&RelativeFilePath>) -> PathBuf {
        match relative_path {
            Some(relative_path) if self.is_dir => relative_path
                .value()
                .split('/')
                .fold(self.root_path.clone(), |path, part| path.join(part)),
            _ => self.root_path.clone(),
        }
    }

    fn relative_path(&self, path: &Path) -> AppResult<RelativeFilePath> {
        let relative = path
            .strip_prefix(&self.root_path)
            .map_err(|_| AppError::SystemError {
                message: format!(
                    "{} is outside of {}",
                    path.display(),
                    self.root_path.display()
                ),
            })?;
        Ok(relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
            .into())
    }
}
