use console::{Style, Term};
use indicatif::*;
use pdf2png::errors::AppError;
use pdf2png::file_converters::{
    PdfPageRasterizer, PdfiumLibraryLoader, PdfiumLoaderOptions, RenderLibrary,
    RenderLibraryLoader,
};
use pdf2png::file_systems::{FileSystemRef, LocalFileSystem};
use pdf2png::file_tools::{FileMatcher, FileMatcherResult};
use pdf2png::reporter::AppReporter;
use pdf2png::{AppResult, ObjectUrl, ObjectUrlRegistry};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct ConvertCommandResult {
    pub files_converted: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ConvertCommandOptions {
    pub file_matcher: FileMatcher,
    pub loader_options: PdfiumLoaderOptions,
}

impl ConvertCommandOptions {
    pub fn new(
        filename_filter: Option<globset::Glob>,
        max_size_limit: Option<u64>,
        pdfium_lib_path: Option<PathBuf>,
    ) -> Self {
        let filename_matcher = filename_filter
            .as_ref()
            .map(|filter| filter.compile_matcher());
        ConvertCommandOptions {
            file_matcher: FileMatcher::new(filename_matcher, max_size_limit)
                .with_media_types(vec![mime::APPLICATION_PDF]),
            loader_options: PdfiumLoaderOptions::new().opt_library_path(pdfium_lib_path),
        }
    }
}

pub async fn command_convert(
    term: &Term,
    source: &str,
    destination: &str,
    options: ConvertCommandOptions,
) -> AppResult<ConvertCommandResult> {
    let bold_style = Style::new().bold();
    term.write_line(
        format!(
            "Converting first pages from {} to {}.",
            bold_style.clone().white().apply_to(source),
            bold_style.clone().yellow().apply_to(destination),
        )
        .as_str(),
    )?;
    let library = RenderLibrary::new(PdfiumLibraryLoader::new(options.loader_options.clone()));
    let object_urls = ObjectUrlRegistry::new();
    let rasterizer = PdfPageRasterizer::new(&library, &object_urls);
    convert_files(source, destination, &options.file_matcher, &rasterizer).await
}

pub async fn convert_files<L: RenderLibraryLoader>(
    source: &str,
    destination: &str,
    file_matcher: &FileMatcher,
    rasterizer: &PdfPageRasterizer<'_, L>,
) -> AppResult<ConvertCommandResult> {
    let bold_style = Style::new().bold();
    let bar = ProgressBar::new(1);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files ({eta})",
        )?
        .progress_chars("◉>◯"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    let app_reporter = AppReporter::from(&bar);

    let source_fs = LocalFileSystem::open(source, &app_reporter)?;
    let destination_fs = LocalFileSystem::open(destination, &app_reporter)?;

    let mut result = ConvertCommandResult {
        files_converted: 0,
        files_failed: 0,
        files_skipped: 0,
    };
    let source_files: Vec<Option<FileSystemRef>> = if source_fs.is_dir() {
        if !destination_fs.is_dir() {
            return Err(AppError::DestinationDoesNotSupportMultipleFiles {
                destination: destination.to_string(),
            });
        }
        let source_files_result = source_fs.list_files(file_matcher).await?;
        bar.println(
            format!(
                "Found {} PDF files.",
                bold_style.apply_to(source_files_result.files.len())
            )
            .as_str(),
        );
        result.files_skipped = source_files_result.skipped;
        source_files_result.files.into_iter().map(Some).collect()
    } else {
        vec![None]
    };
    bar.set_length(source_files.len() as u64);

    for source_file in source_files {
        match convert_file(
            source_file.as_ref(),
            &bar,
            &source_fs,
            &destination_fs,
            file_matcher,
            rasterizer,
        )
        .await
        {
            ConvertFileResult::Converted => result.files_converted += 1,
            ConvertFileResult::Failed => result.files_failed += 1,
            ConvertFileResult::Skipped => result.files_skipped += 1,
        }
    }

    bar.finish_and_clear();
    Ok(result)
}

enum ConvertFileResult {
    Converted,
    Failed,
    Skipped,
}

/// Converts one file. Failures are reported above the progress bar and
/// counted; they never stop the batch.
async fn convert_file<L: RenderLibraryLoader>(
    source_file_ref: Option<&FileSystemRef>,
    bar: &ProgressBar,
    source_fs: &LocalFileSystem<'_>,
    destination_fs: &LocalFileSystem<'_>,
    file_matcher: &FileMatcher,
    rasterizer: &PdfPageRasterizer<'_, L>,
) -> ConvertFileResult {
    let bold_style = Style::new().bold().white();
    let source_relative_path = source_file_ref.map(|file_ref| &file_ref.relative_path);
    let source_path = source_fs.resolve(source_relative_path);
    bar.inc(1);

    let (base_file_ref, source_file) = match source_fs.read_file(source_relative_path).await {
        Ok(read) => read,
        Err(err) => {
            report_failure(bar, &source_path, err);
            return ConvertFileResult::Failed;
        }
    };

    // A single source file was named explicitly, so only the size limit applies to it.
    if source_file_ref.is_none()
        && file_matcher.max_size_limit.is_some()
        && FileMatcher::new(None, file_matcher.max_size_limit).matches(&base_file_ref)
            == FileMatcherResult::SkippedDueToSize
    {
        bar.println(format!(
            "Skipping {} due to its size",
            bold_style.apply_to(source_path.display())
        ));
        return ConvertFileResult::Skipped;
    }

    let conversion = rasterizer.convert(&source_file).await;
    let image_file = match (conversion.file, conversion.error) {
        (Some(image_file), None) => image_file,
        (_, error) => {
            report_failure(bar, &source_path, error.unwrap_or_default());
            return ConvertFileResult::Failed;
        }
    };

    let dest_relative_path = base_file_ref.relative_path.with_filename(&image_file.name);
    let written = destination_fs
        .write_file(&image_file, Some(&dest_relative_path))
        .await;
    rasterizer
        .object_urls()
        .revoke_object_url(&ObjectUrl(conversion.image_url));
    match written {
        Ok(dest_path) => {
            bar.println(
                format!(
                    "Converted {} to {}. Size: {}",
                    bold_style.apply_to(source_path.display()),
                    bold_style.apply_to(dest_path.display()),
                    bold_style.apply_to(HumanBytes(image_file.size() as u64))
                )
                .as_str(),
            );
            ConvertFileResult::Converted
        }
        Err(err) => {
            report_failure(bar, &source_path, err);
            ConvertFileResult::Failed
        }
    }
}

fn report_failure<E: Display>(bar: &ProgressBar, source_path: &Path, reason: E) {
    let bold_style = Style::new().bold().white();
    bar.println(
        format!(
            "{}. Skipping {} due to: {}",
            bold_style.clone().red().apply_to("Error converting"),
            bold_style.apply_to(source_path.display()),
            reason
        )
        .as_str(),
    );
}
