use clap::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    #[command(about = "Render the first page of PDF files into PNG images")]
    Convert {
        #[arg(help = "Source PDF file or directory such as /tmp/report.pdf or /tmp/reports/")]
        source: String,
        #[arg(
            help = "Destination directory or PNG file such as /tmp/images/ or /tmp/report.png"
        )]
        destination: String,
        #[arg(short = 'm', long, help = "Maximum size of files to convert in bytes")]
        max_size_limit: Option<u64>,
        #[arg(
            short = 'f',
            long,
            help = "Filter by name using glob patterns such as *.pdf"
        )]
        filename_filter: Option<globset::Glob>,
        #[arg(
            long,
            help = "Directory holding the Pdfium dynamic library, tried before the default locations"
        )]
        pdfium_lib_path: Option<PathBuf>,
    },
}
