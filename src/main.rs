use clap::Parser;
use console::{Style, Term};
use tracing_subscriber::EnvFilter;

use std::error::Error;

mod args;
use crate::commands::*;
use args::*;

mod commands;

use pdf2png::AppResult;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let term = Term::stdout();
    let bold_style = Style::new().bold();

    term.write_line(
        format!(
            "{} v{}",
            bold_style.clone().green().apply_to("pdf2png"),
            bold_style.apply_to(env!("CARGO_PKG_VERSION"))
        )
        .as_str(),
    )?;

    let cli = CliArgs::parse();
    if let Err(err) = handle_args(cli, &term).await {
        term.write_line(
            format!(
                "{}: {}\nDetails: {:?}",
                bold_style.clone().red().apply_to("Error"),
                err,
                err.source()
            )
            .as_str(),
        )?;
    }

    Ok(())
}

async fn handle_args(cli: CliArgs, term: &Term) -> AppResult<()> {
    let bold_style = Style::new().bold();

    match cli.command {
        CliCommand::Convert {
            source,
            destination,
            max_size_limit,
            filename_filter,
            pdfium_lib_path,
        } => {
            let options =
                ConvertCommandOptions::new(filename_filter, max_size_limit, pdfium_lib_path);
            let convert_result = command_convert(term, &source, &destination, options).await?;
            term.write_line(
                format!(
                    "{} -> {}\n{} files converted.\n{} files failed.\n{} files skipped.",
                    source,
                    destination,
                    bold_style
                        .clone()
                        .green()
                        .apply_to(convert_result.files_converted),
                    Style::new().red().apply_to(convert_result.files_failed),
                    Style::new().yellow().apply_to(convert_result.files_skipped),
                )
                .as_str(),
            )?;
        }
    }

    Ok(())
}
