use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Title and headings as a table
    Table,
}

#[derive(Debug, Clone, clap::Args)]
#[command(after_help = "EXAMPLES:
  # Print the outline as JSON:
  pdfoutline file report.pdf

  # Write the outline next to other results:
  pdfoutline file report.pdf -o out/report.json

  # Show a readable table and per-stage details:
  pdfoutline file report.pdf --format table --verbose")]
pub struct FileOptions {
    /// Path to the PDF file
    pub input: PathBuf,

    /// Write the JSON outline here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How to print the outline when no output file is given
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,
}

pub async fn run(options: FileOptions, global: crate::Global) -> Result<()> {
    let config = Arc::new(crate::config::resolve(&global)?);
    let outline = crate::document::process_isolated(options.input.clone(), config).await;

    if let Some(output) = &options.output {
        crate::output::write_outline(&outline, output)?;
        eprintln!(
            "{} {}",
            "Outline saved to".green().bold(),
            output.display()
        );
        return Ok(());
    }

    match options.format {
        OutputFormat::Json => println!("{}", outline.to_json_pretty()?),
        OutputFormat::Table => crate::output::print_table(&outline),
    }
    Ok(())
}
