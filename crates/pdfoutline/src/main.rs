use crate::prelude::*;
use clap::Parser;

mod batch;
mod config;
mod document;
mod error;
mod file;
mod output;
mod prelude;
mod structure;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Infer a document title and H1/H2/H3 outline from PDF layout"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct Global {
    /// TOML file with outline settings
    #[clap(long, env = "PDFOUTLINE_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Blocks ending above this fraction of the page height are header candidates
    #[clap(long, env = "PDFOUTLINE_HEADER_THRESHOLD", global = true)]
    header_threshold: Option<f32>,

    /// Blocks starting below this fraction of the page height are footer candidates
    #[clap(long, env = "PDFOUTLINE_FOOTER_THRESHOLD", global = true)]
    footer_threshold: Option<f32>,

    /// Minimum score for a line to become a heading
    #[clap(long, env = "PDFOUTLINE_MIN_HEADING_SCORE", global = true)]
    min_heading_score: Option<f32>,

    /// Lines must be larger than baseline * ratio to get the size bonus
    #[clap(long, env = "PDFOUTLINE_FONT_SIZE_RATIO", global = true)]
    font_size_ratio: Option<f32>,

    /// Lines need more than this many words to count as body text
    #[clap(long, env = "PDFOUTLINE_MIN_BODY_TEXT_WORDS", global = true)]
    min_body_text_words: Option<usize>,

    /// Number of leading pages searched for the title
    #[clap(long, env = "PDFOUTLINE_TITLE_PAGE_LIMIT", global = true)]
    title_page_limit: Option<usize>,

    /// Whether to display additional information.
    #[clap(long, env = "PDFOUTLINE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract the outline of every PDF in a directory
    Batch(crate::batch::BatchOptions),

    /// Extract the outline of a single PDF
    File(crate::file::FileOptions),

    /// Print the normalized page/block/line structure of a PDF
    Structure(crate::structure::StructureOptions),
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();
    init_logging(app.global.verbose);

    match app.command {
        SubCommands::Batch(options) => crate::batch::run(options, app.global).await,
        SubCommands::File(options) => crate::file::run(options, app.global).await,
        SubCommands::Structure(options) => crate::structure::run(options, app.global).await,
    }
}
