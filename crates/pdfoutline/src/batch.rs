use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use outline_core::OutlineConfig;

use crate::prelude::{println, *};

#[derive(Debug, Clone, clap::Args)]
#[command(after_help = "EXAMPLES:
  # Process the container defaults (/app/input -> /app/output):
  pdfoutline batch

  # Process a local directory with four workers:
  pdfoutline batch --input-dir ./pdfs --output-dir ./out --jobs 4")]
pub struct BatchOptions {
    /// Directory scanned for *.pdf files (not recursive)
    #[arg(long, env = "PDFOUTLINE_INPUT_DIR", default_value = "/app/input")]
    pub input_dir: PathBuf,

    /// Directory receiving one <stem>.json per input
    #[arg(long, env = "PDFOUTLINE_OUTPUT_DIR", default_value = "/app/output")]
    pub output_dir: PathBuf,

    /// Documents processed concurrently (defaults to available parallelism)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: Vec<PathBuf>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed.len()
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}

/// PDF files directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::InputDirNotFound(dir.to_path_buf()));
    }

    let entries =
        std::fs::read_dir(dir).map_err(|_| Error::InputDirNotFound(dir.to_path_buf()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_pdf(path))
        .collect();
    files.sort();
    Ok(files)
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn progress_bar(len: usize, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

/// Process every PDF in `input_dir`, writing `<stem>.json` files into
/// `output_dir`.
///
/// A document that fails still gets its JSON written; only listing the
/// input or writing an output aborts the batch.
pub async fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    jobs: usize,
    config: Arc<OutlineConfig>,
    show_progress: bool,
) -> Result<BatchSummary> {
    let files = list_pdfs(input_dir)?;
    std::fs::create_dir_all(output_dir).map_err(|e| Error::Write {
        path: output_dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    log::info!(
        "processing {} PDF files from {} with {} workers",
        files.len(),
        input_dir.display(),
        jobs.max(1)
    );

    let bar = progress_bar(files.len(), show_progress)?;
    let mut results = futures::stream::iter(files.into_iter().map(|path| {
        let config = Arc::clone(&config);
        async move {
            let outline = crate::document::process_isolated(path.clone(), config).await;
            (path, outline)
        }
    }))
    .buffer_unordered(jobs.max(1));

    let mut summary = BatchSummary::default();
    while let Some((path, outline)) = results.next().await {
        let target = crate::output::json_path_for(&path, output_dir);
        crate::output::write_outline(&outline, &target)?;

        summary.processed += 1;
        if outline.is_error() {
            summary.failed.push(path.clone());
        }
        log::debug!("{} -> {}", path.display(), target.display());
        bar.set_message(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        bar.inc(1);
    }
    bar.finish_and_clear();

    summary.failed.sort();
    Ok(summary)
}

pub async fn run(options: BatchOptions, global: crate::Global) -> Result<()> {
    let config = Arc::new(crate::config::resolve(&global)?);
    let jobs = options.jobs.unwrap_or_else(default_jobs);

    let summary = run_batch(
        &options.input_dir,
        &options.output_dir,
        jobs,
        config,
        !global.verbose,
    )
    .await?;

    println!(
        "{} {} of {} documents -> {}",
        "Processed".green().bold(),
        summary.succeeded().to_string().bright_white(),
        summary.processed.to_string().bright_white(),
        options.output_dir.display()
    );
    for path in &summary.failed {
        println!("  {} {}", "failed:".red().bold(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_core::Outline;
    use tempfile::TempDir;

    use crate::document::fixtures;

    #[test]
    fn test_list_pdfs_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(dir.join("b.pdf"), b"").unwrap();
        std::fs::write(dir.join("A.PDF"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.join("folder.pdf")).unwrap();
        std::fs::create_dir(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/c.pdf"), b"").unwrap();

        let files = list_pdfs(dir).unwrap();
        assert_eq!(files, vec![dir.join("A.PDF"), dir.join("b.pdf")]);
    }

    #[test]
    fn test_list_pdfs_missing_dir() {
        let result = list_pdfs(Path::new("/nonexistent/input"));
        assert!(matches!(result, Err(Error::InputDirNotFound(_))));
    }

    #[tokio::test]
    async fn test_run_batch_writes_one_json_per_pdf() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let output_dir = output.path().join("results");
        std::fs::write(input.path().join("report.pdf"), fixtures::report_pdf()).unwrap();
        std::fs::write(input.path().join("broken.PDF"), b"not a pdf").unwrap();
        std::fs::write(input.path().join("notes.txt"), b"ignored").unwrap();

        let summary = run_batch(
            input.path(),
            &output_dir,
            2,
            Arc::new(OutlineConfig::default()),
            false,
        )
        .await
        .unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed, vec![input.path().join("broken.PDF")]);

        let report: Outline = serde_json::from_str(
            &std::fs::read_to_string(output_dir.join("report.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report.title, "Annual Report");
        assert_eq!(report.outline.len(), 2);

        let broken: Outline = serde_json::from_str(
            &std::fs::read_to_string(output_dir.join("broken.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(broken, Outline::unreadable("broken.PDF"));

        assert!(!output_dir.join("notes.json").exists());
    }

    #[tokio::test]
    async fn test_run_batch_empty_dir() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let summary = run_batch(
            input.path(),
            output.path(),
            0,
            Arc::new(OutlineConfig::default()),
            false,
        )
        .await
        .unwrap();
        assert_eq!(summary, BatchSummary::default());
    }

    #[tokio::test]
    async fn test_run_batch_missing_input_dir() {
        let output = TempDir::new().unwrap();
        let result = run_batch(
            Path::new("/nonexistent/input"),
            output.path(),
            1,
            Arc::new(OutlineConfig::default()),
            false,
        )
        .await;
        assert!(result.is_err());
    }
}
