use std::path::PathBuf;

use crate::prelude::{println, *};

#[derive(Debug, Clone, clap::Args)]
pub struct StructureOptions {
    /// Path to the PDF file
    pub input: PathBuf,
}

pub async fn run(options: StructureOptions, _global: crate::Global) -> Result<()> {
    let path = options.input.clone();
    let doc = tokio::task::spawn_blocking(move || {
        pdf::open(&path).map(|pages| outline_core::structure::normalize(&pages))
    })
    .await?
    .wrap_err_with(|| f!("cannot read {}", options.input.display()))?;

    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
