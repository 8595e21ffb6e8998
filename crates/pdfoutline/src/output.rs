use std::path::{Path, PathBuf};

use colored::Colorize;
use outline_core::{Level, Outline};

use crate::prelude::{println, *};

/// `<output_dir>/<input stem>.json`.
pub fn json_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(f!("{stem}.json"))
}

/// Write pretty JSON, creating parent directories as needed.
pub fn write_outline(outline: &Outline, path: &Path) -> Result<(), Error> {
    let write_error = |reason: String| Error::Write {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }
    let json = outline
        .to_json_pretty()
        .map_err(|e| write_error(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| write_error(e.to_string()))
}

fn level_cell(level: Level) -> String {
    match level {
        Level::H1 => level.to_string().bold().cyan().to_string(),
        Level::H2 => level.to_string().cyan().to_string(),
        Level::H3 => level.to_string().bright_black().to_string(),
    }
}

/// Human-readable rendering: title line, then one row per heading indented
/// by depth.
pub fn print_table(outline: &Outline) {
    println!("\n{} {}\n", "Title:".bold().cyan(), outline.title.bright_white());

    if let Some(error) = &outline.error {
        println!("{} {}", "Error:".bold().red(), error);
        return;
    }

    if outline.outline.is_empty() {
        println!("No headings found.");
        return;
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Level".bold().cyan(),
        "Page".bold().cyan(),
        "Heading".bold().cyan()
    ]);
    for entry in &outline.outline {
        let indent = "  ".repeat(usize::from(entry.level.depth() - 1));
        table.add_row(prettytable::row![
            level_cell(entry.level),
            entry.page.to_string().bright_yellow(),
            f!("{indent}{}", entry.text)
        ]);
    }
    table.printstd();
}
