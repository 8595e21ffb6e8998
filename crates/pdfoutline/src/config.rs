use std::path::Path;

use outline_core::OutlineConfig;

use crate::prelude::*;

/// Read a TOML settings file on top of the defaults.
pub fn load_file(path: &Path) -> Result<OutlineConfig, Error> {
    let input = std::fs::read_to_string(path).map_err(|e| Error::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    OutlineConfig::from_toml_str(&input).map_err(|e| Error::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Layer defaults, the optional settings file, and per-flag overrides, then
/// validate the result.
pub fn resolve(global: &crate::Global) -> Result<OutlineConfig, Error> {
    let mut config = match &global.config {
        Some(path) => load_file(path)?,
        None => OutlineConfig::default(),
    };

    if let Some(v) = global.header_threshold {
        config.header_threshold = v;
    }
    if let Some(v) = global.footer_threshold {
        config.footer_threshold = v;
    }
    if let Some(v) = global.min_heading_score {
        config.min_heading_score = v;
    }
    if let Some(v) = global.font_size_ratio {
        config.font_size_ratio = v;
    }
    if let Some(v) = global.min_body_text_words {
        config.min_body_text_words = v;
    }
    if let Some(v) = global.title_page_limit {
        config.title_page_limit = v;
    }

    config.validate()?;
    log::debug!("config: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Global;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_defaults() {
        let config = resolve(&Global::default()).unwrap();
        assert_eq!(config, OutlineConfig::default());
    }

    #[test]
    fn test_resolve_file_then_flags() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outline.toml");
        std::fs::write(&path, "min_heading_score = 5.0\ntitle_page_limit = 3\n").unwrap();

        let global = Global {
            config: Some(path),
            title_page_limit: Some(1),
            ..Default::default()
        };
        let config = resolve(&global).unwrap();
        assert_eq!(config.min_heading_score, 5.0);
        assert_eq!(config.title_page_limit, 1);
        assert_eq!(config.footer_threshold, 0.85);
    }

    #[test]
    fn test_resolve_missing_file() {
        let global = Global {
            config: Some("/nonexistent/outline.toml".into()),
            ..Default::default()
        };
        assert!(matches!(resolve(&global), Err(Error::ConfigFile { .. })));
    }

    #[test]
    fn test_resolve_bad_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outline.toml");
        std::fs::write(&path, "min_heading_score = [").unwrap();

        let global = Global {
            config: Some(path),
            ..Default::default()
        };
        assert!(matches!(resolve(&global), Err(Error::ConfigFile { .. })));
    }

    #[test]
    fn test_resolve_rejects_invalid_overrides() {
        let global = Global {
            header_threshold: Some(0.9),
            ..Default::default()
        };
        assert!(matches!(resolve(&global), Err(Error::Config(_))));
    }
}
