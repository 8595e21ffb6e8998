use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    #[error("Cannot read configuration file {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] outline_core::ConfigError),

    #[error("Cannot write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}
