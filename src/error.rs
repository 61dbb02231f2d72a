use thiserror::Error;

use esplora_shared::config::ConfigError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Sketch thread panicked")]
    SketchPanicked,
}
