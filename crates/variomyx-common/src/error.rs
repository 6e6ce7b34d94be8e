use thiserror::Error;

#[derive(Debug, Error)]
pub enum VariomyxError {
    #[error("Sample load error: {0}")]
    SampleLoad(String),

    #[error("Pedigree error: {0}")]
    Pedigree(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VariomyxError>;
