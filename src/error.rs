use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimerError {
    #[error("{0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for setting '{key}': '{value}'")]
    InvalidSetting { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, PrimerError>;
