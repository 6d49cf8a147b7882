use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmgError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Recording error: {0}")]
    Recording(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EmgError>;
