use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphDlError {
    #[error("Connection failed: {0}")]
    ConnectivityError(#[from] reqwest::Error),

    #[error("Login rejected with HTTP status {status}")]
    AuthenticationError { status: StatusCode },

    #[error("Unexpected API response: {0}")]
    ApiError(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}
