use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    ParseInvalidSelector(String),

    #[error("Missing field `{field}` on page: {url}")]
    ExtractMissingField { field: &'static str, url: String },

    #[error("Column `{column}` not found in the header of {}", .path.display())]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("Couldn't parse tracking identifier `{0}`")]
    BadIdentifier(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
