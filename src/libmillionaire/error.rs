use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("progress log failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("cannot access question cache: {0}")]
    Io(#[from] io::Error),
    #[error("malformed question cache: {0}")]
    CacheFormat(#[from] serde_json::Error),
    #[error("cannot build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("input closed before an answer was given")]
    InputClosed,
    #[error("no questions available!")]
    NoQuestions,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
