//! Fetch failure taxonomy.
//!
//! [`FetchError`] is what a [`Backend`](crate::backend::Backend) call returns;
//! [`ErrorKind`] is the compact form the view state keeps for rendering.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network unreachable, connection reset, or request timeout.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The body was not the JSON shape we expect.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::HttpStatus { status, .. } => ErrorKind::HttpStatus(*status),
            FetchError::Decode(_) => ErrorKind::Decode,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Last failure shown by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    HttpStatus(u16),
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => f.write_str("could not reach the news service"),
            ErrorKind::HttpStatus(status) => write!(f, "news service returned HTTP {}", status),
            ErrorKind::Decode => f.write_str("news service sent an unreadable response"),
        }
    }
}
