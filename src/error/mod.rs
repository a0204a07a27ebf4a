//! This module defines the errors that can be returned by chring.
//!
//! None of them are transient: they either mean the caller misused the ring
//! (bad configuration, duplicate/unknown server) or that the topology is genuinely empty.

use std::fmt::Display;

use bytes::Bytes;
use serde::Serialize;

use crate::utils::serde_utf8_bytes;

pub type Result<T> = std::result::Result<T, Error>;

/// Error enum with all possible variants
#[derive(Debug, Serialize)]
pub enum Error {
    InvalidConfig {
        reason: String,
    },
    DuplicateServer {
        #[serde(with = "serde_utf8_bytes")]
        server: Bytes,
    },
    UnknownServer {
        #[serde(with = "serde_utf8_bytes")]
        server: Bytes,
    },
    /// The ring has no positions left, so nothing can own a key
    NoServerAvailable,
    Internal {
        reason: String,
    },
    Io {
        reason: String,
    },
}

impl Error {
    /// Returns true if this is an instance of a [`Error::NoServerAvailable`] variant
    pub fn is_no_server_available(&self) -> bool {
        matches!(self, Error::NoServerAvailable)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
