//! Error types for newsdex.

use std::fmt;
use std::io;

/// Errors that can occur while building or querying a store.
#[derive(Debug)]
pub enum Error {
    /// Malformed command-line invocation.
    BadArgs(String),
    /// Filesystem I/O failure.
    Io(io::Error),
    /// Indexer was asked to write into a directory that already exists.
    StoreExists(String),
    /// Retriever could not find one of the required store artifacts.
    StoreIncomplete(String),
    /// A stored artifact failed to decompress, parse, or decode.
    Corrupt(String),
    /// A document id or DOCNO was not present in the store.
    NotFound(String),
    /// No query term was known to the lexicon.
    EmptyResult,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadArgs(msg) => write!(f, "bad arguments: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::StoreExists(path) => write!(f, "store already exists at {}", path),
            Error::StoreIncomplete(what) => write!(f, "store is missing {}", what),
            Error::Corrupt(what) => write!(f, "store artifact is corrupt: {}", what),
            Error::NotFound(what) => write!(f, "not found: {}", what),
            Error::EmptyResult => write!(f, "no query term was known to the lexicon"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Corrupt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
