//! Crate error type
//!
//! Every error in this crate is recovered locally: it is logged and the
//! caller falls back to the previous in-memory value or a static default.

use core::fmt;

use crate::store::StoreError;
use crate::traits::SourceError;

/// Errors raised by the engine components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Remote store or network endpoint not answering
    Unreachable,
    /// Requested document does not exist
    NotFound,
    /// Document could not be parsed into the expected shape
    MalformedDocument,
    /// Validation left no usable app ids
    EmptyOrInvalidSequence,
    /// A correction or default write was refused by the store
    WriteRejected,
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unreachable => Error::Unreachable,
            StoreError::NotFound => Error::NotFound,
            StoreError::WriteRejected => Error::WriteRejected,
        }
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Unreachable | SourceError::Status(_) => Error::Unreachable,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(_: serde_json::Error) -> Self {
        Error::MalformedDocument
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Unreachable => "remote endpoint unreachable",
            Error::NotFound => "document not found",
            Error::MalformedDocument => "malformed document",
            Error::EmptyOrInvalidSequence => "no valid app ids in sequence",
            Error::WriteRejected => "write rejected by remote store",
        };
        f.write_str(msg)
    }
}
