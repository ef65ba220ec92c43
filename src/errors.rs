use std::{io, path::Path};

use thiserror::Error;

/// An unrecoverable error for a single fixture or manufacturer document.
///
/// Batch passes (register build, directory load) record these per file and
/// continue with the remaining fixtures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("structurally invalid JSON: {0}")]
    Schema(#[from] serde_json::Error),
    #[error("could not read file '{0}': {1}")]
    Read(Box<Path>, io::Error),
    #[error("could not read directory '{0}': {1}")]
    ReadDir(Box<Path>, io::Error),
    #[error("file name '{0}' is not a valid fixture key")]
    InvalidFileName(String),
    #[error("manufacturer '{0}' is not listed in the manufacturers document")]
    UnknownManufacturer(String),
}
