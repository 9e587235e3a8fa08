use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Could not open [{path}]: {source}")]
    Open {
        path: PathBuf,
        source: io::Error
    },
    #[error("Could not read the header of [{path}]: {source}")]
    Header {
        path: PathBuf,
        source: csv::Error
    }
}
