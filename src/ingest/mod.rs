//! CSV loading of transaction collections.

mod errors;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use errors::IngestError;

/// Rows read from one file. Malformed rows are skipped and only counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub skipped: usize
}

pub fn read_transactions<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Ingested<T>, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source
    })?;

    let ingested = read_from(BufReader::new(file)).map_err(|source| IngestError::Header {
        path: path.to_path_buf(),
        source
    })?;

    debug!("Read [{}] rows from [{}], skipped [{}]", ingested.records.len(), path.display(), ingested.skipped);

    Ok(ingested)
}

/// Deserializes every row of a headed CSV stream.
pub fn read_from<T: DeserializeOwned, R: Read>(input: R) -> Result<Ingested<T>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    reader.headers()?;

    let mut ingested = Ingested { records: Vec::new(), skipped: 0 };

    for result in reader.deserialize::<T>() {
        match result {
            Ok(record) => ingested.records.push(record),
            Err(error) => {
                warn!("Skipping malformed row: {error}");
                ingested.skipped += 1;
            }
        }
    }

    Ok(ingested)
}
