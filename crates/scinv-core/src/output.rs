use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::record::FlatRecord;
use crate::schema;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Header for `records`: every column observed on at least one record plus
/// the always-present columns, in canonical order.
pub fn header_for(records: &[FlatRecord]) -> Vec<&'static str> {
    let mut observed: HashSet<&'static str> = schema::always_present_columns().collect();
    for record in records {
        observed.extend(record.columns());
    }

    schema::canonical_columns()
        .into_iter()
        .filter(|column| observed.contains(column))
        .collect()
}

/// Writes `records` as CSV to `writer`, header first.
pub fn write_csv_to<W: Write>(records: &[FlatRecord], writer: W) -> Result<(), csv::Error> {
    let header = header_for(records);
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(&header)?;
    for record in records {
        csv_writer.write_record(header.iter().map(|column| record.get(column).unwrap_or("")))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes `records` to `destination`, creating missing parent directories.
pub fn write_csv(records: &[FlatRecord], destination: &Path) -> Result<(), OutputError> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(destination).map_err(|source| OutputError::Create {
        path: destination.to_path_buf(),
        source,
    })?;

    write_csv_to(records, BufWriter::new(file)).map_err(|source| OutputError::Csv {
        path: destination.to_path_buf(),
        source,
    })?;

    debug!(path = %destination.display(), rows = records.len(), "wrote CSV");
    Ok(())
}
