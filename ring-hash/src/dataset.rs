use std::path::PathBuf;

use thiserror::Error;

use crate::record::{Record, RecordError, FIELD_COUNT};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset file {path}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read row {line} of {path}")]
    Read {
        path: String,
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error("row {line} of {path} is malformed: {source}")]
    MalformedRow {
        path: String,
        line: usize,
        #[source]
        source: RecordError,
    },
}

/// Supplies the storm-event dataset for a given year. An external
/// collaborator per the core protocol's scope, but still part of a
/// complete, runnable implementation.
pub trait DatasetSource {
    fn load(&self, year: u16) -> Result<Vec<Record>, DatasetError>;
}

/// Reads `{root}/details-{year}.csv`, a 14-column CSV file whose header row
/// is skipped.
pub struct FileDatasetSource {
    root: PathBuf,
}

impl FileDatasetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, year: u16) -> PathBuf {
        self.root.join(format!("details-{year}.csv"))
    }
}

impl DatasetSource for FileDatasetSource {
    fn load(&self, year: u16) -> Result<Vec<Record>, DatasetError> {
        let path = self.path_for(year);
        let path_display = path.display().to_string();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(|source| DatasetError::Open {
                path: path_display.clone(),
                source,
            })?;

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let line = index + 2; // +1 for 1-indexing, +1 for the skipped header.
            let row = row.map_err(|source| DatasetError::Read {
                path: path_display.clone(),
                line,
                source,
            })?;

            let fields: Vec<String> = row.iter().map(str::to_string).collect();
            let record = Record::new(fields).map_err(|source| DatasetError::MalformedRow {
                path: path_display.clone(),
                line,
                source,
            })?;

            records.push(record);
        }

        Ok(records)
    }
}

/// An in-memory dataset, for tests that don't want to depend on fixture
/// files on disk.
pub struct InMemoryDatasetSource {
    records: Vec<Record>,
}

impl InMemoryDatasetSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl DatasetSource for InMemoryDatasetSource {
    fn load(&self, _year: u16) -> Result<Vec<Record>, DatasetError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_source_skips_header_and_parses_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details-1950.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "event_id,state,year,month,type,cz_type,cz_name,inj_d,inj_i,death_d,death_i,dmg_p,dmg_c,tor_f"
        )
        .unwrap();
        writeln!(
            file,
            "383097,GEORGIA,1950,January,Hail,C,AIKEN,0,0,0,0,10.00K,0.00K,EF0"
        )
        .unwrap();

        let source = FileDatasetSource::new(dir.path());
        let records = source.load(1950).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_id().unwrap(), 383_097);
    }

    #[test]
    fn file_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileDatasetSource::new(dir.path());

        let err = source.load(1999).unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
    }

    #[test]
    fn in_memory_source_returns_given_records() {
        let record = Record::new(vec![String::new(); FIELD_COUNT]).unwrap();
        let source = InMemoryDatasetSource::new(vec![record.clone()]);

        let loaded = source.load(1950).unwrap();
        assert_eq!(loaded, vec![record]);
    }
}
