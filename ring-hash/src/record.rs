use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fields in one storm-event record, per the NWS `details-YYYY.csv`
/// layout: event id, state, year, month name, event type, cz type, cz name,
/// injuries direct/indirect, deaths direct/indirect, damage property/crops,
/// tor f scale.
pub const FIELD_COUNT: usize = 14;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record has {0} fields, expected {FIELD_COUNT}")]
    WrongFieldCount(usize),
    #[error("event id field is not a valid integer: {0:?}")]
    InvalidEventId(String),
}

/// A single storm-event record as provided by the CSV collaborator. Only
/// field 0 (the event id) is inspected by the hashing and lookup logic; the
/// rest are carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record(Vec<String>);

impl Record {
    pub fn new(fields: Vec<String>) -> Result<Self, RecordError> {
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::WrongFieldCount(fields.len()));
        }
        Ok(Self(fields))
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn field(&self, index: usize) -> &str {
        &self.0[index]
    }

    /// The event id, the sole field the hash and `find-event` lookup inspect.
    pub fn event_id(&self) -> Result<i64, RecordError> {
        self.0[0]
            .trim()
            .parse()
            .map_err(|_| RecordError::InvalidEventId(self.0[0].clone()))
    }
}
