//! The two-level hash binding storm-event records to ring positions, plus
//! the record model and CSV dataset loader that feed it.

mod dataset;
mod placement;
mod primes;
mod record;

pub use dataset::{DatasetError, DatasetSource, FileDatasetSource, InMemoryDatasetSource};
pub use placement::{place, table_size, Placement};
pub use primes::{is_prime, next_prime_greater_than};
pub use record::{Record, RecordError, FIELD_COUNT};
