pub mod arbiter;
pub mod clock;
pub mod error;
pub mod hash;
pub mod ingest;
pub mod repository;

pub use arbiter::{ArbiterOutcome, ArbiterResult};
pub use clock::{Clock, SystemClock};
pub use error::CoreError;
pub use hash::canonical_hash;
pub use ingest::{IngestOutcome, IngestService};
pub use repository::Repository;
