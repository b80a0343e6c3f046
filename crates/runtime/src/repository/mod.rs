//! Repository layer for data that outlives a session.
//!
//! The only durable record is the daily play quota, kept in a key/value slot
//! so the backing store can be a directory, a browser's local storage, or
//! plain memory in tests.

mod error;
mod file;
mod memory;
mod quota;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use quota::{FixedDateSource, LocalDateSource, PersistentQuotaStore, QuotaRecord};
pub use traits::{DateSource, KeyValueStore};
