//! Storage contracts for data that outlives a session.

use super::Result;

/// String-valued key/value slot store, the shape of a browser's local storage.
///
/// Each access reads or replaces the whole value atomically.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Supplies the player's current local calendar day.
pub trait DateSource: Send + Sync {
    fn today(&self) -> game_core::CalendarDate;
}
