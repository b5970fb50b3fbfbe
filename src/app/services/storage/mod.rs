//! Local persistence for the library index and sensor units
//!
//! Both collections are JSON documents under fixed keys in a
//! [`KeyValueStore`]. Every mutation is written through immediately. A
//! corrupt stored document is logged and replaced by an empty or default
//! value in memory; the stored text itself is left untouched until the next
//! mutation overwrites it.
//!
//! - [`store`] - Key/value backends (JSON files on disk, in-memory)
//! - [`library`] - Library index of dataset snapshots
//! - [`units`] - User-editable sensor units

pub mod library;
pub mod store;
pub mod units;

#[cfg(test)]
pub mod tests;

pub use library::{LibraryIndex, StorageStats};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use units::UnitSettings;
