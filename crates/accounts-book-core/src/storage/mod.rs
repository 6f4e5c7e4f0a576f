//! Key/value slots holding serialized state.
//!
//! Each key maps to one string value that is always read and written
//! whole. [`MemoryStorage`] keeps values in a map; [`FileStorage`] keeps
//! one file per key in a directory.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::Result;

/// A set of named slots, each holding a single string value.
pub trait Storage {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&mut self, key: &str) -> Result<()>;
}
