//! # accounts-book-core
//!
//! Validated, persisted list of credential accounts.
//!
//! This crate provides:
//! - Account model (labels, type, login, password, validity flags)
//! - Field validation and label parsing
//! - An account store that derives and persists on every change
//! - Key/value storage backends (in-memory and file-based)
//!
//! ```no_run
//! use accounts_book_core::{AccountPatch, AccountStore, AccountType, StoreConfig};
//!
//! # fn main() -> accounts_book_core::Result<()> {
//! let mut store = AccountStore::open_with_config(&StoreConfig::default())?;
//! let id = store.add_empty()?;
//! let complete = store.validate_and_save(
//!     AccountPatch::new(&id)
//!         .with_type(AccountType::Ldap)
//!         .with_login("bob"),
//! )?;
//! assert_eq!(complete, Some(true));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
mod error;
pub mod storage;

pub use account::validation;
pub use account::{
    Account, AccountId, AccountPatch, AccountStore, AccountType, IdGenerator, InvalidField, Label,
    SequentialIdGenerator, UuidGenerator, Validity, derive, normalize_on_load,
};
pub use config::{DEFAULT_STORAGE_KEY, StoreConfig};
pub use error::{Error, Result};
pub use storage::{FileStorage, MemoryStorage, Storage};
