//! Account management module.
//!
//! Provides the account model, field validation, and the persisted store.

mod id;
mod model;
mod store;
pub mod validation;

pub use id::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use model::{Account, AccountId, AccountPatch, AccountType, Label, Validity};
pub use store::{AccountStore, derive, normalize_on_load};
pub use validation::{
    InvalidField, split_labels, validate_labels_input, validate_login, validate_password,
};
