//! # notekeep-core
//!
//! Core types, traits, and tag normalization for notekeep.
//!
//! This crate provides the data model, the error taxonomy, and the store
//! traits that the PostgreSQL layer implements and the services build on.

pub mod assemble;
pub mod error;
pub mod logging;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use assemble::attach_tags;
pub use error::{Error, Result};
pub use models::*;
pub use tags::{
    normalize_tag_name, normalize_tag_names, validate_color, validate_tag_name,
    MAX_TAG_NAME_LEN,
};
pub use traits::*;
