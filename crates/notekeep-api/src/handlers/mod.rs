//! HTTP handlers, one module per resource.

pub mod health;
pub mod notes;
pub mod tags;
