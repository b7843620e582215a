#![deny(missing_docs)]

//! Nexa SDK - Complete SDK.
//!
//! Re-exports all Nexa SDK components for convenient single-crate usage.

pub use nexa_primitives as primitives;
pub use nexa_script as script;
pub use nexa_transaction as transaction;

pub mod guard;
