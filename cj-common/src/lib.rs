//! # cj-common
//!
//! Shared code for the ContactJournalists admin tooling:
//! - Error types
//! - Configuration loading (TOML file + environment lookup)
//! - Event types (CjEvent enum) and the EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
