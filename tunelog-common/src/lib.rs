//! # Tunelog Common Library
//!
//! Shared code for the tunelog crates:
//! - Common error type
//! - Configuration loading (TOML + environment)
//! - Track identity (history join key)

pub mod config;
pub mod error;
pub mod track;

pub use error::{Error, Result};
pub use track::track_key;
