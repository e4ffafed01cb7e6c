//! Shared infrastructure for HomeTrack modules
//!
//! Provides the common error type, configuration/root folder resolution,
//! and database initialization used by the catalog service.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
