//! Core types for Cocoro Air.
//!
//! This crate holds the shared error type and the configuration layer.

pub mod config;
pub mod error;

pub use config::CocoroAirSettings;
pub use error::{Error, Result};
