//! Implementations of the Cocoro Air API client contract.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{extract_by_path, HttpCocoroAirApi};

