//! Catalog core of the DESI DR1 viewer: loading, filtering, tracer
//! combination, wedge projection and emission-line statistics.

pub mod analysis;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod render;

pub use error::InputError;
