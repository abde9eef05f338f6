//! Core definitions (errors and shared result type), relied upon by all weft-* crates.

pub mod error;
pub mod result;

pub use result::Result;
