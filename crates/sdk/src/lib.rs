//! Purser SDK - Game Client Layout Definitions
//!
//! This crate contains the raw memory layout of the game client structures
//! intercepted by the tracker. It has no dependencies and compiles quickly,
//! allowing parallel compilation of dependent crates.
//!
//! # Modules
//!
//! - [`records`] - Voyage record and company record byte layouts
//! - [`signatures`] - Byte-pattern signatures for hooked client routines

pub mod records;
pub mod signatures;

pub use records::*;
pub use signatures::VOYAGE_SIGNATURES;
