//! Purser Plugin - FFI Layer
//!
//! This crate provides the FFI boundary between the host's plugin loader
//! and the Rust core logic. It compiles to a cdylib (.so/.dll).

pub mod ffi;
