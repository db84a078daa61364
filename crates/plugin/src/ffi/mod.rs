//! FFI boundary with the host's plugin loader

mod exports;

pub use exports::*;
