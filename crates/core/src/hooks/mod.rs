//! Hook system
//!
//! Provides inline function detours for x86_64. The client's data handlers
//! are patched with an absolute jump to a replacement routine; the displaced
//! prologue instructions are relocated into an executable trampoline so the
//! replacement can still invoke the original.

mod detour;

pub use detour::{Detour, HookError};
