//! Purser - Voyage Timer Tracking
//!
//! This crate contains the timer-management subsystem: signature resolution
//! over the host client's code, inline detours on the client's voyage data
//! handlers, per-category timer stores with durable persistence, and the
//! manager family that ties hooks, stores and configuration flags together.
//!
//! # Re-exports
//!
//! This crate re-exports the SDK and engine crates for convenience:
//! - [`sdk`] - Raw client memory layouts and routine signatures
//! - [`engine`] - Host module discovery and company identity access

// Re-export SDK and engine crates
pub use purser_engine as engine;
pub use purser_sdk as sdk;

pub mod cache;
pub mod config;
pub mod hooks;
pub mod manager;
pub mod records;
pub mod signatures;
pub mod timers;

// Re-export commonly used items
pub use cache::{CacheEntry, CacheRow, MachineCache};
pub use config::{ConfigError, ConfigFlags, PurserConfig};
pub use hooks::{Detour, HookError};
pub use manager::{MachineManager, TimerManager, TimerTracker};
pub use records::{decode_batch, ExtractError, VoyageRecord};
pub use signatures::{resolve_signature, SignatureError};
pub use timers::{MachineInfo, MachineSlots, MachineTimers, MachineType, StoreError};
