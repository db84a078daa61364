//! Timer state for tracked machines
//!
//! One store per machine category maps a company to its fixed set of voyage
//! bays. Stores are owned exclusively by the category's manager; the UI only
//! ever sees snapshots built from them.

mod store;

use serde::{Deserialize, Serialize};

use purser_sdk::records::BAY_COUNT;

pub use store::{MachineTimers, StoreError};

/// A trackable machine category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineType {
    Submersible,
    Airship,
}

impl MachineType {
    /// Category title shown in the timer window.
    pub fn display_name(self) -> &'static str {
        match self {
            MachineType::Submersible => "Submersibles",
            MachineType::Airship => "Airships",
        }
    }

    /// Subdirectory holding this category's persisted timers.
    pub fn dir_name(self) -> &'static str {
        match self {
            MachineType::Submersible => "submersibles",
            MachineType::Airship => "airships",
        }
    }
}

/// One countdown's identity and expiry. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    /// Vessel name as reported by the client
    pub name: String,
    /// Voyage return time, Unix seconds
    pub date: u32,
    /// Category of the vessel
    pub machine_type: MachineType,
}

impl MachineInfo {
    pub fn new(name: impl Into<String>, date: u32, machine_type: MachineType) -> Self {
        Self {
            name: name.into(),
            date,
            machine_type,
        }
    }
}

/// The fixed voyage bays of one company for one category.
///
/// A bay with no active timer is `None`, never a stale entry.
pub type MachineSlots = [Option<MachineInfo>; BAY_COUNT];
