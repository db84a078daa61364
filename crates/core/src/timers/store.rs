//! Per-category timer store with durable persistence
//!
//! Each company's slots round-trip through one JSON file per category.
//! Saves are change-gated by the caller: `add_or_update` reports whether the
//! slot actually changed, and the extraction handlers only call `save` when
//! at least one update in the batch did.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use purser_engine::CompanyId;
use purser_sdk::records::BAY_COUNT;

use super::{MachineInfo, MachineSlots, MachineType};

/// Errors surfaced by timer persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse timer file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// On-disk representation of one company's slots.
#[derive(Serialize, Deserialize)]
struct CompanyFile {
    company: CompanyId,
    slots: MachineSlots,
}

/// In-memory timer state for one machine category.
pub struct MachineTimers {
    machine_type: MachineType,
    dir: PathBuf,
    companies: HashMap<CompanyId, MachineSlots>,
}

impl MachineTimers {
    /// Create an empty store persisting under `data_dir`.
    ///
    /// Nothing is read from disk until [`MachineTimers::reload`] runs, which
    /// the owning manager triggers on every disabled-to-enabled transition.
    pub fn new(machine_type: MachineType, data_dir: &Path) -> Self {
        Self {
            machine_type,
            dir: data_dir.join(machine_type.dir_name()),
            companies: HashMap::new(),
        }
    }

    pub fn machine_type(&self) -> MachineType {
        self.machine_type
    }

    /// Insert or replace a slot's timer.
    ///
    /// Returns true iff the slot's value actually changed (by name or
    /// timestamp); this is the dirty flag gating persistence.
    pub fn add_or_update(&mut self, owner: &CompanyId, info: MachineInfo, slot: usize) -> bool {
        if slot >= BAY_COUNT {
            tracing::warn!(
                "Ignoring {} timer for out-of-range bay {}",
                self.machine_type.display_name(),
                slot
            );
            return false;
        }

        let slots = self.companies.entry(owner.clone()).or_default();
        if slots[slot].as_ref() == Some(&info) {
            return false;
        }

        slots[slot] = Some(info);
        true
    }

    /// Slots for one company, if any are tracked.
    pub fn get(&self, owner: &CompanyId) -> Option<&MachineSlots> {
        self.companies.get(owner)
    }

    /// All tracked companies and their slots.
    pub fn companies(&self) -> impl Iterator<Item = (&CompanyId, &MachineSlots)> {
        self.companies.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Durably persist one company's slots.
    ///
    /// Writes to a temp file and renames, so a crash never leaves a
    /// half-written timer file. A failed save leaves in-memory state
    /// correct; the next change-triggering call will attempt another save.
    pub fn save(&self, owner: &CompanyId) -> Result<(), StoreError> {
        let Some(slots) = self.companies.get(owner) else {
            return Ok(());
        };

        fs::create_dir_all(&self.dir)?;

        let path = self.company_path(owner);
        let tmp = path.with_extension("json.tmp");
        let file = CompanyFile {
            company: owner.clone(),
            slots: slots.clone(),
        };

        fs::write(&tmp, serde_json::to_vec_pretty(&file)?)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(
            "Saved {} timers for {} to {:?}",
            self.machine_type.display_name(),
            owner,
            path
        );
        Ok(())
    }

    /// Replace in-memory state with the persisted state.
    ///
    /// Corrupt files are logged and skipped; a missing directory is a fresh
    /// install and loads nothing. Returns the number of companies loaded.
    pub fn reload(&mut self) -> usize {
        self.companies.clear();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match Self::read_company_file(&path) {
                Ok(file) => {
                    self.companies.insert(file.company, file.slots);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable timer file {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!(
            "Reloaded {} timers for {} companies",
            self.machine_type.display_name(),
            self.companies.len()
        );
        self.companies.len()
    }

    fn read_company_file(path: &Path) -> Result<CompanyFile, StoreError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn company_path(&self, owner: &CompanyId) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", owner.world, sanitize(&owner.name)))
    }
}

/// Make a company name safe for use as a file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(name: &str) -> CompanyId {
        CompanyId {
            name: name.to_string(),
            world: 33,
        }
    }

    fn sub(name: &str, date: u32) -> MachineInfo {
        MachineInfo::new(name, date, MachineType::Submersible)
    }

    #[test]
    fn first_insert_reports_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        let owner = company("Coral Sea");

        assert!(store.add_or_update(&owner, sub("Alpha", 100), 0));
    }

    #[test]
    fn identical_update_reports_no_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        let owner = company("Coral Sea");

        assert!(store.add_or_update(&owner, sub("Alpha", 100), 0));
        assert!(!store.add_or_update(&owner, sub("Alpha", 100), 0));
        assert!(store.add_or_update(&owner, sub("Alpha", 101), 0), "new timestamp");
        assert!(store.add_or_update(&owner, sub("Beta", 101), 0), "new name");
    }

    #[test]
    fn last_write_wins_per_slot() {
        let dir = tempfile::tempdir().unwrap();
        let owner = company("Coral Sea");

        // Arbitrary sequence...
        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        store.add_or_update(&owner, sub("Alpha", 100), 0);
        store.add_or_update(&owner, sub("Beta", 200), 1);
        store.add_or_update(&owner, sub("Alpha II", 300), 0);
        store.add_or_update(&owner, sub("Beta", 250), 1);
        store.add_or_update(&owner, sub("Alpha III", 400), 0);

        // ...equals replaying only the last write per slot.
        let mut replay = MachineTimers::new(MachineType::Submersible, dir.path());
        replay.add_or_update(&owner, sub("Alpha III", 400), 0);
        replay.add_or_update(&owner, sub("Beta", 250), 1);

        assert_eq!(store.get(&owner), replay.get(&owner));
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        let owner = company("Coral Sea");

        assert!(!store.add_or_update(&owner, sub("Alpha", 100), BAY_COUNT));
        assert!(store.get(&owner).is_none());
    }

    #[test]
    fn save_then_reload_round_trips_slots() {
        let dir = tempfile::tempdir().unwrap();
        let owner = company("Coral Sea");
        let other = company("Mist Runners");

        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        store.add_or_update(&owner, sub("Alpha", 100), 0);
        store.add_or_update(&owner, sub("Gamma", 300), 2);
        store.add_or_update(&other, sub("Delta", 400), 3);
        store.save(&owner).unwrap();
        store.save(&other).unwrap();

        let mut fresh = MachineTimers::new(MachineType::Submersible, dir.path());
        assert_eq!(fresh.reload(), 2);

        let slots = fresh.get(&owner).unwrap();
        assert_eq!(slots[0], Some(sub("Alpha", 100)));
        assert_eq!(slots[1], None);
        assert_eq!(slots[2], Some(sub("Gamma", 300)));
        assert_eq!(slots[3], None);
        assert_eq!(fresh.get(&other).unwrap()[3], Some(sub("Delta", 400)));
    }

    #[test]
    fn reload_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let owner = company("Coral Sea");

        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        store.add_or_update(&owner, sub("Alpha", 100), 0);
        store.save(&owner).unwrap();

        let category_dir = dir.path().join(MachineType::Submersible.dir_name());
        fs::write(category_dir.join("99-Broken.json"), "not json").unwrap();

        let mut fresh = MachineTimers::new(MachineType::Submersible, dir.path());
        assert_eq!(fresh.reload(), 1);
        assert!(fresh.get(&owner).is_some());
    }

    #[test]
    fn reload_on_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MachineTimers::new(MachineType::Airship, dir.path());
        assert_eq!(store.reload(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn categories_persist_independently() {
        let dir = tempfile::tempdir().unwrap();
        let owner = company("Coral Sea");

        let mut subs = MachineTimers::new(MachineType::Submersible, dir.path());
        subs.add_or_update(&owner, sub("Alpha", 100), 0);
        subs.save(&owner).unwrap();

        let mut ships = MachineTimers::new(MachineType::Airship, dir.path());
        assert_eq!(ships.reload(), 0);
    }
}
