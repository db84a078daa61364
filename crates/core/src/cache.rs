//! Read-only UI snapshots
//!
//! The timer window never touches the stores directly: each category
//! manager builds a [`MachineCache`] on demand, and the window renders from
//! that. Rebuilding is cheap (a clone of at most a handful of companies),
//! so snapshots are not cached across frames.

use std::time::{SystemTime, UNIX_EPOCH};

use purser_engine::CompanyId;

use crate::config::ConfigFlags;
use crate::timers::{MachineSlots, MachineTimers};

/// One slot entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Vessel name
    pub name: String,
    /// Voyage return time, Unix seconds
    pub date: u32,
}

impl CacheEntry {
    /// Seconds until the voyage returns at `now`; negative once elapsed.
    pub fn remaining(&self, now: u32) -> i64 {
        i64::from(self.date) - i64::from(now)
    }

    /// Whether the voyage has returned at `now`.
    pub fn is_ready(&self, now: u32) -> bool {
        self.remaining(now) <= 0
    }
}

/// One company's row in a snapshot.
#[derive(Debug, Clone)]
pub struct CacheRow {
    pub company: CompanyId,
    pub entries: Vec<Option<CacheEntry>>,
}

/// Read-only snapshot of one category for the timer window.
///
/// The window uses `required_flags` to hide categories the user disabled
/// without having to know about managers.
#[derive(Debug, Clone)]
pub struct MachineCache {
    /// Category title, e.g. "Submersibles"
    pub title: &'static str,
    /// Flags that must be set for this category to be shown
    pub required_flags: ConfigFlags,
    /// Current owner-to-slots state
    pub rows: Vec<CacheRow>,
}

impl MachineCache {
    /// Build a snapshot from a store. Does not mutate the store.
    pub fn build(
        title: &'static str,
        required_flags: ConfigFlags,
        store: &MachineTimers,
    ) -> Self {
        let mut rows: Vec<CacheRow> = store
            .companies()
            .map(|(company, slots)| CacheRow {
                company: company.clone(),
                entries: slot_entries(slots),
            })
            .collect();
        rows.sort_by(|a, b| (a.company.world, &a.company.name).cmp(&(b.company.world, &b.company.name)));

        Self {
            title,
            required_flags,
            rows,
        }
    }
}

fn slot_entries(slots: &MachineSlots) -> Vec<Option<CacheEntry>> {
    slots
        .iter()
        .map(|slot| {
            slot.as_ref().map(|info| CacheEntry {
                name: info.name.clone(),
                date: info.date,
            })
        })
        .collect()
}

/// Current Unix time in seconds, saturating at u32 range like the client.
pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().min(u64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::{MachineInfo, MachineType};

    #[test]
    fn remaining_is_signed() {
        let entry = CacheEntry {
            name: "Alpha".to_string(),
            date: 1_000,
        };
        assert_eq!(entry.remaining(400), 600);
        assert_eq!(entry.remaining(1_500), -500);
        assert!(!entry.is_ready(400));
        assert!(entry.is_ready(1_000));
    }

    #[test]
    fn build_preserves_slot_positions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MachineTimers::new(MachineType::Airship, dir.path());
        let owner = CompanyId {
            name: "Coral Sea".to_string(),
            world: 33,
        };
        store.add_or_update(
            &owner,
            MachineInfo::new("Cloudhopper", 500, MachineType::Airship),
            2,
        );

        let cache = MachineCache::build("Airships", ConfigFlags::ENABLED, &store);
        assert_eq!(cache.rows.len(), 1);
        let entries = &cache.rows[0].entries;
        assert!(entries[0].is_none());
        assert_eq!(entries[2].as_ref().unwrap().name, "Cloudhopper");
    }

    #[test]
    fn rows_are_sorted_for_stable_display() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MachineTimers::new(MachineType::Submersible, dir.path());
        for (name, world) in [("Zeta", 40u16), ("Alpha", 40), ("Mid", 20)] {
            let owner = CompanyId {
                name: name.to_string(),
                world,
            };
            store.add_or_update(
                &owner,
                MachineInfo::new("Boat", 1, MachineType::Submersible),
                0,
            );
        }

        let cache = MachineCache::build("Submersibles", ConfigFlags::ENABLED, &store);
        let names: Vec<_> = cache.rows.iter().map(|r| r.company.name.as_str()).collect();
        assert_eq!(names, ["Mid", "Alpha", "Zeta"]);
    }
}
