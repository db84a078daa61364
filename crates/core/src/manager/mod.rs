//! Timer manager family
//!
//! Every timer category implements [`TimerTracker`]: one uniform
//! enable/disable/cache-creation contract driven by configuration flags.
//! The [`TimerManager`] aggregate owns the closed set of trackers, fans
//! configuration changes out to them, and disposes them exactly once at
//! shutdown.

mod machines;

use std::path::Path;
use std::sync::Arc;

use purser_engine::{CompanySource, ModuleView};

use crate::cache::MachineCache;
use crate::config::ConfigFlags;
use crate::timers::MachineType;

pub use machines::MachineManager;

/// Uniform capability of one timer category.
///
/// Implementations own their hooks and stores exclusively; the aggregate
/// only ever drives them through this trait.
pub trait TimerTracker: Send + Sync {
    /// Display name of the category.
    fn name(&self) -> &'static str;

    /// Flags that must all be set for this category to track.
    fn required_flags(&self) -> ConfigFlags;

    /// Whether the category is currently intercepting.
    fn is_enabled(&self) -> bool;

    /// Re-derive enabled state from the current flags.
    ///
    /// Transitions are idempotent: a tracker already in the target state
    /// does nothing. Enabling reloads persisted state so memory matches
    /// whatever changed while hooks were off.
    fn set_state(&self, flags: ConfigFlags);

    /// Build a read-only snapshot for the timer window.
    fn create_cache(&self) -> MachineCache;

    /// Force-disable and permanently remove all hooks. Terminal; safe to
    /// call more than once.
    fn dispose(&self);
}

/// Aggregate owner of all timer categories.
pub struct TimerManager {
    trackers: Vec<Box<dyn TimerTracker>>,
    disposed: bool,
}

impl TimerManager {
    /// Construct every category manager and compute its initial state from
    /// `flags`.
    ///
    /// Signature resolution failures are logged per hook and leave the
    /// affected category inert; construction itself never fails.
    pub fn new(
        flags: ConfigFlags,
        module: &ModuleView<'_>,
        company: Arc<dyn CompanySource>,
        data_dir: &Path,
    ) -> Self {
        let trackers: Vec<Box<dyn TimerTracker>> = vec![
            Box::new(MachineManager::new(
                MachineType::Submersible,
                module,
                Arc::clone(&company),
                data_dir,
                flags,
            )),
            Box::new(MachineManager::new(
                MachineType::Airship,
                module,
                company,
                data_dir,
                flags,
            )),
        ];

        tracing::info!("Timer manager started with {} categories", trackers.len());
        Self {
            trackers,
            disposed: false,
        }
    }

    /// Broadcast a state re-evaluation to every tracker.
    ///
    /// Called whenever configuration changes; categories are disjoint, so
    /// each tracker decides independently.
    pub fn set_state(&self, flags: ConfigFlags) {
        for tracker in &self.trackers {
            tracker.set_state(flags);
        }
    }

    /// Build the full set of UI snapshots.
    pub fn create_caches(&self) -> Vec<MachineCache> {
        self.trackers.iter().map(|t| t.create_cache()).collect()
    }

    /// Dispose every tracker. Subsequent calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for tracker in &self.trackers {
            tracker.dispose();
        }
        self.disposed = true;
        tracing::info!("Timer manager disposed");
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purser_engine::CompanyId;

    struct NoCompany;

    impl CompanySource for NoCompany {
        fn current(&self) -> Option<CompanyId> {
            None
        }
    }

    fn empty_module() -> ModuleView<'static> {
        static EMPTY: [u8; 64] = [0u8; 64];
        ModuleView::from_slice(&EMPTY)
    }

    #[test]
    fn aggregate_owns_both_machine_categories() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TimerManager::new(
            ConfigFlags::empty(),
            &empty_module(),
            Arc::new(NoCompany),
            dir.path(),
        );

        let caches = manager.create_caches();
        let titles: Vec<_> = caches.iter().map(|c| c.title).collect();
        assert_eq!(titles, ["Submersibles", "Airships"]);
        assert!(caches.iter().all(|c| c.rows.is_empty()));
    }

    #[test]
    fn set_state_broadcasts_to_every_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TimerManager::new(
            ConfigFlags::empty(),
            &empty_module(),
            Arc::new(NoCompany),
            dir.path(),
        );
        assert!(manager.trackers.iter().all(|t| !t.is_enabled()));

        manager.set_state(ConfigFlags::ENABLED | ConfigFlags::SUBMERSIBLES | ConfigFlags::AIRSHIPS);
        assert!(manager.trackers.iter().all(|t| t.is_enabled()));

        // Only the airship flag remains: submersibles drop out.
        manager.set_state(ConfigFlags::ENABLED | ConfigFlags::AIRSHIPS);
        let enabled: Vec<_> = manager.trackers.iter().map(|t| t.is_enabled()).collect();
        assert_eq!(enabled, [false, true]);
    }

    #[test]
    fn dispose_twice_is_a_safe_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = TimerManager::new(
            ConfigFlags::ENABLED | ConfigFlags::SUBMERSIBLES,
            &empty_module(),
            Arc::new(NoCompany),
            dir.path(),
        );

        manager.dispose();
        manager.dispose();
        assert!(manager.trackers.iter().all(|t| !t.is_enabled()));

        // A disposed tracker ignores further state changes.
        manager.set_state(ConfigFlags::all());
        assert!(manager.trackers.iter().all(|t| !t.is_enabled()));
    }
}
