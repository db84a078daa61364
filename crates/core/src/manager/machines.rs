//! Machine timer managers (submersibles, airships)
//!
//! One manager per machine category. Construction resolves the category's
//! registration table of {name, pattern, handler} entries and installs a
//! disabled detour per resolved routine; a failed resolution leaves that
//! handle absent and the category inert until the signatures are updated
//! for a new client build.
//!
//! The detour replacements are free functions, so the manager publishes its
//! state into a per-category slot the replacements read. Extraction runs
//! strictly before the original handler is invoked, on whatever client
//! thread dispatched the call.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use purser_engine::{CompanySource, ModuleView};
use purser_sdk::records::{VoyageHandler, VOYAGE_BATCH_SIZE};
use purser_sdk::signatures;

use crate::cache::MachineCache;
use crate::config::ConfigFlags;
use crate::hooks::Detour;
use crate::records::{decode_batch, ExtractError};
use crate::signatures::resolve_signature;
use crate::timers::{MachineInfo, MachineTimers, MachineType};

use super::TimerTracker;

/// Which of the category's two hooked routines a replacement belongs to.
#[derive(Clone, Copy)]
enum HookKind {
    /// Voyage-result handler
    Timers,
    /// Status-list handler
    StatusList,
}

/// Lifecycle of a manager. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifeState {
    Disabled,
    Enabled,
    Disposed,
}

/// Shared state between a manager and its detour replacements.
struct MachineState {
    machine_type: MachineType,
    required_flags: ConfigFlags,
    company: Arc<dyn CompanySource>,
    store: Mutex<MachineTimers>,
    timers_hook: RwLock<Option<Detour<VoyageHandler>>>,
    status_hook: RwLock<Option<Detour<VoyageHandler>>>,
    life: Mutex<LifeState>,
}

/// Per-category slots the detour replacements resolve their state through.
static SUBMERSIBLE_STATE: RwLock<Option<Arc<MachineState>>> = RwLock::new(None);
static AIRSHIP_STATE: RwLock<Option<Arc<MachineState>>> = RwLock::new(None);

fn state_slot(machine_type: MachineType) -> &'static RwLock<Option<Arc<MachineState>>> {
    match machine_type {
        MachineType::Submersible => &SUBMERSIBLE_STATE,
        MachineType::Airship => &AIRSHIP_STATE,
    }
}

unsafe extern "C" fn submersible_timers_detour(agent: *mut c_void, data: *const c_void) {
    dispatch(&SUBMERSIBLE_STATE, HookKind::Timers, agent, data);
}

unsafe extern "C" fn submersible_status_detour(agent: *mut c_void, data: *const c_void) {
    dispatch(&SUBMERSIBLE_STATE, HookKind::StatusList, agent, data);
}

unsafe extern "C" fn airship_timers_detour(agent: *mut c_void, data: *const c_void) {
    dispatch(&AIRSHIP_STATE, HookKind::Timers, agent, data);
}

unsafe extern "C" fn airship_status_detour(agent: *mut c_void, data: *const c_void) {
    dispatch(&AIRSHIP_STATE, HookKind::StatusList, agent, data);
}

/// Replacement body shared by all four hooked routines.
///
/// Extraction runs first; the original routine is then invoked exactly
/// once, so the client's own processing continues with the store already
/// updated. On an unrecoverable read failure (or a panic, which must never
/// cross the detour boundary) the call is dropped instead.
unsafe fn dispatch(
    slot: &RwLock<Option<Arc<MachineState>>>,
    kind: HookKind,
    agent: *mut c_void,
    data: *const c_void,
) {
    let Some(state) = slot.read().clone() else {
        return;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| state.ingest_raw(data))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(
                "Dropping intercepted {} call after failed read: {}",
                state.machine_type.display_name(),
                e
            );
            return;
        }
        Err(_) => {
            tracing::error!(
                "Panic while extracting {} timers; dropping call",
                state.machine_type.display_name()
            );
            return;
        }
    }

    let hook = match kind {
        HookKind::Timers => &state.timers_hook,
        HookKind::StatusList => &state.status_hook,
    };
    if let Some(detour) = hook.read().as_ref() {
        let original = detour.original();
        original(agent, data);
    };
}

impl MachineState {
    /// Read and ingest an intercepted payload.
    ///
    /// # Safety
    /// `data` must be null or point to a full record batch.
    unsafe fn ingest_raw(&self, data: *const c_void) -> Result<(), ExtractError> {
        if data.is_null() {
            return Err(ExtractError::NullPayload);
        }
        let payload = std::slice::from_raw_parts(data as *const u8, VOYAGE_BATCH_SIZE);
        self.ingest(payload)
    }

    /// Merge one decoded batch into the store, persisting iff anything
    /// changed.
    ///
    /// The owner is resolved once per batch; a company change mid-batch is
    /// not re-checked. If the owner cannot be determined the whole batch is
    /// skipped and the store stays untouched.
    fn ingest(&self, payload: &[u8]) -> Result<(), ExtractError> {
        let records = decode_batch(payload)?;
        if records.is_empty() {
            return Ok(());
        }

        let Some(owner) = self.company.current() else {
            tracing::error!(
                "Could not log {}, unable to obtain company name",
                self.machine_type.display_name()
            );
            return Ok(());
        };

        let mut store = self.store.lock();
        let mut changes = false;
        for record in records {
            changes |= store.add_or_update(
                &owner,
                MachineInfo::new(record.name, record.date, self.machine_type),
                record.slot,
            );
        }

        if changes {
            if let Err(e) = store.save(&owner) {
                tracing::error!(
                    "Failed to save {} timers for {}: {}",
                    self.machine_type.display_name(),
                    owner,
                    e
                );
            }
        }
        Ok(())
    }

    fn hooks(&self) -> [&RwLock<Option<Detour<VoyageHandler>>>; 2] {
        [&self.timers_hook, &self.status_hook]
    }
}

/// Manager for one machine category.
pub struct MachineManager {
    state: Arc<MachineState>,
}

impl MachineManager {
    /// Resolve and install this category's hooks (disabled) and compute the
    /// initial state from `flags`.
    pub fn new(
        machine_type: MachineType,
        module: &ModuleView<'_>,
        company: Arc<dyn CompanySource>,
        data_dir: &Path,
        flags: ConfigFlags,
    ) -> Self {
        let required_flags = match machine_type {
            MachineType::Submersible => ConfigFlags::ENABLED | ConfigFlags::SUBMERSIBLES,
            MachineType::Airship => ConfigFlags::ENABLED | ConfigFlags::AIRSHIPS,
        };

        let state = Arc::new(MachineState {
            machine_type,
            required_flags,
            company,
            store: Mutex::new(MachineTimers::new(machine_type, data_dir)),
            timers_hook: RwLock::new(None),
            status_hook: RwLock::new(None),
            life: Mutex::new(LifeState::Disabled),
        });

        // Replacements resolve their state through the category slot, so it
        // must be published before any hook can fire.
        *state_slot(machine_type).write() = Some(Arc::clone(&state));

        // Explicit registration table, resolved and installed in order.
        let table: [(&str, &str, VoyageHandler); 2] = match machine_type {
            MachineType::Submersible => [
                (
                    "SubmersibleTimers",
                    signatures::SUBMERSIBLE_TIMERS,
                    submersible_timers_detour,
                ),
                (
                    "SubmersibleStatusList",
                    signatures::SUBMERSIBLE_STATUS_LIST,
                    submersible_status_detour,
                ),
            ],
            MachineType::Airship => [
                (
                    "AirshipTimers",
                    signatures::AIRSHIP_TIMERS,
                    airship_timers_detour,
                ),
                (
                    "AirshipStatusList",
                    signatures::AIRSHIP_STATUS_LIST,
                    airship_status_detour,
                ),
            ],
        };

        for ((name, pattern, replacement), slot) in table.into_iter().zip(state.hooks()) {
            match resolve_signature(module, name, pattern) {
                Ok(addr) => match unsafe { Detour::install(addr, replacement) } {
                    Ok(detour) => {
                        tracing::info!("Installed hook '{}' at {:#x}", name, addr);
                        *slot.write() = Some(detour);
                    }
                    Err(e) => {
                        tracing::error!("Failed to install hook '{}': {}", name, e);
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Could not resolve '{}' ({}); {} tracking stays inert",
                        name,
                        e,
                        machine_type.display_name()
                    );
                }
            }
        }

        let manager = Self { state };
        manager.set_state(flags);
        manager
    }

    fn enable(&self) {
        let mut life = self.state.life.lock();
        match *life {
            LifeState::Enabled | LifeState::Disposed => {}
            LifeState::Disabled => {
                for hook in self.state.hooks() {
                    if let Some(detour) = hook.read().as_ref() {
                        if let Err(e) = detour.enable() {
                            tracing::error!(
                                "Failed to enable {} hook: {}",
                                self.state.machine_type.display_name(),
                                e
                            );
                        }
                    }
                }
                // Resynchronize with anything persisted while hooks were off.
                let loaded = self.state.store.lock().reload();
                tracing::debug!(
                    "{} tracking enabled ({} companies loaded)",
                    self.state.machine_type.display_name(),
                    loaded
                );
                *life = LifeState::Enabled;
            }
        }
    }

    fn disable(&self) {
        let mut life = self.state.life.lock();
        match *life {
            LifeState::Disabled | LifeState::Disposed => {}
            LifeState::Enabled => {
                for hook in self.state.hooks() {
                    if let Some(detour) = hook.read().as_ref() {
                        if let Err(e) = detour.disable() {
                            tracing::error!(
                                "Failed to disable {} hook: {}",
                                self.state.machine_type.display_name(),
                                e
                            );
                        }
                    }
                }
                tracing::debug!(
                    "{} tracking disabled",
                    self.state.machine_type.display_name()
                );
                *life = LifeState::Disabled;
            }
        }
    }
}

impl TimerTracker for MachineManager {
    fn name(&self) -> &'static str {
        self.state.machine_type.display_name()
    }

    fn required_flags(&self) -> ConfigFlags {
        self.state.required_flags
    }

    fn is_enabled(&self) -> bool {
        *self.state.life.lock() == LifeState::Enabled
    }

    fn set_state(&self, flags: ConfigFlags) {
        if flags.check(self.state.required_flags) {
            self.enable();
        } else {
            self.disable();
        }
    }

    fn create_cache(&self) -> MachineCache {
        MachineCache::build(
            self.state.machine_type.display_name(),
            self.state.required_flags,
            &self.state.store.lock(),
        )
    }

    fn dispose(&self) {
        self.disable();

        let mut life = self.state.life.lock();
        if *life == LifeState::Disposed {
            return;
        }
        *life = LifeState::Disposed;
        drop(life);

        self.state.timers_hook.write().take();
        self.state.status_hook.write().take();

        let mut slot = state_slot(self.state.machine_type).write();
        if slot
            .as_ref()
            .map(|s| Arc::ptr_eq(s, &self.state))
            .unwrap_or(false)
        {
            *slot = None;
        }

        tracing::info!(
            "{} tracking disposed",
            self.state.machine_type.display_name()
        );
    }
}
