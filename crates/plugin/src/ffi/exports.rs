//! C-compatible exports called by the host's plugin loader

use std::ffi::{c_char, CStr};
use std::sync::Arc;

use parking_lot::Mutex;

use purser_core::cache::unix_now;
use purser_core::config::{data_dir, ConfigFlags, PurserConfig};
use purser_core::manager::TimerManager;
use purser_core::signatures::resolve_signature;
use purser_engine::{host_module, ClientCompanySource, CompanyId, CompanySource};
use purser_sdk::signatures::COMPANY_INFO;

// Plugin metadata - static strings with null terminators for C compatibility
static NAME: &[u8] = b"Purser\0";
static DESCRIPTION: &[u8] = b"Voyage timer tracker\0";
static VERSION: &[u8] = b"0.1.0\0";

/// Live plugin state, constructed on load and torn down on unload.
struct Plugin {
    config: PurserConfig,
    manager: TimerManager,
}

static PLUGIN: Mutex<Option<Plugin>> = Mutex::new(None);

/// Company source used when the info accessor could not be resolved:
/// every lookup fails, so extraction handlers skip their batches.
struct UnresolvedCompany;

impl CompanySource for UnresolvedCompany {
    fn current(&self) -> Option<CompanyId> {
        None
    }
}

/// Called when the plugin is loaded by the host.
///
/// # Safety
/// `error` must be a valid pointer to a buffer of at least `maxlen` bytes,
/// or null.
#[no_mangle]
pub unsafe extern "C" fn purser_plugin_load(error: *mut c_char, maxlen: usize) -> bool {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("Purser loading...");

    let module = match host_module() {
        Ok(module) => module,
        Err(e) => {
            tracing::error!("Failed to locate host module: {}", e);
            write_error(error, maxlen, &format!("Module error: {}", e));
            return false;
        }
    };

    let config = PurserConfig::load().unwrap_or_else(|e| {
        tracing::error!("Failed to load config, using defaults: {}", e);
        PurserConfig::default()
    });

    let data_dir = match data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("Failed to resolve data directory: {}", e);
            write_error(error, maxlen, &format!("Config error: {}", e));
            return false;
        }
    };

    // The company accessor is resolved like any hooked routine; without it
    // the trackers still run but skip every batch.
    let company: Arc<dyn CompanySource> =
        match resolve_signature(&module, "CompanyInfo", COMPANY_INFO) {
            Ok(addr) => Arc::new(ClientCompanySource::from_addr(addr)),
            Err(e) => {
                tracing::error!("Could not resolve company info accessor: {}", e);
                Arc::new(UnresolvedCompany)
            }
        };

    let manager = TimerManager::new(config.flags, &module, company, &data_dir);

    *PLUGIN.lock() = Some(Plugin { config, manager });

    tracing::info!("Purser loaded");
    true
}

/// Called when the plugin is unloaded by the host.
///
/// # Safety
/// `error` must be a valid pointer to a buffer of at least `maxlen` bytes,
/// or null.
#[no_mangle]
pub unsafe extern "C" fn purser_plugin_unload(error: *mut c_char, maxlen: usize) -> bool {
    tracing::info!("Purser unloading...");

    match std::panic::catch_unwind(|| {
        if let Some(mut plugin) = PLUGIN.lock().take() {
            plugin.manager.dispose();
        }
    }) {
        Ok(()) => true,
        Err(_) => {
            write_error(error, maxlen, "Panic during shutdown");
            false
        }
    }
}

/// Called by the host's settings UI after the config file changed.
///
/// Reloads the flags and broadcasts a state re-evaluation to every timer
/// category.
#[no_mangle]
pub extern "C" fn purser_config_changed() -> bool {
    let mut guard = PLUGIN.lock();
    let Some(plugin) = guard.as_mut() else {
        return false;
    };

    if let Err(e) = plugin.config.reload() {
        tracing::error!("Failed to reload config: {}", e);
        return false;
    }

    plugin.manager.set_state(plugin.config.flags);
    true
}

/// Thin command entry point bound by the host's command layer.
///
/// `timers` toggles the timer window; `dump` logs the current countdowns.
///
/// # Safety
/// `command` must be a valid NUL-terminated string, or null.
#[no_mangle]
pub unsafe extern "C" fn purser_plugin_command(command: *const c_char) -> bool {
    if command.is_null() {
        return false;
    }
    let Ok(command) = CStr::from_ptr(command).to_str() else {
        return false;
    };

    let mut guard = PLUGIN.lock();
    let Some(plugin) = guard.as_mut() else {
        return false;
    };

    match command.trim().to_ascii_lowercase().as_str() {
        "timers" => {
            plugin.config.flags.toggle(ConfigFlags::WINDOW_VISIBLE);
            if let Err(e) = plugin.config.save() {
                tracing::error!("Failed to save config: {}", e);
            }
            true
        }
        "dump" => {
            let now = unix_now();
            for cache in plugin.manager.create_caches() {
                tracing::info!("{}:", cache.title);
                for row in &cache.rows {
                    for entry in row.entries.iter().flatten() {
                        let remaining = entry.remaining(now);
                        if remaining <= 0 {
                            tracing::info!("  [{}] {}: ready", row.company, entry.name);
                        } else {
                            tracing::info!(
                                "  [{}] {}: {}m remaining",
                                row.company,
                                entry.name,
                                remaining / 60
                            );
                        }
                    }
                }
            }
            true
        }
        _ => false,
    }
}

// Metadata exports - these return static strings for the host to display

#[no_mangle]
pub extern "C" fn purser_get_name() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn purser_get_description() -> *const c_char {
    DESCRIPTION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn purser_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

/// Copy an error message into the caller's buffer, truncating to fit.
unsafe fn write_error(error: *mut c_char, maxlen: usize, msg: &str) {
    if error.is_null() || maxlen == 0 {
        return;
    }
    let bytes = msg.as_bytes();
    let len = bytes.len().min(maxlen - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), error as *mut u8, len);
    *error.add(len) = 0;
}
