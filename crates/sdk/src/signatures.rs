//! Byte-pattern signatures for the hooked client routines
//!
//! Patterns are hex bytes with `??` wildcards, matched over the client's
//! executable region. They must match exactly once; updating them is the only
//! maintenance required for a new client build.

/// Voyage-result handler for submersibles, invoked when a voyage completes
/// or the timer payload is refreshed.
pub const SUBMERSIBLE_TIMERS: &str = "E8 E8 03 00 00 B0 01 48 81 C4 10 01 00 00 5B C3";

/// Submersible status-list handler, invoked when the bay overview is opened.
pub const SUBMERSIBLE_STATUS_LIST: &str =
    "48 89 5C 24 ?? 48 89 6C 24 ?? 48 89 74 24 ?? 57 48 83 EC ?? 0F 10 02 4C 8D 81";

/// Voyage-result handler for airships.
pub const AIRSHIP_TIMERS: &str = "40 53 48 83 EC 20 48 8B DA 48 8B 0D ?? ?? ?? ?? 48 85 C9 74 1E";

/// Airship status-list handler.
pub const AIRSHIP_STATUS_LIST: &str =
    "48 89 5C 24 ?? 48 89 74 24 ?? 57 48 83 EC ?? 49 8B F0 48 8B DA 0F 10 02";

/// Accessor returning the active company info record.
pub const COMPANY_INFO: &str = "E8 ?? ?? ?? ?? 48 85 C0 74 ?? 44 0F B7 40 ?? 48 8D 50 08";

/// Collected routine signatures for diagnostics
pub const VOYAGE_SIGNATURES: &[(&str, &str)] = &[
    ("SubmersibleTimers", SUBMERSIBLE_TIMERS),
    ("SubmersibleStatusList", SUBMERSIBLE_STATUS_LIST),
    ("AirshipTimers", AIRSHIP_TIMERS),
    ("AirshipStatusList", AIRSHIP_STATUS_LIST),
    ("CompanyInfo", COMPANY_INFO),
];
