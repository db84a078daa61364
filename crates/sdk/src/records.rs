//! Byte layouts of client structures read by the tracker
//!
//! The client fills these structures before the hooked handlers run. Layouts
//! are stable per client build; offsets below match the current build and are
//! updated together with the signatures in [`crate::signatures`].

use std::ffi::c_void;

/// Number of voyage bays per company. The client allocates exactly this many
/// record slots in every timer and status-list payload.
pub const BAY_COUNT: usize = 4;

/// Size in bytes of one voyage record inside an intercepted payload.
pub const VOYAGE_RECORD_SIZE: usize = 48;

/// Total payload span of one intercepted batch (`BAY_COUNT` records).
pub const VOYAGE_BATCH_SIZE: usize = BAY_COUNT * VOYAGE_RECORD_SIZE;

/// Offset of the fixed-size vessel name field within a voyage record.
pub const VOYAGE_NAME_OFFSET: usize = 0;

/// Length of the NUL-padded vessel name field. A record whose first name
/// byte is zero is the end-of-batch sentinel.
pub const VOYAGE_NAME_LEN: usize = 20;

/// Offset of the little-endian u32 return timestamp (Unix seconds).
pub const VOYAGE_DATE_OFFSET: usize = 20;

/// Length of the NUL-padded company name field in the company info record.
pub const COMPANY_NAME_LEN: usize = 22;

/// Offset of the little-endian u16 home-world id in the company info record.
pub const COMPANY_WORLD_OFFSET: usize = 22;

/// Minimum readable span of a company info record.
pub const COMPANY_RECORD_SIZE: usize = 24;

/// Signature of the client's voyage data handlers.
///
/// Both the voyage-result handler and the status-list handler share this
/// shape: an agent pointer followed by a pointer to the record batch.
pub type VoyageHandler = unsafe extern "C" fn(agent: *mut c_void, data: *const c_void);

/// Signature of the client routine returning the active company info record,
/// or null when no company is available (e.g. while zoning).
pub type CompanyInfoFn = unsafe extern "C" fn() -> *const c_void;
