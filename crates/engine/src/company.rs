//! Company identity access
//!
//! Timer slots are grouped by the company that owns the voyage bays. The
//! active company is read from the client on demand; the lookup can fail
//! transiently (e.g. while zoning), so callers must handle `None`.

use serde::{Deserialize, Serialize};

use purser_sdk::records::{
    CompanyInfoFn, COMPANY_NAME_LEN, COMPANY_RECORD_SIZE, COMPANY_WORLD_OFFSET,
};

/// Identity of a company owning a set of voyage bays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId {
    /// Company display name as shown by the client.
    pub name: String,
    /// Home-world id, disambiguating same-named companies across worlds.
    pub world: u16,
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.world)
    }
}

/// Source of the currently active company identity.
///
/// The client-backed implementation reads process memory; tests inject
/// fixed or failing sources.
pub trait CompanySource: Send + Sync {
    /// Returns the active company, or `None` if it cannot be determined
    /// right now.
    fn current(&self) -> Option<CompanyId>;
}

/// Company source backed by the client's own info accessor.
pub struct ClientCompanySource {
    getter: CompanyInfoFn,
}

impl ClientCompanySource {
    /// Wrap a resolved client routine.
    ///
    /// # Safety
    /// `addr` must be the entry point of a routine matching
    /// [`CompanyInfoFn`], valid for the process lifetime.
    pub unsafe fn from_addr(addr: usize) -> Self {
        Self {
            getter: std::mem::transmute::<usize, CompanyInfoFn>(addr),
        }
    }
}

impl CompanySource for ClientCompanySource {
    fn current(&self) -> Option<CompanyId> {
        let record = unsafe { (self.getter)() };
        if record.is_null() {
            return None;
        }

        // The record starts with a NUL-padded name followed by the world id.
        let bytes =
            unsafe { std::slice::from_raw_parts(record as *const u8, COMPANY_RECORD_SIZE) };
        decode_company(bytes)
    }
}

/// Decode a raw company info record.
///
/// Returns `None` for an empty name, which the client uses for characters
/// without a company.
pub fn decode_company(bytes: &[u8]) -> Option<CompanyId> {
    if bytes.len() < COMPANY_RECORD_SIZE {
        return None;
    }

    let name_field = &bytes[..COMPANY_NAME_LEN];
    let end = name_field.iter().position(|&b| b == 0).unwrap_or(COMPANY_NAME_LEN);
    if end == 0 {
        return None;
    }

    let name = String::from_utf8_lossy(&name_field[..end]).into_owned();
    let world = u16::from_le_bytes([bytes[COMPANY_WORLD_OFFSET], bytes[COMPANY_WORLD_OFFSET + 1]]);
    Some(CompanyId { name, world })
}
