//! Host module discovery
//!
//! Locates the executable code region of the host client so signatures can
//! be scanned over it. The region is mapped for the lifetime of the process,
//! so the returned view is `'static`.

use crate::error::ModuleError;

/// Read-only view over a contiguous region of host code.
///
/// Wraps the base address and byte span of the region; signature scanning
/// operates on the byte slice and translates match offsets back to absolute
/// addresses via [`ModuleView::base`].
#[derive(Debug, Clone, Copy)]
pub struct ModuleView<'a> {
    base: usize,
    bytes: &'a [u8],
}

impl<'a> ModuleView<'a> {
    /// Create a view over an in-memory byte buffer.
    ///
    /// The base address is the buffer's own address, so resolved addresses
    /// point into the buffer. Used directly by tests and tooling.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self {
            base: bytes.as_ptr() as usize,
            bytes,
        }
    }

    /// Create a view over raw process memory.
    ///
    /// # Safety
    /// The region `base..base + len` must be mapped and readable for the
    /// lifetime of the returned view.
    pub unsafe fn from_raw(base: usize, len: usize) -> ModuleView<'static> {
        ModuleView {
            base,
            bytes: std::slice::from_raw_parts(base as *const u8, len),
        }
    }

    /// Base address of the viewed region.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Bytes of the viewed region.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Length of the viewed region in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the viewed region is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Translate an offset within the region to an absolute address.
    pub fn address_at(&self, offset: usize) -> usize {
        self.base + offset
    }
}

/// Locate the executable segment of the host binary.
///
/// Called once during plugin load; the result is handed to signature
/// resolution. Fails if no executable load segment can be found.
#[cfg(unix)]
pub fn host_module() -> Result<ModuleView<'static>, ModuleError> {
    struct Segment {
        base: usize,
        len: usize,
    }

    unsafe extern "C" fn collect(
        info: *mut libc::dl_phdr_info,
        _size: libc::size_t,
        data: *mut libc::c_void,
    ) -> libc::c_int {
        let info = &*info;
        let out = &mut *(data as *mut Option<Segment>);

        // The first entry enumerated is the main executable (empty name).
        for i in 0..info.dlpi_phnum {
            let phdr = &*info.dlpi_phdr.add(i as usize);
            if phdr.p_type == libc::PT_LOAD && phdr.p_flags & libc::PF_X != 0 {
                *out = Some(Segment {
                    base: (info.dlpi_addr + phdr.p_vaddr) as usize,
                    len: phdr.p_memsz as usize,
                });
                return 1; // stop iteration
            }
        }
        1
    }

    let mut found: Option<Segment> = None;
    unsafe {
        libc::dl_iterate_phdr(Some(collect), &mut found as *mut _ as *mut libc::c_void);
    }

    match found {
        Some(seg) => {
            tracing::info!(
                "Host code segment at {:#x} ({} bytes)",
                seg.base,
                seg.len
            );
            Ok(unsafe { ModuleView::from_raw(seg.base, seg.len) })
        }
        None => Err(ModuleError::NoExecutableSegment),
    }
}

#[cfg(not(unix))]
pub fn host_module() -> Result<ModuleView<'static>, ModuleError> {
    Err(ModuleError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_translates_offsets() {
        let data = [0u8; 16];
        let view = ModuleView::from_slice(&data);
        assert_eq!(view.len(), 16);
        assert_eq!(view.base(), data.as_ptr() as usize);
        assert_eq!(view.address_at(4), data.as_ptr() as usize + 4);
    }

    #[cfg(unix)]
    #[test]
    fn host_module_finds_own_code() {
        let view = host_module().unwrap();
        assert!(!view.is_empty());
    }
}
