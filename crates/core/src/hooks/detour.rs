//! Inline function detours
//!
//! A detour overwrites the first instructions of a target routine with an
//! absolute jump to a replacement. The displaced instructions are re-encoded
//! at a trampoline, followed by a jump back to the remainder of the target,
//! so the original routine stays callable through the trampoline.
//!
//! Detours are installed disabled; `enable`/`disable` toggle the patch
//! idempotently and dropping the detour restores the original bytes.

use std::marker::PhantomData;
use std::mem;

use iced_x86::{
    BlockEncoder, BlockEncoderOptions, Decoder, DecoderOptions, Instruction, InstructionBlock,
};
use parking_lot::Mutex;
use region::{Allocation, Protection};

/// Size of an absolute x86_64 jump: `jmp [rip+0]` followed by the 8-byte
/// destination.
const JMP_SIZE: usize = 14;

/// Upper bound on the prologue bytes examined when stealing instructions.
const MAX_PROLOGUE: usize = 32;

/// Error type for hook operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Failed to create detour: {0}")]
    DetourCreation(String),

    #[error("Invalid address: {0:x}")]
    InvalidAddress(usize),

    #[error("Memory operation failed: {0}")]
    Memory(#[from] region::Error),

    #[error("Instruction relocation failed: {0}")]
    RelocationFailed(String),
}

/// An installed inline hook on a single routine.
///
/// `F` is the routine's function-pointer type; the replacement passed to
/// [`Detour::install`] and the trampoline returned by [`Detour::original`]
/// both have this type.
pub struct Detour<F> {
    /// Target routine entry point
    target: usize,

    /// Original prologue bytes, restored on disable and drop
    original_bytes: Vec<u8>,

    /// Patch written over the prologue while enabled
    patch: Vec<u8>,

    /// Trampoline entry point (relocated prologue + jump back)
    trampoline: usize,

    /// Keeps the trampoline page alive and executable
    _alloc: Allocation,

    /// Guards the patch state so concurrent toggles serialize
    enabled: Mutex<bool>,

    _marker: PhantomData<F>,
}

// SAFETY: The raw addresses refer to process-lifetime code; all mutation of
// the patch site is serialized through the `enabled` mutex.
unsafe impl<F: Copy> Send for Detour<F> {}
unsafe impl<F: Copy> Sync for Detour<F> {}

impl<F: Copy> Detour<F> {
    /// Install a detour at `target`, redirecting to `replacement`.
    ///
    /// The hook starts disabled; call [`Detour::enable`] to activate it.
    ///
    /// # Safety
    /// - `target` must be the entry point of a routine matching `F`, in
    ///   memory that stays mapped for the detour's lifetime
    /// - `replacement` must match the target's signature and calling
    ///   convention
    pub unsafe fn install(target: usize, replacement: F) -> Result<Self, HookError> {
        if mem::size_of::<F>() != mem::size_of::<usize>() {
            return Err(HookError::DetourCreation(
                "replacement is not a function pointer".to_string(),
            ));
        }
        if target == 0 {
            return Err(HookError::InvalidAddress(0));
        }

        let replacement_addr: usize = mem::transmute_copy(&replacement);
        tracing::debug!(
            "Creating detour at {:x} -> {:x}",
            target,
            replacement_addr
        );

        let prologue = std::slice::from_raw_parts(target as *const u8, MAX_PROLOGUE);
        let stolen = steal_instructions(prologue, target as u64)?;
        let stolen_len: usize = stolen.iter().map(Instruction::len).sum();

        // Relocate the stolen prologue into an executable trampoline and
        // append the jump back to the rest of the target.
        let alloc = region::alloc(region::page::size(), Protection::READ_WRITE_EXECUTE)?;
        let trampoline = alloc.as_ptr::<u8>() as usize;

        let block = InstructionBlock::new(&stolen, trampoline as u64);
        let encoded = BlockEncoder::encode(64, block, BlockEncoderOptions::NONE)
            .map_err(|e| HookError::RelocationFailed(e.to_string()))?;

        let mut code = encoded.code_buffer;
        code.extend_from_slice(&absolute_jump(target + stolen_len));
        std::ptr::copy_nonoverlapping(code.as_ptr(), trampoline as *mut u8, code.len());

        // Patch is the jump to the replacement, NOP-padded to instruction
        // boundaries so a disabled->enabled transition never splits one.
        let mut patch = absolute_jump(replacement_addr).to_vec();
        patch.resize(stolen_len, 0x90);

        Ok(Self {
            target,
            original_bytes: prologue[..stolen_len].to_vec(),
            patch,
            trampoline,
            _alloc: alloc,
            enabled: Mutex::new(false),
            _marker: PhantomData,
        })
    }

    /// Enable interception. Repeated calls are no-ops.
    pub fn enable(&self) -> Result<(), HookError> {
        let mut enabled = self.enabled.lock();
        if *enabled {
            return Ok(());
        }

        unsafe { write_code(self.target, &self.patch)? };
        *enabled = true;
        tracing::debug!("Enabled detour at {:x}", self.target);
        Ok(())
    }

    /// Disable interception, restoring the original bytes. Repeated calls
    /// are no-ops.
    pub fn disable(&self) -> Result<(), HookError> {
        let mut enabled = self.enabled.lock();
        if !*enabled {
            return Ok(());
        }

        unsafe { write_code(self.target, &self.original_bytes)? };
        *enabled = false;
        tracing::debug!("Disabled detour at {:x}", self.target);
        Ok(())
    }

    /// Whether interception is currently active.
    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock()
    }

    /// The trampoline, typed as the original routine.
    ///
    /// Calling it executes the displaced prologue and then the unmodified
    /// remainder of the target, whether or not the hook is enabled.
    pub fn original(&self) -> F {
        unsafe { mem::transmute_copy(&self.trampoline) }
    }
}

impl<F> Drop for Detour<F> {
    fn drop(&mut self) {
        let mut enabled = self.enabled.lock();
        if *enabled {
            if let Err(e) = unsafe { write_code(self.target, &self.original_bytes) } {
                tracing::error!("Failed to restore bytes at {:x}: {}", self.target, e);
            }
            *enabled = false;
        }
    }
}

/// Decode instructions from `prologue` until at least `JMP_SIZE` bytes are
/// covered, so the patch never cuts an instruction in half.
fn steal_instructions(prologue: &[u8], ip: u64) -> Result<Vec<Instruction>, HookError> {
    let mut decoder = Decoder::with_ip(64, prologue, ip, DecoderOptions::NONE);
    let mut stolen = Vec::new();
    let mut covered = 0usize;
    let mut instruction = Instruction::default();

    while covered < JMP_SIZE {
        if !decoder.can_decode() {
            return Err(HookError::RelocationFailed(
                "prologue too short for patch".to_string(),
            ));
        }
        decoder.decode_out(&mut instruction);
        if instruction.is_invalid() {
            return Err(HookError::RelocationFailed(format!(
                "undecodable instruction at {:x}",
                instruction.ip()
            )));
        }
        covered += instruction.len();
        stolen.push(instruction);
    }

    Ok(stolen)
}

/// Encode `jmp [rip+0]; dq dest`.
fn absolute_jump(dest: usize) -> [u8; JMP_SIZE] {
    let mut buf = [0u8; JMP_SIZE];
    buf[0] = 0xFF;
    buf[1] = 0x25;
    buf[6..].copy_from_slice(&(dest as u64).to_le_bytes());
    buf
}

/// Write bytes over code, temporarily lifting write protection.
unsafe fn write_code(target: usize, bytes: &[u8]) -> Result<(), HookError> {
    let _guard = region::protect_with_handle(
        target as *const u8,
        bytes.len(),
        Protection::READ_WRITE_EXECUTE,
    )?;
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), target as *mut u8, bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;

    type TargetFn = unsafe extern "C" fn() -> u64;

    static HOOK: RwLock<Option<Detour<TargetFn>>> = RwLock::new(None);

    unsafe extern "C" fn replacement() -> u64 {
        let guard = HOOK.read();
        let original = guard.as_ref().unwrap().original();
        original() + 1
    }

    /// Materialize `mov rax, 42; ret` in executable memory so the stolen
    /// bytes are known and position-independent.
    fn synthesize_target() -> (Allocation, usize) {
        const CODE: &[u8] = &[0x48, 0xC7, 0xC0, 0x2A, 0x00, 0x00, 0x00, 0xC3];

        let mut page =
            region::alloc(region::page::size(), Protection::READ_WRITE_EXECUTE).unwrap();
        unsafe {
            let dst = page.as_mut_ptr::<u8>();
            std::ptr::write_bytes(dst, 0x90, MAX_PROLOGUE * 2);
            std::ptr::copy_nonoverlapping(CODE.as_ptr(), dst, CODE.len());
        }
        let addr = page.as_ptr::<u8>() as usize;
        (page, addr)
    }

    #[test]
    fn detour_lifecycle_on_synthesized_routine() {
        let (_page, addr) = synthesize_target();
        let target: TargetFn = unsafe { mem::transmute(addr) };

        unsafe { assert_eq!(target(), 42) };

        let detour = unsafe { Detour::install(addr, replacement as TargetFn).unwrap() };
        assert!(!detour.is_enabled());
        unsafe { assert_eq!(target(), 42, "installed hooks start disabled") };
        *HOOK.write() = Some(detour);

        HOOK.read().as_ref().unwrap().enable().unwrap();
        unsafe { assert_eq!(target(), 43) };

        // Enabling twice leaves the hook state identical
        HOOK.read().as_ref().unwrap().enable().unwrap();
        assert!(HOOK.read().as_ref().unwrap().is_enabled());
        unsafe { assert_eq!(target(), 43) };

        HOOK.read().as_ref().unwrap().disable().unwrap();
        unsafe { assert_eq!(target(), 42) };
        HOOK.read().as_ref().unwrap().disable().unwrap();
        unsafe { assert_eq!(target(), 42) };

        HOOK.read().as_ref().unwrap().enable().unwrap();
        unsafe { assert_eq!(target(), 43) };

        // Dropping the detour restores the original bytes
        HOOK.write().take();
        unsafe { assert_eq!(target(), 42) };
    }

    #[test]
    fn install_rejects_null_target() {
        let result = unsafe { Detour::<TargetFn>::install(0, replacement as TargetFn) };
        assert!(matches!(result, Err(HookError::InvalidAddress(0))));
    }
}
