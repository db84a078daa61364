//! Error types for host module discovery

/// Error type for module discovery operations
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// No executable segment was found for the host binary
    #[error("No executable segment found in host module")]
    NoExecutableSegment,

    /// The platform does not support module enumeration
    #[error("Module enumeration is not supported on this platform")]
    Unsupported,
}
