//! Purser Engine - Host Module Discovery and Company Identity
//!
//! This crate handles:
//! - Locating the host client's executable code region for signature scanning
//! - Providing a read-only [`ModuleView`] over that region
//! - Resolving the active company identity via the [`CompanySource`] seam
//!
//! # Architecture
//!
//! The module view is acquired once during plugin load via
//! [`module::host_module`] and handed to whoever needs to scan it. Company
//! identity is read on demand through a [`CompanySource`] implementation;
//! the client-backed one wraps a resolved client routine, and tests inject
//! fakes.

pub mod company;
pub mod error;
pub mod module;

pub use company::{ClientCompanySource, CompanyId, CompanySource};
pub use error::ModuleError;
pub use module::{host_module, ModuleView};
