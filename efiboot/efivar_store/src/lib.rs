// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Pluggable access to the UEFI global-namespace firmware variables
//! (`Boot####`, `BootOrder`, …).
//!
//! The [`VarStore`] trait abstracts the per-platform variable mechanism:
//! Linux exposes variables as files in efivarfs, Windows through the
//! firmware-environment Win32 API, and everything else through a stub that
//! always fails. [`platform_store`] picks the backend once at startup; an
//! [`in_memory::InMemoryStore`] stands in for firmware in tests and dry runs.
//!
//! Implementations report existence conservatively: `exists` must not claim a
//! variable exists when it cannot actually be read back, since index
//! auto-assignment relies on it.

#![cfg_attr(not(windows), forbid(unsafe_code))]
// UNSAFETY: the Windows backend calls Win32 token and firmware-environment
// APIs.
#![cfg_attr(windows, expect(unsafe_code))]

pub mod in_memory;
mod null;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(windows)]
mod windows;

pub use null::NullStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VarStoreError {
    #[error("variable `{0}` not found")]
    NotFound(String),
    #[error("permission denied accessing variable `{0}`")]
    PermissionDenied(String),
    #[error("firmware variables are not accessible on this platform")]
    Unsupported,
    #[error("i/o error accessing variable `{0}`")]
    Io(String, #[source] std::io::Error),
}

/// Key/blob access to the UEFI global variable namespace.
///
/// Names are the bare ASCII variable names (`Boot0001`, `BootOrder`); each
/// backend scopes them to the global vendor GUID itself. Methods take `&mut
/// self` because backends may carry lazily initialized per-instance state
/// (the Windows privilege flag). Nothing may be cached between calls: the
/// firmware store is machine-wide and external writers are legal.
pub trait VarStore: Send {
    /// Read a variable's attributes and full value.
    fn read(&mut self, name: &str) -> Result<(u32, Vec<u8>), VarStoreError>;

    /// Create or replace a variable with the default non-volatile,
    /// boot-services, runtime-access attributes.
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), VarStoreError>;

    /// Remove a variable.
    fn delete(&mut self, name: &str) -> Result<(), VarStoreError>;

    /// Probe for existence without reading the value out.
    fn exists(&mut self, name: &str) -> bool;
}

impl VarStore for Box<dyn VarStore> {
    fn read(&mut self, name: &str) -> Result<(u32, Vec<u8>), VarStoreError> {
        (**self).read(name)
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), VarStoreError> {
        (**self).write(name, data)
    }

    fn delete(&mut self, name: &str) -> Result<(), VarStoreError> {
        (**self).delete(name)
    }

    fn exists(&mut self, name: &str) -> bool {
        (**self).exists(name)
    }
}

/// Select the variable-store backend for the running platform.
///
/// This is the only place backend selection happens; callers hold the
/// returned trait object for the life of the process.
pub fn platform_store() -> Box<dyn VarStore> {
    #[cfg(target_os = "linux")]
    return Box::new(linux::EfivarfsStore::new());

    #[cfg(windows)]
    return Box::new(windows::FirmwareApiStore::new());

    #[cfg(not(any(target_os = "linux", windows)))]
    return Box::new(null::NullStore);
}
