// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! EFI boot-entry management: the `EFI_LOAD_OPTION` codec, the in-memory
//! [`BootEntry`], and the [`BootEntryManager`] that keeps the per-entry
//! variables and the ordering variable consistent through a pluggable
//! [`efivar_store::VarStore`].
//!
//! Reading flows store → [`LoadOption::parse`] → [`BootEntry`]; writing
//! flows [`BootEntry::encode`] → store. The ordering variables
//! (`BootOrder`, …) are flat sequences of little-endian u16 indices handled
//! by the manager directly.

#![forbid(unsafe_code)]

mod entry;
mod load_option;
mod manager;

pub use entry::BootEntry;
pub use entry::OptionType;
pub use load_option::LoadOption;
pub use load_option::LoadOptionError;
pub use manager::BootEntryManager;

use efivar_store::VarStoreError;
use thiserror::Error;
use uefi_devpath::DevicePathError;

#[derive(Debug, Error)]
pub enum BootDevError {
    #[error("variable store error")]
    Store(#[from] VarStoreError),
    #[error("device path error")]
    DevicePath(#[from] DevicePathError),
    #[error("variable `{0}` does not hold a valid load option")]
    BadEntry(String, #[source] LoadOptionError),
    #[error("ordering variable `{0}` is malformed")]
    BadOrderVariable(String),
    #[error("an entry must keep at least one device path")]
    EmptyPathList,
    #[error("path index {0} is out of range")]
    PathIndex(usize),
    #[error("expected a {expected:?} entry, found a {found:?} entry")]
    EntryType {
        expected: OptionType,
        found: OptionType,
    },
    #[error("all 65536 {0}#### variable slots are in use")]
    NoFreeIndex(&'static str),
}
