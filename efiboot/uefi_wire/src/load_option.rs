// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! `EFI_LOAD_OPTION` layout, from UEFI spec 3.1.3 "Load Options".

use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

/// Fixed header of an `EFI_LOAD_OPTION`. A null-terminated UCS-2 LE
/// description, `file_path_list_length` bytes of device paths, and optional
/// vendor data follow.
#[repr(C, packed)]
#[derive(Copy, Clone, IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct EfiLoadOptionHeader {
    pub attributes: u32,
    pub file_path_list_length: u16,
}

/// The boot manager will attempt this entry.
pub const LOAD_OPTION_ACTIVE: u32 = 0x00000001;
/// Reconnect all drivers after loading this driver option.
pub const LOAD_OPTION_FORCE_RECONNECT: u32 = 0x00000002;
/// Excluded from normal boot-menu display.
pub const LOAD_OPTION_HIDDEN: u32 = 0x00000008;
/// Category bits; zero for ordinary boot entries.
pub const LOAD_OPTION_CATEGORY: u32 = 0x00001f00;
pub const LOAD_OPTION_CATEGORY_APP: u32 = 0x00000100;
