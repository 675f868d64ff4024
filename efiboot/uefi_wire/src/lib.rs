// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Wire-format definitions from the UEFI specification, shared by the
//! device-path codec, the load-option codec, and the variable-store backends.
//!
//! Everything here is a direct transcription of on-disk/in-nvram layout:
//! `repr(C, packed)` structs with [`zerocopy`] traits, and open enums for
//! code points where firmware may present values this code does not know
//! about.

#![forbid(unsafe_code)]

pub mod devpath;
pub mod load_option;
pub mod nvram;
