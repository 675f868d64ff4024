// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! UEFI Nvram Variable Services definitions.

use bitfield_struct::bitfield;
use guid::Guid;

/// UEFI spec 8.2 - Variable Services
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct EfiVariableAttributes {
    pub non_volatile: bool,
    pub bootservice_access: bool,
    pub runtime_access: bool,
    pub hardware_error_record: bool,
    pub authenticated_write_access: bool,
    pub time_based_authenticated_write_access: bool,
    pub append_write: bool,
    pub enhanced_authenticated_access: bool,

    #[bits(24)]
    _reserved: u32,
}

impl EfiVariableAttributes {
    /// NV | BS | RT, the attribute set every boot-configuration variable is
    /// written with.
    pub const DEFAULT_ATTRIBUTES: EfiVariableAttributes = EfiVariableAttributes::new()
        .with_non_volatile(true)
        .with_bootservice_access(true)
        .with_runtime_access(true);
}

/// UEFI spec 3.3 - Globally Defined Variables. The vendor namespace holding
/// `Boot####`, `BootOrder`, and friends.
pub const EFI_GLOBAL_VARIABLE: Guid =
    Guid::from_static_str("8BE4DF61-93CA-11D2-AA0D-00E098032B8C");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attributes() {
        assert_eq!(u32::from(EfiVariableAttributes::DEFAULT_ATTRIBUTES), 0x7);
    }
}
