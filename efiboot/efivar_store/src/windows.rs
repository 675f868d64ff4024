// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Windows backend, via `GetFirmwareEnvironmentVariableA` and friends.
//!
//! Accessing firmware variables requires `SeSystemEnvironmentPrivilege` on
//! the process token, which is enabled lazily on first use and remembered per
//! store instance. The API has no way to query a variable's length, so reads
//! probe with a generous buffer and grow it while the API reports
//! truncation.

use crate::VarStore;
use crate::VarStoreError;
use std::ffi::CString;
use std::io::ErrorKind;
use std::os::windows::io::FromRawHandle;
use std::os::windows::io::OwnedHandle;
use std::ptr::null_mut;
use uefi_wire::nvram::EfiVariableAttributes;
use uefi_wire::nvram::EFI_GLOBAL_VARIABLE;
use windows_sys::Wdk::System::SystemServices::SE_SYSTEM_ENVIRONMENT_PRIVILEGE;
use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::Foundation::ERROR_ACCESS_DENIED;
use windows_sys::Win32::Foundation::ERROR_ENVVAR_NOT_FOUND;
use windows_sys::Win32::Foundation::ERROR_INSUFFICIENT_BUFFER;
use windows_sys::Win32::Foundation::ERROR_INVALID_FUNCTION;
use windows_sys::Win32::Foundation::ERROR_PRIVILEGE_NOT_HELD;
use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::Security::AdjustTokenPrivileges;
use windows_sys::Win32::Security::LUID;
use windows_sys::Win32::Security::LUID_AND_ATTRIBUTES;
use windows_sys::Win32::Security::SE_PRIVILEGE_ENABLED;
use windows_sys::Win32::Security::TOKEN_ADJUST_PRIVILEGES;
use windows_sys::Win32::Security::TOKEN_PRIVILEGES;
use windows_sys::Win32::Security::TOKEN_QUERY;
use windows_sys::Win32::System::Threading::GetCurrentProcess;
use windows_sys::Win32::System::Threading::OpenProcessToken;
use windows_sys::Win32::System::WindowsProgramming::GetFirmwareEnvironmentVariableA;
use windows_sys::Win32::System::WindowsProgramming::SetFirmwareEnvironmentVariableA;

/// Initial read probe size. The API gives no length query, so start with
/// more than any common boot variable needs.
const READ_PROBE_LEN: usize = 4096;

/// Give up growing at the practical nvram variable ceiling.
const READ_MAX_LEN: usize = 64 * 1024;

pub struct FirmwareApiStore {
    privileges_raised: bool,
}

impl FirmwareApiStore {
    pub fn new() -> Self {
        FirmwareApiStore {
            privileges_raised: false,
        }
    }

    /// Enable `SeSystemEnvironmentPrivilege` on the process token. Later
    /// calls are no-ops once it has succeeded.
    fn raise_privileges(&mut self) -> std::io::Result<()> {
        if self.privileges_raised {
            return Ok(());
        }

        // SAFETY: calling as documented
        let token = unsafe {
            let mut token = null_mut();
            if OpenProcessToken(
                GetCurrentProcess(),
                TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
                &mut token,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }
            OwnedHandle::from_raw_handle(token)
        };

        let tkp = TOKEN_PRIVILEGES {
            PrivilegeCount: 1,
            Privileges: [LUID_AND_ATTRIBUTES {
                Luid: LUID {
                    LowPart: SE_SYSTEM_ENVIRONMENT_PRIVILEGE as u32,
                    HighPart: 0,
                },
                Attributes: SE_PRIVILEGE_ENABLED,
            }],
        };

        // SAFETY: calling as documented with an appropriately initialized
        // struct.
        let r = unsafe {
            use std::os::windows::io::AsRawHandle;
            AdjustTokenPrivileges(token.as_raw_handle(), 0, &tkp, 0, null_mut(), null_mut())
        };
        if r == 0 {
            return Err(std::io::Error::last_os_error());
        }
        // AdjustTokenPrivileges reports success even when the privilege was
        // not assigned; the real verdict is in the last-error code.
        //
        // SAFETY: no preconditions
        if unsafe { GetLastError() } != ERROR_SUCCESS {
            return Err(std::io::Error::last_os_error());
        }

        tracing::debug!("SeSystemEnvironmentPrivilege enabled");
        self.privileges_raised = true;
        Ok(())
    }

    fn map_last_error(name: &str) -> VarStoreError {
        // SAFETY: no preconditions
        match unsafe { GetLastError() } {
            ERROR_INVALID_FUNCTION => VarStoreError::Unsupported,
            ERROR_ENVVAR_NOT_FOUND => VarStoreError::NotFound(name.to_string()),
            ERROR_ACCESS_DENIED | ERROR_PRIVILEGE_NOT_HELD => {
                VarStoreError::PermissionDenied(name.to_string())
            }
            _ => VarStoreError::Io(name.to_string(), std::io::Error::last_os_error()),
        }
    }
}

impl Default for FirmwareApiStore {
    fn default() -> Self {
        Self::new()
    }
}

fn c_name(name: &str) -> Result<CString, VarStoreError> {
    CString::new(name).map_err(|_| {
        VarStoreError::Io(
            name.to_string(),
            std::io::Error::new(ErrorKind::InvalidInput, "variable name contains NUL"),
        )
    })
}

fn vendor_guid() -> CString {
    CString::new(EFI_GLOBAL_VARIABLE.display_braced_upper()).unwrap()
}

impl VarStore for FirmwareApiStore {
    fn read(&mut self, name: &str) -> Result<(u32, Vec<u8>), VarStoreError> {
        self.raise_privileges()
            .map_err(|_| VarStoreError::PermissionDenied(name.to_string()))?;

        let c_name = c_name(name)?;
        let guid = vendor_guid();
        let mut buf = vec![0u8; READ_PROBE_LEN];
        loop {
            // SAFETY: buf is valid for writes of buf.len() bytes, and both
            // strings are null-terminated.
            let len = unsafe {
                GetFirmwareEnvironmentVariableA(
                    c_name.as_ptr().cast(),
                    guid.as_ptr().cast(),
                    buf.as_mut_ptr().cast(),
                    buf.len() as u32,
                )
            };
            if len != 0 {
                buf.truncate(len as usize);
                tracing::debug!(name, len, "read firmware variable");
                // The API does not report attributes; these are the ones
                // every variable this toolkit writes carries.
                return Ok((EfiVariableAttributes::DEFAULT_ATTRIBUTES.into(), buf));
            }
            // SAFETY: no preconditions
            let truncated = unsafe { GetLastError() } == ERROR_INSUFFICIENT_BUFFER;
            if truncated && buf.len() < READ_MAX_LEN {
                let grown = (buf.len() * 2).min(READ_MAX_LEN);
                buf.resize(grown, 0);
                continue;
            }
            return Err(Self::map_last_error(name));
        }
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), VarStoreError> {
        self.raise_privileges()
            .map_err(|_| VarStoreError::PermissionDenied(name.to_string()))?;

        let c_name = c_name(name)?;
        let guid = vendor_guid();
        tracing::debug!(name, len = data.len(), "write firmware variable");
        // SAFETY: data is valid for reads of data.len() bytes, and both
        // strings are null-terminated.
        let r = unsafe {
            SetFirmwareEnvironmentVariableA(
                c_name.as_ptr().cast(),
                guid.as_ptr().cast(),
                data.as_ptr().cast_mut().cast(),
                data.len() as u32,
            )
        };
        if r == 0 {
            return Err(Self::map_last_error(name));
        }
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), VarStoreError> {
        self.raise_privileges()
            .map_err(|_| VarStoreError::PermissionDenied(name.to_string()))?;

        let c_name = c_name(name)?;
        let guid = vendor_guid();
        tracing::debug!(name, "delete firmware variable");
        // Writing a zero-length value deletes the variable.
        //
        // SAFETY: both strings are null-terminated; the API ignores the data
        // pointer for zero-length writes.
        let r = unsafe {
            SetFirmwareEnvironmentVariableA(
                c_name.as_ptr().cast(),
                guid.as_ptr().cast(),
                null_mut(),
                0,
            )
        };
        if r == 0 {
            return Err(Self::map_last_error(name));
        }
        Ok(())
    }

    fn exists(&mut self, name: &str) -> bool {
        // No stat-like call exists; a variable exists if it reads back.
        self.read(name).is_ok()
    }
}
