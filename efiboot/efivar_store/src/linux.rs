// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Linux backend, via the efivarfs filesystem.
//!
//! efivarfs exposes each variable as a file named `<Name>-<vendor-guid>`
//! whose content is a 4-byte little-endian attribute word followed by the
//! variable data.

use crate::VarStore;
use crate::VarStoreError;
use std::io::ErrorKind;
use std::path::PathBuf;
use uefi_wire::nvram::EfiVariableAttributes;
use uefi_wire::nvram::EFI_GLOBAL_VARIABLE;

const EFIVARFS_ROOT: &str = "/sys/firmware/efi/efivars";

pub struct EfivarfsStore {
    root: PathBuf,
}

impl EfivarfsStore {
    pub fn new() -> Self {
        EfivarfsStore {
            root: PathBuf::from(EFIVARFS_ROOT),
        }
    }

    /// Point the store at a different directory. Exists for tests.
    #[cfg_attr(not(test), expect(dead_code))]
    fn with_root(root: impl Into<PathBuf>) -> Self {
        EfivarfsStore { root: root.into() }
    }

    fn var_path(&self, name: &str) -> PathBuf {
        self.root.join(efivarfs_file_name(name))
    }

    fn map_io(name: &str, err: std::io::Error) -> VarStoreError {
        match err.kind() {
            ErrorKind::NotFound => VarStoreError::NotFound(name.to_string()),
            ErrorKind::PermissionDenied => VarStoreError::PermissionDenied(name.to_string()),
            ErrorKind::Unsupported => VarStoreError::Unsupported,
            _ => VarStoreError::Io(name.to_string(), err),
        }
    }
}

impl Default for EfivarfsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn efivarfs_file_name(name: &str) -> String {
    format!("{name}-{EFI_GLOBAL_VARIABLE}")
}

fn split_attributes(name: &str, raw: Vec<u8>) -> Result<(u32, Vec<u8>), VarStoreError> {
    if raw.len() < 4 {
        return Err(VarStoreError::Io(
            name.to_string(),
            std::io::Error::new(ErrorKind::InvalidData, "missing efivarfs attribute word"),
        ));
    }
    let attributes = u32::from_le_bytes(raw[..4].try_into().unwrap());
    Ok((attributes, raw[4..].to_vec()))
}

fn prepend_attributes(attributes: u32, data: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(4 + data.len());
    raw.extend_from_slice(&attributes.to_le_bytes());
    raw.extend_from_slice(data);
    raw
}

impl VarStore for EfivarfsStore {
    fn read(&mut self, name: &str) -> Result<(u32, Vec<u8>), VarStoreError> {
        let raw = fs_err::read(self.var_path(name)).map_err(|e| Self::map_io(name, e))?;
        tracing::debug!(name, len = raw.len(), "read firmware variable");
        split_attributes(name, raw)
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), VarStoreError> {
        let raw = prepend_attributes(
            EfiVariableAttributes::DEFAULT_ATTRIBUTES.into(),
            data,
        );
        tracing::debug!(name, len = data.len(), "write firmware variable");
        fs_err::write(self.var_path(name), raw).map_err(|e| Self::map_io(name, e))
    }

    fn delete(&mut self, name: &str) -> Result<(), VarStoreError> {
        tracing::debug!(name, "delete firmware variable");
        fs_err::remove_file(self.var_path(name)).map_err(|e| Self::map_io(name, e))
    }

    fn exists(&mut self, name: &str) -> bool {
        // efivarfs reports variables as files; a metadata probe is enough and
        // avoids reading large values out.
        self.var_path(name).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_carry_the_global_guid() {
        assert_eq!(
            efivarfs_file_name("BootOrder"),
            "BootOrder-8be4df61-93ca-11d2-aa0d-00e098032b8c"
        );
        let store = EfivarfsStore::with_root("/tmp/efivars");
        assert_eq!(
            store.var_path("Boot0001"),
            PathBuf::from("/tmp/efivars/Boot0001-8be4df61-93ca-11d2-aa0d-00e098032b8c")
        );
    }

    #[test]
    fn attribute_word_round_trip() {
        let raw = prepend_attributes(0x7, &[0xaa, 0xbb]);
        assert_eq!(raw, [0x07, 0, 0, 0, 0xaa, 0xbb]);
        let (attr, data) = split_attributes("X", raw).unwrap();
        assert_eq!(attr, 0x7);
        assert_eq!(data, [0xaa, 0xbb]);
    }

    #[test]
    fn short_file_is_an_io_error() {
        assert!(matches!(
            split_attributes("X", vec![1, 2]),
            Err(VarStoreError::Io(_, _))
        ));
    }
}
