// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stub backend for platforms with no firmware variable access.

use crate::VarStore;
use crate::VarStoreError;

/// A [`VarStore`] whose every operation fails with
/// [`VarStoreError::Unsupported`].
#[derive(Debug, Default)]
pub struct NullStore;

impl VarStore for NullStore {
    fn read(&mut self, _name: &str) -> Result<(u32, Vec<u8>), VarStoreError> {
        Err(VarStoreError::Unsupported)
    }

    fn write(&mut self, _name: &str, _data: &[u8]) -> Result<(), VarStoreError> {
        Err(VarStoreError::Unsupported)
    }

    fn delete(&mut self, _name: &str) -> Result<(), VarStoreError> {
        Err(VarStoreError::Unsupported)
    }

    fn exists(&mut self, _name: &str) -> bool {
        false
    }
}
