// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Provides an in-memory implementation of [`VarStore`] that doesn't touch
//! firmware. Used by unit tests as the mock store, and usable by library
//! consumers for dry-run manipulation of boot configuration.

use crate::VarStore;
use crate::VarStoreError;
use std::collections::BTreeMap;
use uefi_wire::nvram::EfiVariableAttributes;

/// An in-memory implementation of [`VarStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    vars: BTreeMap<String, Vec<u8>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn clear(&mut self) {
        self.vars.clear()
    }
}

impl VarStore for InMemoryStore {
    fn read(&mut self, name: &str) -> Result<(u32, Vec<u8>), VarStoreError> {
        match self.vars.get(name) {
            Some(data) => Ok((
                EfiVariableAttributes::DEFAULT_ATTRIBUTES.into(),
                data.clone(),
            )),
            None => Err(VarStoreError::NotFound(name.to_string())),
        }
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), VarStoreError> {
        self.vars.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), VarStoreError> {
        match self.vars.remove(name) {
            Some(_) => Ok(()),
            None => Err(VarStoreError::NotFound(name.to_string())),
        }
    }

    fn exists(&mut self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_delete_exists_agree() {
        let mut store = InMemoryStore::new();
        assert!(!store.exists("Boot0000"));
        assert!(matches!(
            store.read("Boot0000"),
            Err(VarStoreError::NotFound(_))
        ));

        store.write("Boot0000", &[1, 2, 3]).unwrap();
        assert!(store.exists("Boot0000"));
        let (attr, data) = store.read("Boot0000").unwrap();
        assert_eq!(attr, 0x7);
        assert_eq!(data, [1, 2, 3]);

        // replace
        store.write("Boot0000", &[4]).unwrap();
        assert_eq!(store.read("Boot0000").unwrap().1, [4]);

        store.delete("Boot0000").unwrap();
        assert!(!store.exists("Boot0000"));
        assert!(matches!(
            store.delete("Boot0000"),
            Err(VarStoreError::NotFound(_))
        ));
    }

    #[test]
    fn iter_is_name_ordered() {
        let mut store = InMemoryStore::new();
        store.write("BootOrder", &[0, 0]).unwrap();
        store.write("Boot0001", &[1]).unwrap();
        store.write("Boot0000", &[0]).unwrap();
        let names: Vec<&str> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Boot0000", "Boot0001", "BootOrder"]);
    }
}
