// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Collection operations over the entries of one load-option class: loading
//! in firmware order, saving with automatic index assignment, and rewriting
//! the ordering variable.

use crate::entry::BootEntry;
use crate::entry::OptionType;
use crate::load_option::LoadOption;
use crate::BootDevError;
use efivar_store::VarStore;
use efivar_store::VarStoreError;

/// Manages the `{prefix}####` entry variables and the `{prefix}Order`
/// ordering variable through a [`VarStore`].
///
/// The store is machine-wide and offers no transactions; if a multi-entry
/// operation fails part-way, variables already written stay written and the
/// ordering variable may not reflect them yet. Callers see the error and the
/// firmware state remains parseable.
pub struct BootEntryManager<S> {
    store: S,
}

impl<S: VarStore> BootEntryManager<S> {
    pub fn new(store: S) -> Self {
        BootEntryManager { store }
    }

    /// Direct access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Load one entry by type and index.
    pub fn load(&mut self, option_type: OptionType, index: u16) -> Result<BootEntry, BootDevError> {
        let name = option_type.variable_name(index);
        let (_, data) = self.store.read(&name)?;
        let option = LoadOption::parse(&data)
            .map_err(|err| BootDevError::BadEntry(name.clone(), err))?;
        tracing::debug!(%name, "loaded boot entry");
        Ok(BootEntry::from_load_option(option_type, index, option))
    }

    /// Load every entry of a type, in the order listed by the ordering
    /// variable.
    ///
    /// A missing ordering variable reads as an empty list (and yields no
    /// entries); any other failure, including an entry variable that the
    /// ordering variable names but firmware does not hold, aborts the load.
    pub fn load_all(&mut self, option_type: OptionType) -> Result<Vec<BootEntry>, BootDevError> {
        let order_name = option_type.order_variable();
        let order = match self.store.read(order_name) {
            Ok((_, data)) => data,
            Err(VarStoreError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        if order.len() % 2 != 0 {
            return Err(BootDevError::BadOrderVariable(order_name.to_string()));
        }

        let mut entries = Vec::with_capacity(order.len() / 2);
        for chunk in order.chunks_exact(2) {
            let index = u16::from_le_bytes(chunk.try_into().unwrap());
            entries.push(self.load(option_type, index)?);
        }
        tracing::debug!(
            order = order_name,
            count = entries.len(),
            "loaded boot entries"
        );
        Ok(entries)
    }

    /// Persist one entry if it is modified, assigning a free index first
    /// when the entry requests auto-assignment.
    pub fn save(&mut self, entry: &mut BootEntry) -> Result<(), BootDevError> {
        if !entry.is_modified() {
            return Ok(());
        }
        self.save_assigning_index(entry).map(|_| ())
    }

    fn save_assigning_index(&mut self, entry: &mut BootEntry) -> Result<u16, BootDevError> {
        let index = match entry.index() {
            Some(index) => index,
            None => {
                let index = self.free_index(entry.option_type())?;
                entry.set_index(Some(index));
                index
            }
        };
        if entry.is_modified() {
            let name = entry.option_type().variable_name(index);
            let record = entry
                .encode()
                .map_err(|err| BootDevError::BadEntry(name.clone(), err))?;
            self.store.write(&name, &record)?;
            entry.clear_modified();
            tracing::debug!(%name, "saved boot entry");
        }
        Ok(index)
    }

    /// First index whose entry variable does not currently exist. The store
    /// is probed fresh on every call; another writer may own indices since
    /// the last look.
    fn free_index(&mut self, option_type: OptionType) -> Result<u16, BootDevError> {
        for index in 0..=u16::MAX {
            if !self.store.exists(&option_type.variable_name(index)) {
                tracing::debug!(index, "auto-assigned free index");
                return Ok(index);
            }
        }
        Err(BootDevError::NoFreeIndex(option_type.prefix()))
    }

    /// Save every entry (resolving auto indices), then rewrite the ordering
    /// variable to list exactly the given entries in the given order.
    ///
    /// All entries must be of the requested type. On a mid-way failure,
    /// entries saved so far remain saved and the ordering variable keeps its
    /// previous content; firmware offers no way to do better.
    pub fn save_all(
        &mut self,
        option_type: OptionType,
        entries: &mut [BootEntry],
    ) -> Result<(), BootDevError> {
        for entry in entries.iter() {
            if entry.option_type() != option_type {
                return Err(BootDevError::EntryType {
                    expected: option_type,
                    found: entry.option_type(),
                });
            }
        }

        let mut order = Vec::with_capacity(entries.len() * 2);
        for entry in entries.iter_mut() {
            let index = self.save_assigning_index(entry)?;
            order.extend_from_slice(&index.to_le_bytes());
        }

        self.store.write(option_type.order_variable(), &order)?;
        tracing::debug!(
            order = option_type.order_variable(),
            count = entries.len(),
            "rewrote ordering variable"
        );
        Ok(())
    }

    /// Delete the variable backing an entry. Entries with no assigned name
    /// have nothing on disk; this does not touch the ordering variable.
    pub fn delete(&mut self, entry: &BootEntry) -> Result<(), BootDevError> {
        match entry.name() {
            Some(name) => {
                tracing::debug!(name, "deleting boot entry");
                Ok(self.store.delete(name)?)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use efivar_store::in_memory::InMemoryStore;

    fn manager() -> BootEntryManager<InMemoryStore> {
        BootEntryManager::new(InMemoryStore::new())
    }

    fn entry_with(description: &str, path: &str) -> BootEntry {
        let mut entry = BootEntry::new();
        entry.set_description(description);
        entry.set_paths_text(&[path]).unwrap();
        entry
    }

    #[test]
    fn load_all_without_order_variable_is_empty() {
        let mut mgr = manager();
        assert!(mgr.load_all(OptionType::Boot).unwrap().is_empty());
    }

    #[test]
    fn load_all_with_zero_length_order_is_empty() {
        let mut mgr = manager();
        mgr.store_mut().write("BootOrder", &[]).unwrap();
        assert!(mgr.load_all(OptionType::Boot).unwrap().is_empty());
    }

    #[test]
    fn load_all_rejects_odd_length_order() {
        let mut mgr = manager();
        mgr.store_mut().write("BootOrder", &[0, 0, 1]).unwrap();
        assert!(matches!(
            mgr.load_all(OptionType::Boot),
            Err(BootDevError::BadOrderVariable(_))
        ));
    }

    #[test]
    fn load_all_fails_on_dangling_order_index() {
        let mut mgr = manager();
        mgr.store_mut().write("BootOrder", &[0x05, 0x00]).unwrap();
        assert!(matches!(
            mgr.load_all(OptionType::Boot),
            Err(BootDevError::Store(VarStoreError::NotFound(_)))
        ));
    }

    #[test]
    fn auto_index_skips_occupied_slots() {
        let mut mgr = manager();
        for name in ["Boot0000", "Boot0001", "Boot0003"] {
            mgr.store_mut().write(name, &[0]).unwrap();
        }

        let mut first = entry_with("First", "PciRoot(0x0)/Pci(0x1,0x0)");
        mgr.save(&mut first).unwrap();
        assert_eq!(first.index(), Some(0x0002));
        assert_eq!(first.name(), Some("Boot0002"));
        assert!(!first.is_modified());

        let mut second = entry_with("Second", "PciRoot(0x0)/Pci(0x2,0x0)");
        mgr.save(&mut second).unwrap();
        assert_eq!(second.index(), Some(0x0004));
    }

    #[test]
    fn unmodified_entries_are_not_rewritten() {
        let mut mgr = manager();
        let mut entry = entry_with("One", "PciRoot(0x0)/Pci(0x1,0x0)");
        mgr.save(&mut entry).unwrap();
        mgr.store_mut().delete("Boot0000").unwrap();

        // not modified: save is a no-op and does not resurrect the variable
        mgr.save(&mut entry).unwrap();
        assert!(!mgr.store_mut().exists("Boot0000"));
    }

    #[test]
    fn save_all_writes_order_and_round_trips() {
        let mut mgr = manager();
        let mut e0 = entry_with("Zero", "PciRoot(0x0)/Pci(0x1,0x0)");
        let mut e1 = entry_with("One", "PciRoot(0x0)/Pci(0x2,0x0)");
        let mut e2 = entry_with("Two", "PciRoot(0x0)/Pci(0x3,0x0)");
        e0.set_index(Some(0));
        e1.set_index(Some(1));
        e2.set_index(Some(2));

        // order [e2, e0, e1]
        let mut entries = [e2, e0, e1];
        mgr.save_all(OptionType::Boot, &mut entries).unwrap();

        let (_, order) = mgr.store_mut().read("BootOrder").unwrap();
        assert_eq!(order, [0x02, 0x00, 0x00, 0x00, 0x01, 0x00]);

        let loaded = mgr.load_all(OptionType::Boot).unwrap();
        assert_eq!(loaded.len(), 3);
        let descriptions: Vec<&str> = loaded.iter().map(|e| e.description()).collect();
        assert_eq!(descriptions, ["Two", "Zero", "One"]);
        for (loaded, saved) in loaded.iter().zip(entries.iter()) {
            assert!(!loaded.is_modified());
            assert_eq!(
                loaded.encode().unwrap(),
                saved.encode().unwrap(),
                "persisted bytes must round-trip"
            );
        }
    }

    #[test]
    fn save_all_resolves_auto_indices_into_order() {
        let mut mgr = manager();
        mgr.store_mut().write("Boot0000", &[0]).unwrap();

        let mut entries = [
            entry_with("A", "PciRoot(0x0)/Pci(0x1,0x0)"),
            entry_with("B", "PciRoot(0x0)/Pci(0x2,0x0)"),
        ];
        mgr.save_all(OptionType::Boot, &mut entries).unwrap();
        assert_eq!(entries[0].index(), Some(1));
        assert_eq!(entries[1].index(), Some(2));

        let (_, order) = mgr.store_mut().read("BootOrder").unwrap();
        assert_eq!(order, [0x01, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn save_all_rejects_type_mismatch_before_writing() {
        let mut mgr = manager();
        let boot = entry_with("A", "PciRoot(0x0)/Pci(0x1,0x0)");
        let mut driver = entry_with("B", "PciRoot(0x0)/Pci(0x2,0x0)");
        driver.set_type(OptionType::Driver);

        let mut entries = [boot, driver];
        assert!(matches!(
            mgr.save_all(OptionType::Boot, &mut entries),
            Err(BootDevError::EntryType { .. })
        ));
        // nothing was persisted
        assert!(!mgr.store_mut().exists("Boot0000"));
        assert!(!mgr.store_mut().exists("BootOrder"));
    }

    #[test]
    fn duplicate_order_indices_load_independently() {
        let mut mgr = manager();
        let mut entry = entry_with("Dup", "PciRoot(0x0)/Pci(0x1,0x0)");
        mgr.save(&mut entry).unwrap();
        mgr.store_mut()
            .write("BootOrder", &[0x00, 0x00, 0x00, 0x00])
            .unwrap();

        let loaded = mgr.load_all(OptionType::Boot).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name(), Some("Boot0000"));
        assert_eq!(loaded[1].name(), Some("Boot0000"));
    }

    #[test]
    fn delete_removes_entry_variable_only() {
        let mut mgr = manager();
        let mut entries = [entry_with("A", "PciRoot(0x0)/Pci(0x1,0x0)")];
        mgr.save_all(OptionType::Boot, &mut entries).unwrap();
        assert!(mgr.store_mut().exists("Boot0000"));

        let [entry] = entries;
        mgr.delete(&entry).unwrap();
        assert!(!mgr.store_mut().exists("Boot0000"));
        // the ordering variable is the caller's to rewrite
        assert!(mgr.store_mut().exists("BootOrder"));

        // entries with no name have nothing to delete
        mgr.delete(&BootEntry::new()).unwrap();
    }

    #[test]
    fn typical_delete_flow() {
        let mut mgr = manager();
        let mut entries = vec![
            entry_with("Keep", "PciRoot(0x0)/Pci(0x1,0x0)"),
            entry_with("Drop", "PciRoot(0x0)/Pci(0x2,0x0)"),
        ];
        mgr.save_all(OptionType::Boot, &mut entries).unwrap();

        let removed = entries.remove(1);
        mgr.save_all(OptionType::Boot, &mut entries).unwrap();
        mgr.delete(&removed).unwrap();

        let loaded = mgr.load_all(OptionType::Boot).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].description(), "Keep");
        assert!(!mgr.store_mut().exists("Boot0001"));
    }
}
