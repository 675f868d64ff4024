// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory representation of one boot/driver/sysprep entry.

use crate::load_option;
use crate::load_option::LoadOption;
use crate::load_option::LoadOptionError;
use crate::BootDevError;
use std::cell::OnceCell;
use std::str::FromStr;
use uefi_devpath::DevicePath;
use uefi_wire::load_option::LOAD_OPTION_ACTIVE;

/// The three classes of load option, each with its own variable prefix and
/// ordering variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionType {
    #[default]
    Boot,
    Driver,
    SysPrep,
}

impl OptionType {
    /// Variable-name prefix (`Boot` in `Boot0001`).
    pub fn prefix(&self) -> &'static str {
        match self {
            OptionType::Boot => "Boot",
            OptionType::Driver => "Driver",
            OptionType::SysPrep => "SysPrep",
        }
    }

    /// Name of the ordering variable (`BootOrder`, …).
    pub fn order_variable(&self) -> &'static str {
        match self {
            OptionType::Boot => "BootOrder",
            OptionType::Driver => "DriverOrder",
            OptionType::SysPrep => "SysPrepOrder",
        }
    }

    /// Name of an entry variable: the prefix plus the upper-case 4-hex
    /// index.
    pub fn variable_name(&self, index: u16) -> String {
        format!("{}{index:04X}", self.prefix())
    }
}

impl FromStr for OptionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "boot" => Ok(OptionType::Boot),
            "driver" => Ok(OptionType::Driver),
            "sysprep" => Ok(OptionType::SysPrep),
            _ => Err(()),
        }
    }
}

/// One device path plus its lazily rendered text.
#[derive(Debug)]
struct EntryPath {
    path: DevicePath,
    text: OnceCell<String>,
}

impl EntryPath {
    fn new(path: DevicePath) -> Self {
        EntryPath {
            path,
            text: OnceCell::new(),
        }
    }

    fn text(&self) -> &str {
        self.text.get_or_init(|| self.path.to_text(false, true))
    }
}

/// An EFI boot entry.
///
/// Owns its description, device-path list (never empty), and optional data.
/// Every setter that changes persisted state marks the entry modified; the
/// manager clears the flag when it writes the entry out. The variable name
/// is derived from type and index, and absent while the index is
/// auto-assign.
#[derive(Debug)]
pub struct BootEntry {
    modified: bool,
    option_type: OptionType,
    /// `None` requests automatic index assignment at save time.
    index: Option<u16>,
    attributes: u32,
    description: String,
    paths: Vec<EntryPath>,
    data: Vec<u8>,
    name: Option<String>,
}

impl BootEntry {
    /// A fresh entry: active, described as "Unknown", holding a single
    /// empty (End-only) device path, index auto-assigned on save.
    pub fn new() -> BootEntry {
        BootEntry {
            modified: true,
            option_type: OptionType::Boot,
            index: None,
            attributes: LOAD_OPTION_ACTIVE,
            description: "Unknown".to_string(),
            paths: vec![EntryPath::new(DevicePath::end_entire())],
            data: Vec::new(),
            name: None,
        }
    }

    /// Wrap a decoded load option with its firmware identity. The entry is
    /// unmodified: it matches what is on disk.
    pub fn from_load_option(option_type: OptionType, index: u16, option: LoadOption) -> BootEntry {
        BootEntry {
            modified: false,
            option_type,
            index: Some(index),
            attributes: option.attributes,
            description: option.description,
            paths: option.paths.into_iter().map(EntryPath::new).collect(),
            data: option.optional_data,
            name: Some(option_type.variable_name(index)),
        }
    }

    /// Encode to the persisted `EFI_LOAD_OPTION` layout.
    pub fn encode(&self) -> Result<Vec<u8>, LoadOptionError> {
        load_option::encode_parts(
            self.attributes,
            &self.description,
            self.paths.iter().map(|p| &p.path),
            &self.data,
        )
    }

    fn recompute_name(&mut self) {
        self.name = self.index.map(|i| self.option_type.variable_name(i));
    }

    /// Variable name, absent until an index is assigned.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn set_type(&mut self, option_type: OptionType) {
        self.option_type = option_type;
        self.recompute_name();
        self.modified = true;
    }

    /// Index, or `None` while auto-assign is pending.
    pub fn index(&self) -> Option<u16> {
        self.index
    }

    pub fn set_index(&mut self, index: Option<u16>) {
        self.index = index;
        self.recompute_name();
        self.modified = true;
    }

    pub fn attributes(&self) -> u32 {
        self.attributes
    }

    pub fn set_attributes(&mut self, attributes: u32) {
        self.attributes = attributes;
        self.modified = true;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
        self.modified = true;
    }

    /// Number of device paths; always at least 1.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn path(&self, index: usize) -> Option<&DevicePath> {
        self.paths.get(index).map(|p| &p.path)
    }

    /// Canonical text of one path, rendered and cached on first call. The
    /// cache lives until the path list changes.
    pub fn path_text(&self, index: usize) -> Option<&str> {
        self.paths.get(index).map(|p| p.text())
    }

    /// Replace the whole device-path list; it must stay non-empty.
    pub fn set_paths(&mut self, paths: Vec<DevicePath>) -> Result<(), BootDevError> {
        if paths.is_empty() {
            return Err(BootDevError::EmptyPathList);
        }
        self.paths = paths.into_iter().map(EntryPath::new).collect();
        self.modified = true;
        Ok(())
    }

    pub fn set_path(&mut self, index: usize, path: DevicePath) -> Result<(), BootDevError> {
        let slot = self
            .paths
            .get_mut(index)
            .ok_or(BootDevError::PathIndex(index))?;
        *slot = EntryPath::new(path);
        self.modified = true;
        Ok(())
    }

    /// Replace the path list from textual representations.
    pub fn set_paths_text<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<(), BootDevError> {
        let paths = texts
            .iter()
            .map(|t| DevicePath::from_text(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.set_paths(paths)
    }

    pub fn set_path_text(&mut self, index: usize, text: &str) -> Result<(), BootDevError> {
        self.set_path(index, DevicePath::from_text(text)?)
    }

    /// Optional data; empty when none.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: &[u8]) {
        self.data = data.to_vec();
        self.modified = true;
    }

    pub fn clear_data(&mut self) {
        self.data.clear();
        self.modified = true;
    }

    /// Whether the in-memory state is ahead of the persisted variable.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn clear_modified(&mut self) {
        self.modified = false;
    }
}

impl Default for BootEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_defaults() {
        let entry = BootEntry::new();
        assert!(entry.is_modified());
        assert_eq!(entry.option_type(), OptionType::Boot);
        assert_eq!(entry.index(), None);
        assert_eq!(entry.name(), None);
        assert_eq!(entry.attributes(), LOAD_OPTION_ACTIVE);
        assert_eq!(entry.description(), "Unknown");
        assert_eq!(entry.path_count(), 1);
        assert_eq!(entry.path(0).unwrap().as_bytes(), [0x7f, 0xff, 0x04, 0x00]);
        assert!(entry.data().is_empty());
    }

    #[test]
    fn entry_name_casing() {
        let mut entry = BootEntry::new();
        entry.set_index(Some(0x000a));
        assert_eq!(entry.name(), Some("Boot000A"));
        entry.set_type(OptionType::Driver);
        assert_eq!(entry.name(), Some("Driver000A"));
        entry.set_type(OptionType::SysPrep);
        assert_eq!(entry.name(), Some("SysPrep000A"));
        entry.set_index(None);
        assert_eq!(entry.name(), None);
    }

    #[test]
    fn order_variable_names() {
        assert_eq!(OptionType::Boot.order_variable(), "BootOrder");
        assert_eq!(OptionType::Driver.order_variable(), "DriverOrder");
        assert_eq!(OptionType::SysPrep.order_variable(), "SysPrepOrder");
        assert_eq!("sysprep".parse(), Ok(OptionType::SysPrep));
        assert!("Boot".parse::<OptionType>().is_err());
    }

    #[test]
    fn path_text_is_cached_until_paths_change() {
        let mut entry = BootEntry::new();
        entry
            .set_paths_text(&["PciRoot(0x0)/Pci(0x1,0x1)/Ata(0x0)"])
            .unwrap();
        assert_eq!(entry.path_text(0), Some("PciRoot(0x0)/Pci(0x1,0x1)/Ata(0x0)"));

        entry
            .set_path_text(0, "PciRoot(0x0)/Pci(0x2,0x0)")
            .unwrap();
        assert_eq!(entry.path_text(0), Some("PciRoot(0x0)/Pci(0x2,0x0)"));
        assert_eq!(entry.path_text(1), None);
    }

    #[test]
    fn empty_path_list_rejected() {
        let mut entry = BootEntry::new();
        assert!(matches!(
            entry.set_paths(Vec::new()),
            Err(BootDevError::EmptyPathList)
        ));
        assert!(matches!(
            entry.set_path(3, DevicePath::end_entire()),
            Err(BootDevError::PathIndex(3))
        ));
        // the failed setters left the entry intact
        assert_eq!(entry.path_count(), 1);
    }

    #[test]
    fn decode_round_trip_preserves_modified_flag() {
        let mut source = BootEntry::new();
        source.set_description("Test entry");
        source
            .set_paths_text(&["PciRoot(0x0)/Pci(0x1,0x1)/Ata(0x0)"])
            .unwrap();
        source.set_data(&[0xca, 0xfe]);
        let record = source.encode().unwrap();

        let entry =
            BootEntry::from_load_option(OptionType::Boot, 0x1234, LoadOption::parse(&record).unwrap());
        assert!(!entry.is_modified());
        assert_eq!(entry.name(), Some("Boot1234"));
        assert_eq!(entry.description(), "Test entry");
        assert_eq!(entry.data(), [0xca, 0xfe]);
        assert_eq!(entry.encode().unwrap(), record);
    }
}
