// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Device-path node layouts, from UEFI spec 10.3 "Device Path Nodes".

use guid::Guid;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

/// Common 4-byte node header. `length` is little-endian and includes the
/// header itself.
#[repr(C, packed)]
#[derive(Copy, Clone, IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct DevicePathHeader {
    pub device_type: DeviceType,
    pub sub_type: u8,
    pub length: [u8; 2],
}

impl DevicePathHeader {
    pub const fn new(device_type: DeviceType, sub_type: u8, length: u16) -> Self {
        DevicePathHeader {
            device_type,
            sub_type,
            length: length.to_le_bytes(),
        }
    }

    pub fn node_length(&self) -> usize {
        u16::from_le_bytes(self.length) as usize
    }

    /// The End-Entire terminator every well-formed path finishes with.
    pub const END_ENTIRE: Self = DevicePathHeader::new(
        DeviceType::END,
        EndSubType::ENTIRE.0,
        size_of::<DevicePathHeader>() as u16,
    );

    /// Separator between instances of a multi-instance path.
    pub const END_INSTANCE: Self = DevicePathHeader::new(
        DeviceType::END,
        EndSubType::INSTANCE.0,
        size_of::<DevicePathHeader>() as u16,
    );
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum DeviceType: u8 {
        HARDWARE = 0x01,
        ACPI = 0x02,
        MESSAGING = 0x03,
        MEDIA = 0x04,
        BIOS_BOOT_SPEC = 0x05,
        END = 0x7F,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum EndSubType: u8 {
        INSTANCE = 0x01,
        ENTIRE = 0xFF,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum HardwareSubType: u8 {
        PCI = 1,
        PCCARD = 2,
        MEMORY_MAPPED = 3,
        VENDOR = 4,
        CONTROLLER = 5,
        BMC = 6,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum AcpiSubType: u8 {
        ACPI = 1,
        EXPANDED_ACPI = 2,
        ADR = 3,
        NVDIMM = 4,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum MessagingSubType: u8 {
        ATAPI = 1,
        SCSI = 2,
        FIBRE_CHANNEL = 3,
        IEEE_1394 = 4,
        USB = 5,
        SAS = 10,
        MAC_ADDRESS = 11,
        IPV4 = 12,
        IPV6 = 13,
        UART = 14,
        USB_CLASS = 15,
        USB_WWID = 16,
        LOGICAL_UNIT = 17,
        SATA = 18,
        ISCSI = 19,
        VLAN = 20,
        FIBRE_CHANNEL_EX = 21,
        SAS_EX = 22,
        NVME_NAMESPACE = 23,
        URI = 24,
        UFS = 25,
        SD = 26,
        BLUETOOTH = 27,
        WIFI = 28,
        EMMC = 29,
        BLUETOOTH_LE = 30,
        DNS = 31,
        NVDIMM = 32,
        REST_SERVICE = 33,
        NVME_OF = 34,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum MediaSubType: u8 {
        HARD_DRIVE = 0x01,
        CD_ROM = 0x02,
        VENDOR = 0x03,
        FILE = 0x04,
        MEDIA_PROTOCOL = 0x05,
        PIWG_FIRMWARE_FILE = 0x06,
        PIWG_FIRMWARE_VOLUME = 0x07,
        RELATIVE_OFFSET_RANGE = 0x08,
        RAM_DISK = 0x09,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum BbsSubType: u8 {
        BBS101 = 0x01,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum PartitionFormat: u8 {
        MBR = 0x01,
        GPT = 0x02,
    }
}

open_enum::open_enum! {
    #[derive(IntoBytes, FromBytes, Immutable, KnownLayout)]
    pub enum SignatureType: u8 {
        NONE = 0x00,
        MBR = 0x01,
        GUID = 0x02,
    }
}

/// Low word shared by every EISA-compressed PNP id.
pub const PNP_EISA_ID_CONST: u32 = 0x41d0;
pub const PNP_EISA_ID_MASK: u32 = 0xffff;

/// Compress a `PNPxxxx` product number into a 32-bit EISA id.
pub const fn eisa_pnp_id(product: u16) -> u32 {
    ((product as u32) << 16) | PNP_EISA_ID_CONST
}

/// Recover the `PNPxxxx` product number from an EISA id.
pub const fn eisa_id_to_num(id: u32) -> u16 {
    (id >> 16) as u16
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct PciDevice {
    pub function: u8,
    pub device: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct PcCardDevice {
    pub function_number: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct MemoryMappedDevice {
    pub memory_type: u32,
    pub start_address: u64,
    pub end_address: u64,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct ControllerDevice {
    pub controller_number: u32,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct BmcDevice {
    pub interface_type: u8,
    pub base_address: u64,
}

/// `_HID`/`_UID` pair with EISA-compressed ids (ACPI "short form").
#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct AcpiDevice {
    pub hid: u32,
    pub uid: u32,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct AtapiDevice {
    pub primary_secondary: u8,
    pub slave_master: u8,
    pub lun: u16,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct ScsiDevice {
    pub target_id: u16,
    pub logical_unit: u16,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct FibreChannelDevice {
    pub reserved: u32,
    pub world_wide_name: u64,
    pub lun: u64,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct Ieee1394Device {
    pub reserved: u32,
    pub guid: u64,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct UsbDevice {
    pub parent_port_number: u8,
    pub interface_number: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct UsbClassDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_class: u8,
    pub device_subclass: u8,
    pub device_protocol: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct LogicalUnitDevice {
    pub lun: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct SataDevice {
    pub hba_port_number: u16,
    pub port_multiplier_port_number: u16,
    pub lun: u16,
}

/// MAC address, padded to the fixed 32-byte wire field.
#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct MacAddressDevice {
    pub mac_address: [u8; 32],
    pub if_type: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct Ipv4Device {
    pub local_ip_address: [u8; 4],
    pub remote_ip_address: [u8; 4],
    pub local_port: u16,
    pub remote_port: u16,
    pub protocol: u16,
    pub static_ip_address: u8,
    pub gateway_ip_address: [u8; 4],
    pub subnet_mask: [u8; 4],
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct Ipv6Device {
    pub local_ip_address: [u8; 16],
    pub remote_ip_address: [u8; 16],
    pub local_port: u16,
    pub remote_port: u16,
    pub protocol: u16,
    pub ip_address_origin: u8,
    pub prefix_length: u8,
    pub gateway_ip_address: [u8; 16],
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct UartDevice {
    pub reserved: u32,
    pub baud_rate: u64,
    pub data_bits: u8,
    pub parity: u8,
    pub stop_bits: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct VlanDevice {
    pub vlan_id: u16,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct NvmeNamespaceDevice {
    pub namespace_id: u32,
    pub namespace_uuid: u64,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct UfsDevice {
    pub pun: u8,
    pub lun: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct SdDevice {
    pub slot_number: u8,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct EmmcDevice {
    pub slot_number: u8,
}

/// Vendor-defined node (hardware, messaging, or media). Vendor data follows
/// the GUID.
#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct VendorDevice {
    pub vendor_guid: Guid,
}

/// The signature field is interpreted per `signature_type`: the first four
/// bytes as a little-endian MBR serial, or all sixteen as a GPT GUID.
#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct HardDriveDevice {
    pub partition_number: u32,
    pub partition_start: u64,
    pub partition_size: u64,
    pub partition_signature: [u8; 16],
    pub partition_format: PartitionFormat,
    pub signature_type: SignatureType,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct CdromDevice {
    pub boot_entry: u32,
    pub partition_start: u64,
    pub partition_size: u64,
}

#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct OffsetRangeDevice {
    pub reserved: u32,
    pub starting_offset: u64,
    pub ending_offset: u64,
}

/// BBS 1.01 legacy-boot node. An ASCII description string follows.
#[repr(C, packed)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Debug, PartialEq)]
pub struct BbsDevice {
    pub device_type: u16,
    pub status_flag: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Node sizes are load-bearing: a wrong payload layout corrupts every
    // header length computed from it.
    #[test]
    fn payload_sizes() {
        assert_eq!(size_of::<DevicePathHeader>(), 4);
        assert_eq!(size_of::<PciDevice>(), 2);
        assert_eq!(size_of::<AcpiDevice>(), 8);
        assert_eq!(size_of::<AtapiDevice>(), 4);
        assert_eq!(size_of::<MacAddressDevice>(), 33);
        assert_eq!(size_of::<Ipv4Device>(), 23);
        assert_eq!(size_of::<Ipv6Device>(), 56);
        assert_eq!(size_of::<UartDevice>(), 15);
        assert_eq!(size_of::<HardDriveDevice>(), 38);
        assert_eq!(size_of::<CdromDevice>(), 20);
        assert_eq!(size_of::<UsbClassDevice>(), 7);
        assert_eq!(size_of::<NvmeNamespaceDevice>(), 12);
        assert_eq!(size_of::<BmcDevice>(), 9);
        assert_eq!(size_of::<OffsetRangeDevice>(), 20);
    }

    #[test]
    fn end_nodes() {
        assert_eq!(DevicePathHeader::END_ENTIRE.as_bytes(), [0x7f, 0xff, 4, 0]);
        assert_eq!(
            DevicePathHeader::END_INSTANCE.as_bytes(),
            [0x7f, 0x01, 4, 0]
        );
    }

    #[test]
    fn eisa_ids() {
        assert_eq!(eisa_pnp_id(0x0a03), 0x0a0341d0);
        assert_eq!(eisa_id_to_num(0x0a0341d0), 0x0a03);
    }
}
