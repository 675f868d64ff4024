// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Borrowed, typed views of individual device-path nodes.
//!
//! Parsing is total over structurally valid nodes: a recognized subtype whose
//! payload does not have the layout the UEFI specification prescribes degrades to the
//! `Unknown` variant of its family rather than failing, so a chain that
//! passed [`validate`](crate::validate) can always be walked and rendered.
//! The `Unknown` variants carry the raw payload, which the text writer emits
//! in the generic hex form.

use crate::DevicePathError;
use guid::Guid;
use ucs2::Ucs2LeSlice;
use uefi_wire::devpath;
use uefi_wire::devpath::AcpiSubType;
use uefi_wire::devpath::DevicePathHeader;
use uefi_wire::devpath::DeviceType;
use uefi_wire::devpath::EndSubType;
use uefi_wire::devpath::HardwareSubType;
use uefi_wire::devpath::MediaSubType;
use uefi_wire::devpath::MessagingSubType;
use zerocopy::FromBytes;

#[derive(Debug, PartialEq)]
pub enum HardwareNode<'a> {
    Pci(devpath::PciDevice),
    PcCard(devpath::PcCardDevice),
    MemoryMapped(devpath::MemoryMappedDevice),
    Vendor {
        vendor_guid: Guid,
        data: &'a [u8],
    },
    Controller(devpath::ControllerDevice),
    Bmc(devpath::BmcDevice),
    Unknown {
        sub_type: HardwareSubType,
        payload: &'a [u8],
    },
}

#[derive(Debug, PartialEq)]
pub enum AcpiNode<'a> {
    /// Short-form `_HID`/`_UID` node (EISA-compressed ids).
    Hid(devpath::AcpiDevice),
    Unknown {
        sub_type: AcpiSubType,
        payload: &'a [u8],
    },
}

#[derive(Debug, PartialEq)]
pub enum MessagingNode<'a> {
    Atapi(devpath::AtapiDevice),
    Scsi(devpath::ScsiDevice),
    FibreChannel(devpath::FibreChannelDevice),
    Ieee1394(devpath::Ieee1394Device),
    Usb(devpath::UsbDevice),
    UsbClass(devpath::UsbClassDevice),
    LogicalUnit(devpath::LogicalUnitDevice),
    Sata(devpath::SataDevice),
    MacAddress(devpath::MacAddressDevice),
    Ipv4(devpath::Ipv4Device),
    Ipv6(devpath::Ipv6Device),
    Uart(devpath::UartDevice),
    Vlan(devpath::VlanDevice),
    NvmeNamespace(devpath::NvmeNamespaceDevice),
    /// Raw ASCII URI, not null-terminated, possibly empty.
    Uri(&'a [u8]),
    Ufs(devpath::UfsDevice),
    Sd(devpath::SdDevice),
    Emmc(devpath::EmmcDevice),
    Unknown {
        sub_type: MessagingSubType,
        payload: &'a [u8],
    },
}

#[derive(Debug, PartialEq)]
pub enum MediaNode<'a> {
    HardDrive(devpath::HardDriveDevice),
    Cdrom(devpath::CdromDevice),
    Vendor {
        vendor_guid: Guid,
        data: &'a [u8],
    },
    /// Null-terminated UCS-2 LE path, rendered verbatim in text form.
    File(&'a Ucs2LeSlice),
    MediaProtocol(Guid),
    PiwgFirmwareFile(Guid),
    PiwgFirmwareVolume(Guid),
    OffsetRange(devpath::OffsetRangeDevice),
    Unknown {
        sub_type: MediaSubType,
        payload: &'a [u8],
    },
}

#[derive(Debug, PartialEq)]
pub enum BbsNode<'a> {
    Bbs101 {
        fixed: devpath::BbsDevice,
        /// ASCII description; a trailing NUL is tolerated and stripped.
        description: &'a [u8],
    },
    Unknown {
        sub_type: u8,
        payload: &'a [u8],
    },
}

/// One parsed device-path node.
#[derive(Debug, PartialEq)]
pub enum DevicePathNode<'a> {
    Hardware(HardwareNode<'a>),
    Acpi(AcpiNode<'a>),
    Messaging(MessagingNode<'a>),
    Media(MediaNode<'a>),
    Bbs(BbsNode<'a>),
    /// Separator between instances of a multi-instance path.
    EndInstance,
    /// Terminator of the whole path.
    EndEntire,
    Unknown {
        device_type: DeviceType,
        sub_type: u8,
        payload: &'a [u8],
    },
}

fn exact<T: FromBytes + zerocopy::Immutable + zerocopy::KnownLayout>(payload: &[u8]) -> Option<T> {
    T::read_from_bytes(payload).ok()
}

impl<'a> DevicePathNode<'a> {
    /// Parse a single node from the front of `data`, returning the node and
    /// the bytes that follow it.
    pub fn parse(data: &'a [u8]) -> Result<(Self, &'a [u8]), DevicePathError> {
        let (header, path_data) =
            DevicePathHeader::read_from_prefix(data).map_err(|_| DevicePathError::Truncated)?;

        let length = header.node_length();
        if length < size_of::<DevicePathHeader>() {
            return Err(DevicePathError::NodeLength);
        }
        if length > data.len() {
            return Err(DevicePathError::NodeOverrun);
        }

        let (payload, remaining) = path_data.split_at(length - size_of::<DevicePathHeader>());

        let node = match header.device_type {
            DeviceType::HARDWARE => {
                DevicePathNode::Hardware(Self::parse_hardware(header.sub_type, payload))
            }
            DeviceType::ACPI => DevicePathNode::Acpi(Self::parse_acpi(header.sub_type, payload)),
            DeviceType::MESSAGING => {
                DevicePathNode::Messaging(Self::parse_messaging(header.sub_type, payload))
            }
            DeviceType::MEDIA => DevicePathNode::Media(Self::parse_media(header.sub_type, payload)),
            DeviceType::BIOS_BOOT_SPEC => {
                DevicePathNode::Bbs(Self::parse_bbs(header.sub_type, payload))
            }
            DeviceType::END => match EndSubType(header.sub_type) {
                EndSubType::ENTIRE => DevicePathNode::EndEntire,
                EndSubType::INSTANCE => DevicePathNode::EndInstance,
                _ => DevicePathNode::Unknown {
                    device_type: DeviceType::END,
                    sub_type: header.sub_type,
                    payload,
                },
            },
            device_type => DevicePathNode::Unknown {
                device_type,
                sub_type: header.sub_type,
                payload,
            },
        };

        Ok((node, remaining))
    }

    fn parse_hardware(sub_type: u8, payload: &'a [u8]) -> HardwareNode<'a> {
        let unknown = || HardwareNode::Unknown {
            sub_type: HardwareSubType(sub_type),
            payload,
        };
        match HardwareSubType(sub_type) {
            HardwareSubType::PCI => exact(payload).map_or_else(unknown, HardwareNode::Pci),
            HardwareSubType::PCCARD => exact(payload).map_or_else(unknown, HardwareNode::PcCard),
            HardwareSubType::MEMORY_MAPPED => {
                exact(payload).map_or_else(unknown, HardwareNode::MemoryMapped)
            }
            HardwareSubType::VENDOR => match Guid::read_from_prefix(payload) {
                Ok((vendor_guid, data)) => HardwareNode::Vendor { vendor_guid, data },
                Err(_) => unknown(),
            },
            HardwareSubType::CONTROLLER => {
                exact(payload).map_or_else(unknown, HardwareNode::Controller)
            }
            HardwareSubType::BMC => exact(payload).map_or_else(unknown, HardwareNode::Bmc),
            _ => unknown(),
        }
    }

    fn parse_acpi(sub_type: u8, payload: &'a [u8]) -> AcpiNode<'a> {
        match AcpiSubType(sub_type) {
            AcpiSubType::ACPI => match exact(payload) {
                Some(dev) => AcpiNode::Hid(dev),
                None => AcpiNode::Unknown {
                    sub_type: AcpiSubType(sub_type),
                    payload,
                },
            },
            sub_type => AcpiNode::Unknown { sub_type, payload },
        }
    }

    fn parse_messaging(sub_type: u8, payload: &'a [u8]) -> MessagingNode<'a> {
        let unknown = || MessagingNode::Unknown {
            sub_type: MessagingSubType(sub_type),
            payload,
        };
        match MessagingSubType(sub_type) {
            MessagingSubType::ATAPI => exact(payload).map_or_else(unknown, MessagingNode::Atapi),
            MessagingSubType::SCSI => exact(payload).map_or_else(unknown, MessagingNode::Scsi),
            MessagingSubType::FIBRE_CHANNEL => {
                exact(payload).map_or_else(unknown, MessagingNode::FibreChannel)
            }
            MessagingSubType::IEEE_1394 => {
                exact(payload).map_or_else(unknown, MessagingNode::Ieee1394)
            }
            MessagingSubType::USB => exact(payload).map_or_else(unknown, MessagingNode::Usb),
            MessagingSubType::USB_CLASS => {
                exact(payload).map_or_else(unknown, MessagingNode::UsbClass)
            }
            MessagingSubType::LOGICAL_UNIT => {
                exact(payload).map_or_else(unknown, MessagingNode::LogicalUnit)
            }
            MessagingSubType::SATA => exact(payload).map_or_else(unknown, MessagingNode::Sata),
            MessagingSubType::MAC_ADDRESS => {
                exact(payload).map_or_else(unknown, MessagingNode::MacAddress)
            }
            MessagingSubType::IPV4 => exact(payload).map_or_else(unknown, MessagingNode::Ipv4),
            MessagingSubType::IPV6 => exact(payload).map_or_else(unknown, MessagingNode::Ipv6),
            MessagingSubType::UART => exact(payload).map_or_else(unknown, MessagingNode::Uart),
            MessagingSubType::VLAN => exact(payload).map_or_else(unknown, MessagingNode::Vlan),
            MessagingSubType::NVME_NAMESPACE => {
                exact(payload).map_or_else(unknown, MessagingNode::NvmeNamespace)
            }
            MessagingSubType::URI => MessagingNode::Uri(payload),
            MessagingSubType::UFS => exact(payload).map_or_else(unknown, MessagingNode::Ufs),
            MessagingSubType::SD => exact(payload).map_or_else(unknown, MessagingNode::Sd),
            MessagingSubType::EMMC => exact(payload).map_or_else(unknown, MessagingNode::Emmc),
            _ => unknown(),
        }
    }

    fn parse_media(sub_type: u8, payload: &'a [u8]) -> MediaNode<'a> {
        let unknown = || MediaNode::Unknown {
            sub_type: MediaSubType(sub_type),
            payload,
        };
        match MediaSubType(sub_type) {
            MediaSubType::HARD_DRIVE => exact(payload).map_or_else(unknown, MediaNode::HardDrive),
            MediaSubType::CD_ROM => exact(payload).map_or_else(unknown, MediaNode::Cdrom),
            MediaSubType::VENDOR => match Guid::read_from_prefix(payload) {
                Ok((vendor_guid, data)) => MediaNode::Vendor { vendor_guid, data },
                Err(_) => unknown(),
            },
            MediaSubType::FILE => match Ucs2LeSlice::from_slice_with_nul(payload) {
                Ok(path) if path.as_bytes().len() == payload.len() => MediaNode::File(path),
                _ => unknown(),
            },
            MediaSubType::MEDIA_PROTOCOL => {
                exact(payload).map_or_else(unknown, MediaNode::MediaProtocol)
            }
            MediaSubType::PIWG_FIRMWARE_FILE => {
                exact(payload).map_or_else(unknown, MediaNode::PiwgFirmwareFile)
            }
            MediaSubType::PIWG_FIRMWARE_VOLUME => {
                exact(payload).map_or_else(unknown, MediaNode::PiwgFirmwareVolume)
            }
            MediaSubType::RELATIVE_OFFSET_RANGE => {
                exact(payload).map_or_else(unknown, MediaNode::OffsetRange)
            }
            _ => unknown(),
        }
    }

    fn parse_bbs(sub_type: u8, payload: &'a [u8]) -> BbsNode<'a> {
        if sub_type == devpath::BbsSubType::BBS101.0 {
            if let Ok((fixed, description)) = devpath::BbsDevice::read_from_prefix(payload) {
                let description = match description.split_last() {
                    Some((0, stripped)) => stripped,
                    _ => description,
                };
                return BbsNode::Bbs101 { fixed, description };
            }
        }
        BbsNode::Unknown { sub_type, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pci() {
        let raw = [0x01, 0x01, 0x06, 0x00, 0x01, 0x02, 0xaa];
        let (node, rest) = DevicePathNode::parse(&raw).unwrap();
        assert_eq!(rest, [0xaa]);
        assert_eq!(
            node,
            DevicePathNode::Hardware(HardwareNode::Pci(devpath::PciDevice {
                function: 1,
                device: 2,
            }))
        );
    }

    #[test]
    fn parse_end() {
        let raw = [0x7f, 0xff, 0x04, 0x00];
        let (node, rest) = DevicePathNode::parse(&raw).unwrap();
        assert!(rest.is_empty());
        assert_eq!(node, DevicePathNode::EndEntire);
    }

    #[test]
    fn undersized_length_field() {
        let raw = [0x01, 0x01, 0x03, 0x00, 0x01];
        assert!(matches!(
            DevicePathNode::parse(&raw),
            Err(DevicePathError::NodeLength)
        ));
    }

    #[test]
    fn length_overruns_buffer() {
        let raw = [0x01, 0x01, 0x08, 0x00, 0x01];
        assert!(matches!(
            DevicePathNode::parse(&raw),
            Err(DevicePathError::NodeOverrun)
        ));
    }

    #[test]
    fn bad_payload_degrades_to_unknown() {
        // PCI subtype with a 1-byte payload: not a PciDevice
        let raw = [0x01, 0x01, 0x05, 0x00, 0x01];
        let (node, _) = DevicePathNode::parse(&raw).unwrap();
        assert_eq!(
            node,
            DevicePathNode::Hardware(HardwareNode::Unknown {
                sub_type: HardwareSubType::PCI,
                payload: &[0x01],
            })
        );
    }

    #[test]
    fn unknown_type_keeps_payload() {
        let raw = [0x6f, 0x22, 0x06, 0x00, 0xde, 0xad];
        let (node, _) = DevicePathNode::parse(&raw).unwrap();
        assert_eq!(
            node,
            DevicePathNode::Unknown {
                device_type: DeviceType(0x6f),
                sub_type: 0x22,
                payload: &[0xde, 0xad],
            }
        );
    }
}
