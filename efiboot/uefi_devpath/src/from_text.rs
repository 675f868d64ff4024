// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Parsing of the UEFI textual device-path representation back into packed
//! node chains.
//!
//! Node names are matched case-sensitively, as the reference parser does. A
//! segment that does not match any known node form is embedded as a file-path
//! node; the caller decides whether such parses are acceptable (see
//! [`DevicePath::from_text`]).

use crate::DevicePath;
use crate::DevicePathError;
use guid::Guid;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use ucs2::Ucs2LeVec;
use uefi_wire::devpath;
use uefi_wire::devpath::AcpiSubType;
use uefi_wire::devpath::DevicePathHeader;
use uefi_wire::devpath::DeviceType;
use uefi_wire::devpath::HardwareSubType;
use uefi_wire::devpath::MediaSubType;
use uefi_wire::devpath::MessagingSubType;
use zerocopy::IntoBytes;

pub(crate) fn text_to_chain(
    text: &str,
    allow_implausible: bool,
) -> Result<DevicePath, DevicePathError> {
    let mut chain = Vec::new();
    for segment in split_segments(text) {
        match segment {
            Segment::InstanceEnd => {
                chain.extend_from_slice(DevicePathHeader::END_INSTANCE.as_bytes())
            }
            Segment::Node(node_text) => {
                let parsed = node_from_text(node_text)?;
                if parsed.is_file_path && !allow_implausible && looks_like_node_call(node_text) {
                    return Err(DevicePathError::ImplausibleFilePath(node_text.to_string()));
                }
                chain.extend_from_slice(&parsed.bytes);
            }
        }
    }
    chain.extend_from_slice(DevicePathHeader::END_ENTIRE.as_bytes());
    Ok(DevicePath(chain))
}

/// A file-path segment that is an optional alphanumeric run followed by a
/// parenthesised tail reads like a misspelled typed-node invocation.
fn looks_like_node_call(text: &str) -> bool {
    let rest = text.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.len() >= 2 && rest.starts_with('(') && rest.ends_with(')')
}

enum Segment<'a> {
    Node(&'a str),
    InstanceEnd,
}

/// Split the textual path on `/` and `,` separators, ignoring both inside
/// parenthesised argument lists (URIs contain slashes).
fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                if start < i {
                    segments.push(Segment::Node(&text[start..i]));
                }
                start = i + 1;
            }
            ',' if depth == 0 => {
                if start < i {
                    segments.push(Segment::Node(&text[start..i]));
                }
                segments.push(Segment::InstanceEnd);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        segments.push(Segment::Node(&text[start..]));
    }
    segments
}

struct ParsedNode {
    bytes: Vec<u8>,
    is_file_path: bool,
}

fn node_from_text(text: &str) -> Result<ParsedNode, DevicePathError> {
    if let Some(open) = text.find('(') {
        if text.ends_with(')') {
            let name = &text[..open];
            let content = &text[open + 1..text.len() - 1];
            if let Some(bytes) = typed_node_from_text(name, content)? {
                return Ok(ParsedNode {
                    bytes,
                    is_file_path: false,
                });
            }
        }
    }
    Ok(ParsedNode {
        bytes: file_path_node(text)?,
        is_file_path: true,
    })
}

fn file_path_node(text: &str) -> Result<Vec<u8>, DevicePathError> {
    let payload = Ucs2LeVec::from(text);
    node(
        DeviceType::MEDIA,
        MediaSubType::FILE.0,
        payload.as_bytes(),
        text,
    )
}

/// Assemble header + payload, rejecting payloads the u16 length field cannot
/// describe.
fn node(
    device_type: DeviceType,
    sub_type: u8,
    payload: &[u8],
    context: &str,
) -> Result<Vec<u8>, DevicePathError> {
    let length = payload
        .len()
        .checked_add(size_of::<DevicePathHeader>())
        .filter(|&len| len <= u16::MAX as usize)
        .ok_or_else(|| DevicePathError::Syntax(context.to_string()))?;
    let mut bytes = DevicePathHeader::new(device_type, sub_type, length as u16)
        .as_bytes()
        .to_vec();
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Split an argument list on top-level commas, trimming whitespace.
fn split_args(content: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in content.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(content[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(content[start..].trim());
    args
}

struct Args<'a>(Vec<&'a str>);

impl<'a> Args<'a> {
    fn get(&self, i: usize) -> &'a str {
        self.0.get(i).copied().unwrap_or("")
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parse a numeric argument: `0x` prefix selects hex, otherwise decimal.
/// An absent argument reads as zero, matching the reference parser.
fn num_u64(arg: &str) -> Result<u64, DevicePathError> {
    let err = || DevicePathError::Number(arg.to_string());
    if arg.is_empty() {
        return Ok(0);
    }
    if let Some(hex) = arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| err())
    } else {
        arg.parse::<u64>().map_err(|_| err())
    }
}

fn num_u32(arg: &str) -> Result<u32, DevicePathError> {
    num_u64(arg)?
        .try_into()
        .map_err(|_| DevicePathError::Number(arg.to_string()))
}

fn num_u16(arg: &str) -> Result<u16, DevicePathError> {
    num_u64(arg)?
        .try_into()
        .map_err(|_| DevicePathError::Number(arg.to_string()))
}

fn num_u8(arg: &str) -> Result<u8, DevicePathError> {
    num_u64(arg)?
        .try_into()
        .map_err(|_| DevicePathError::Number(arg.to_string()))
}

fn guid_arg(arg: &str) -> Result<Guid, DevicePathError> {
    arg.parse::<Guid>().map_err(DevicePathError::Guid)
}

fn hex_blob(arg: &str) -> Result<Vec<u8>, DevicePathError> {
    let err = || DevicePathError::Number(arg.to_string());
    if arg.len() % 2 != 0 {
        return Err(err());
    }
    arg.as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).map_err(|_| err())?;
            u8::from_str_radix(pair, 16).map_err(|_| err())
        })
        .collect()
}

fn ipv4_arg(arg: &str) -> Result<[u8; 4], DevicePathError> {
    if arg.is_empty() {
        return Ok([0; 4]);
    }
    arg.parse::<Ipv4Addr>()
        .map(|ip| ip.octets())
        .map_err(DevicePathError::IpAddress)
}

fn ipv6_arg(arg: &str) -> Result<[u8; 16], DevicePathError> {
    if arg.is_empty() {
        return Ok([0; 16]);
    }
    arg.parse::<Ipv6Addr>()
        .map(|ip| ip.octets())
        .map_err(DevicePathError::IpAddress)
}

fn protocol_arg(arg: &str) -> Result<u16, DevicePathError> {
    match arg {
        "TCP" => Ok(6),
        "UDP" => Ok(17),
        other => num_u16(other),
    }
}

/// Compress a three-letter vendor + four-hex-digit product id (`PNP0A03`)
/// into its 32-bit EISA encoding.
fn eisa_id_arg(arg: &str) -> Option<u32> {
    let bytes = arg.as_bytes();
    if bytes.len() != 7 {
        return None;
    }
    let mut compressed: u32 = 0;
    for (shift, &c) in [(10u32, &bytes[0]), (5, &bytes[1]), (0, &bytes[2])] {
        if !c.is_ascii_uppercase() {
            return None;
        }
        compressed |= (((c - b'A' + 1) as u32) & 0x1f) << shift;
    }
    let product = u16::from_str_radix(&arg[3..], 16).ok()?;
    Some(compressed | (product as u32) << 16)
}

/// Build the payload for a recognized node name, or `None` if the name is
/// not a typed-node form.
fn typed_node_from_text(name: &str, content: &str) -> Result<Option<Vec<u8>>, DevicePathError> {
    // The URI payload is taken verbatim; it may contain commas and spaces.
    if name == "Uri" {
        return Ok(Some(node(
            DeviceType::MESSAGING,
            MessagingSubType::URI.0,
            content.as_bytes(),
            content,
        )?));
    }

    let args = Args(split_args(content));

    let bytes = match name {
        // Hardware
        "Pci" => {
            let payload = devpath::PciDevice {
                device: num_u8(args.get(0))?,
                function: num_u8(args.get(1))?,
            };
            node(
                DeviceType::HARDWARE,
                HardwareSubType::PCI.0,
                payload.as_bytes(),
                content,
            )?
        }
        "PcCard" => {
            let payload = devpath::PcCardDevice {
                function_number: num_u8(args.get(0))?,
            };
            node(
                DeviceType::HARDWARE,
                HardwareSubType::PCCARD.0,
                payload.as_bytes(),
                content,
            )?
        }
        "MemoryMapped" => {
            let payload = devpath::MemoryMappedDevice {
                memory_type: num_u32(args.get(0))?,
                start_address: num_u64(args.get(1))?,
                end_address: num_u64(args.get(2))?,
            };
            node(
                DeviceType::HARDWARE,
                HardwareSubType::MEMORY_MAPPED.0,
                payload.as_bytes(),
                content,
            )?
        }
        "VenHw" => vendor_node(DeviceType::HARDWARE, HardwareSubType::VENDOR.0, &args, content)?,
        "Ctrl" => {
            let payload = devpath::ControllerDevice {
                controller_number: num_u32(args.get(0))?,
            };
            node(
                DeviceType::HARDWARE,
                HardwareSubType::CONTROLLER.0,
                payload.as_bytes(),
                content,
            )?
        }
        "BMC" => {
            let payload = devpath::BmcDevice {
                interface_type: num_u8(args.get(0))?,
                base_address: num_u64(args.get(1))?,
            };
            node(
                DeviceType::HARDWARE,
                HardwareSubType::BMC.0,
                payload.as_bytes(),
                content,
            )?
        }

        // ACPI short-form nodes
        "PciRoot" => acpi_node(0x0a03, args.get(0), content)?,
        "PcieRoot" => acpi_node(0x0a08, args.get(0), content)?,
        "Floppy" => acpi_node(0x0604, args.get(0), content)?,
        "Keyboard" => acpi_node(0x0301, args.get(0), content)?,
        "Serial" => acpi_node(0x0501, args.get(0), content)?,
        "ParallelPort" => acpi_node(0x0401, args.get(0), content)?,
        "Acpi" => {
            let hid_arg = args.get(0);
            let hid = match eisa_id_arg(hid_arg) {
                Some(id) => id,
                None => num_u32(hid_arg)?,
            };
            let payload = devpath::AcpiDevice {
                hid,
                uid: num_u32(args.get(1))?,
            };
            node(
                DeviceType::ACPI,
                AcpiSubType::ACPI.0,
                payload.as_bytes(),
                content,
            )?
        }

        // Messaging
        "Ata" => {
            let payload = if args.len() >= 3 {
                devpath::AtapiDevice {
                    primary_secondary: (args.get(0) == "Secondary") as u8,
                    slave_master: (args.get(1) == "Slave") as u8,
                    lun: num_u16(args.get(2))?,
                }
            } else {
                devpath::AtapiDevice {
                    primary_secondary: 0,
                    slave_master: 0,
                    lun: num_u16(args.get(0))?,
                }
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::ATAPI.0,
                payload.as_bytes(),
                content,
            )?
        }
        "Scsi" => {
            let payload = devpath::ScsiDevice {
                target_id: num_u16(args.get(0))?,
                logical_unit: num_u16(args.get(1))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::SCSI.0,
                payload.as_bytes(),
                content,
            )?
        }
        "Fibre" => {
            let payload = devpath::FibreChannelDevice {
                reserved: 0,
                world_wide_name: num_u64(args.get(0))?,
                lun: num_u64(args.get(1))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::FIBRE_CHANNEL.0,
                payload.as_bytes(),
                content,
            )?
        }
        "I1394" => {
            let arg = args.get(0);
            let hex = arg
                .strip_prefix("0x")
                .or_else(|| arg.strip_prefix("0X"))
                .unwrap_or(arg);
            let guid = if hex.is_empty() {
                0
            } else {
                u64::from_str_radix(hex, 16)
                    .map_err(|_| DevicePathError::Number(arg.to_string()))?
            };
            let payload = devpath::Ieee1394Device { reserved: 0, guid };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::IEEE_1394.0,
                payload.as_bytes(),
                content,
            )?
        }
        "USB" => {
            let payload = devpath::UsbDevice {
                parent_port_number: num_u8(args.get(0))?,
                interface_number: num_u8(args.get(1))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::USB.0,
                payload.as_bytes(),
                content,
            )?
        }
        "UsbClass" => usb_class_node(
            num_u8(args.get(2))?,
            num_u8(args.get(3))?,
            num_u8(args.get(4))?,
            &args,
            content,
        )?,
        "UsbAudio" => usb_class_shortcut(1, &args, content)?,
        "UsbCDCControl" => usb_class_shortcut(2, &args, content)?,
        "UsbHID" => usb_class_shortcut(3, &args, content)?,
        "UsbImage" => usb_class_shortcut(6, &args, content)?,
        "UsbPrinter" => usb_class_shortcut(7, &args, content)?,
        "UsbMassStorage" => usb_class_shortcut(8, &args, content)?,
        "UsbHub" => usb_class_shortcut(9, &args, content)?,
        "UsbCDCData" => usb_class_shortcut(10, &args, content)?,
        "UsbSmartCard" => usb_class_shortcut(11, &args, content)?,
        "UsbVideo" => usb_class_shortcut(14, &args, content)?,
        "UsbDiagnostic" => usb_class_shortcut(220, &args, content)?,
        "UsbWireless" => usb_class_shortcut(224, &args, content)?,
        "UsbDeviceFirmwareUpdate" => usb_class_fw(254, 1, &args, content)?,
        "UsbIrdaBridge" => usb_class_fw(254, 2, &args, content)?,
        "UsbTestAndMeasurement" => usb_class_fw(254, 3, &args, content)?,
        "Unit" => {
            let payload = devpath::LogicalUnitDevice {
                lun: num_u8(args.get(0))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::LOGICAL_UNIT.0,
                payload.as_bytes(),
                content,
            )?
        }
        "Sata" => {
            let payload = devpath::SataDevice {
                hba_port_number: num_u16(args.get(0))?,
                port_multiplier_port_number: num_u16(args.get(1))?,
                lun: num_u16(args.get(2))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::SATA.0,
                payload.as_bytes(),
                content,
            )?
        }
        "MAC" => {
            let raw = hex_blob(args.get(0))?;
            if raw.len() > 32 {
                return Err(DevicePathError::Number(args.get(0).to_string()));
            }
            let mut payload = devpath::MacAddressDevice {
                mac_address: [0; 32],
                if_type: num_u8(args.get(1))?,
            };
            payload.mac_address[..raw.len()].copy_from_slice(&raw);
            node(
                DeviceType::MESSAGING,
                MessagingSubType::MAC_ADDRESS.0,
                payload.as_bytes(),
                content,
            )?
        }
        "IPv4" => {
            let payload = devpath::Ipv4Device {
                local_ip_address: ipv4_arg(args.get(3))?,
                remote_ip_address: ipv4_arg(args.get(0))?,
                local_port: 0,
                remote_port: 0,
                protocol: protocol_arg(args.get(1))?,
                static_ip_address: (args.get(2) == "Static") as u8,
                gateway_ip_address: ipv4_arg(args.get(4))?,
                subnet_mask: ipv4_arg(args.get(5))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::IPV4.0,
                payload.as_bytes(),
                content,
            )?
        }
        "IPv6" => {
            let origin = match args.get(2) {
                "Static" | "" => 0,
                "StatelessAutoConfigure" => 1,
                "StatefulAutoConfigure" => 2,
                other => num_u8(other)?,
            };
            let payload = devpath::Ipv6Device {
                local_ip_address: ipv6_arg(args.get(3))?,
                remote_ip_address: ipv6_arg(args.get(0))?,
                local_port: 0,
                remote_port: 0,
                protocol: protocol_arg(args.get(1))?,
                ip_address_origin: origin,
                prefix_length: num_u8(args.get(4))?,
                gateway_ip_address: ipv6_arg(args.get(5))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::IPV6.0,
                payload.as_bytes(),
                content,
            )?
        }
        "Uart" => {
            let baud = match args.get(0) {
                "DEFAULT" | "" => 0,
                other => num_u64(other)?,
            };
            let data_bits = match args.get(1) {
                "DEFAULT" | "" => 0,
                other => num_u8(other)?,
            };
            let parity = match args.get(2) {
                "D" | "" => 0,
                "N" => 1,
                "E" => 2,
                "O" => 3,
                "M" => 4,
                "S" => 5,
                other => num_u8(other)?,
            };
            let stop_bits = match args.get(3) {
                "D" | "" => 0,
                "1" => 1,
                "1.5" => 2,
                "2" => 3,
                other => num_u8(other)?,
            };
            let payload = devpath::UartDevice {
                reserved: 0,
                baud_rate: baud,
                data_bits,
                parity,
                stop_bits,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::UART.0,
                payload.as_bytes(),
                content,
            )?
        }
        "Vlan" => {
            let payload = devpath::VlanDevice {
                vlan_id: num_u16(args.get(0))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::VLAN.0,
                payload.as_bytes(),
                content,
            )?
        }
        "NVMe" => {
            let eui_text = args.get(1);
            let mut eui = [0u8; 8];
            if !eui_text.is_empty() {
                let parts: Vec<&str> = eui_text.split('-').collect();
                if parts.len() != 8 {
                    return Err(DevicePathError::Number(eui_text.to_string()));
                }
                for (slot, part) in eui.iter_mut().rev().zip(parts) {
                    *slot = u8::from_str_radix(part, 16)
                        .map_err(|_| DevicePathError::Number(part.to_string()))?;
                }
            }
            let payload = devpath::NvmeNamespaceDevice {
                namespace_id: num_u32(args.get(0))?,
                namespace_uuid: u64::from_le_bytes(eui),
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::NVME_NAMESPACE.0,
                payload.as_bytes(),
                content,
            )?
        }
        "UFS" => {
            let payload = devpath::UfsDevice {
                pun: num_u8(args.get(0))?,
                lun: num_u8(args.get(1))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::UFS.0,
                payload.as_bytes(),
                content,
            )?
        }
        "SD" => {
            let payload = devpath::SdDevice {
                slot_number: num_u8(args.get(0))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::SD.0,
                payload.as_bytes(),
                content,
            )?
        }
        "eMMC" => {
            let payload = devpath::EmmcDevice {
                slot_number: num_u8(args.get(0))?,
            };
            node(
                DeviceType::MESSAGING,
                MessagingSubType::EMMC.0,
                payload.as_bytes(),
                content,
            )?
        }

        // Media
        "HD" => {
            let mut signature = [0u8; 16];
            let (format, signature_type) = match args.get(1) {
                "MBR" => {
                    let serial = num_u32(args.get(2))?;
                    signature[..4].copy_from_slice(&serial.to_le_bytes());
                    (devpath::PartitionFormat::MBR, devpath::SignatureType::MBR)
                }
                "GPT" => {
                    signature = guid_arg(args.get(2))?.into();
                    (devpath::PartitionFormat::GPT, devpath::SignatureType::GUID)
                }
                other => (
                    devpath::PartitionFormat(0),
                    devpath::SignatureType(num_u8(other)?),
                ),
            };
            let payload = devpath::HardDriveDevice {
                partition_number: num_u32(args.get(0))?,
                partition_start: num_u64(args.get(3))?,
                partition_size: num_u64(args.get(4))?,
                partition_signature: signature,
                partition_format: format,
                signature_type,
            };
            node(
                DeviceType::MEDIA,
                MediaSubType::HARD_DRIVE.0,
                payload.as_bytes(),
                content,
            )?
        }
        "CDROM" => {
            let payload = devpath::CdromDevice {
                boot_entry: num_u32(args.get(0))?,
                partition_start: num_u64(args.get(1))?,
                partition_size: num_u64(args.get(2))?,
            };
            node(
                DeviceType::MEDIA,
                MediaSubType::CD_ROM.0,
                payload.as_bytes(),
                content,
            )?
        }
        "VenMedia" => vendor_node(DeviceType::MEDIA, MediaSubType::VENDOR.0, &args, content)?,
        "Media" => node(
            DeviceType::MEDIA,
            MediaSubType::MEDIA_PROTOCOL.0,
            guid_arg(args.get(0))?.as_bytes(),
            content,
        )?,
        "Fv" => node(
            DeviceType::MEDIA,
            MediaSubType::PIWG_FIRMWARE_VOLUME.0,
            guid_arg(args.get(0))?.as_bytes(),
            content,
        )?,
        "FvFile" => node(
            DeviceType::MEDIA,
            MediaSubType::PIWG_FIRMWARE_FILE.0,
            guid_arg(args.get(0))?.as_bytes(),
            content,
        )?,
        "Offset" => {
            let payload = devpath::OffsetRangeDevice {
                reserved: 0,
                starting_offset: num_u64(args.get(0))?,
                ending_offset: num_u64(args.get(1))?,
            };
            node(
                DeviceType::MEDIA,
                MediaSubType::RELATIVE_OFFSET_RANGE.0,
                payload.as_bytes(),
                content,
            )?
        }

        // BBS
        "BBS" => {
            let device_type = match args.get(0) {
                "Floppy" => 1,
                "Harddrive" => 2,
                "CDROM" => 3,
                "PCMCIA" => 4,
                "USB" => 5,
                "Network" => 6,
                other => num_u16(other)?,
            };
            let fixed = devpath::BbsDevice {
                device_type,
                status_flag: num_u16(args.get(2))?,
            };
            let mut payload = fixed.as_bytes().to_vec();
            payload.extend_from_slice(args.get(1).as_bytes());
            payload.push(0);
            node(
                DeviceType::BIOS_BOOT_SPEC,
                devpath::BbsSubType::BBS101.0,
                &payload,
                content,
            )?
        }

        // Generic fallback forms
        "Path" => {
            let device_type = DeviceType(num_u8(args.get(0))?);
            generic_node(device_type, &args, 1, content)?
        }
        "HardwarePath" => generic_node(DeviceType::HARDWARE, &args, 0, content)?,
        "AcpiPath" => generic_node(DeviceType::ACPI, &args, 0, content)?,
        "Msg" => generic_node(DeviceType::MESSAGING, &args, 0, content)?,
        "MediaPath" => generic_node(DeviceType::MEDIA, &args, 0, content)?,
        "BbsPath" => generic_node(DeviceType::BIOS_BOOT_SPEC, &args, 0, content)?,

        _ => return Ok(None),
    };

    Ok(Some(bytes))
}

fn acpi_node(product: u16, uid: &str, context: &str) -> Result<Vec<u8>, DevicePathError> {
    let payload = devpath::AcpiDevice {
        hid: devpath::eisa_pnp_id(product),
        uid: num_u32(uid)?,
    };
    node(
        DeviceType::ACPI,
        AcpiSubType::ACPI.0,
        payload.as_bytes(),
        context,
    )
}

fn vendor_node(
    device_type: DeviceType,
    sub_type: u8,
    args: &Args<'_>,
    context: &str,
) -> Result<Vec<u8>, DevicePathError> {
    let mut payload = guid_arg(args.get(0))?.as_bytes().to_vec();
    if !args.get(1).is_empty() {
        payload.extend_from_slice(&hex_blob(args.get(1))?);
    }
    node(device_type, sub_type, &payload, context)
}

fn usb_class_node(
    device_class: u8,
    device_subclass: u8,
    device_protocol: u8,
    args: &Args<'_>,
    context: &str,
) -> Result<Vec<u8>, DevicePathError> {
    let payload = devpath::UsbClassDevice {
        vendor_id: num_u16(args.get(0))?,
        product_id: num_u16(args.get(1))?,
        device_class,
        device_subclass,
        device_protocol,
    };
    node(
        DeviceType::MESSAGING,
        MessagingSubType::USB_CLASS.0,
        payload.as_bytes(),
        context,
    )
}

fn usb_class_shortcut(
    device_class: u8,
    args: &Args<'_>,
    context: &str,
) -> Result<Vec<u8>, DevicePathError> {
    usb_class_node(
        device_class,
        num_u8(args.get(2))?,
        num_u8(args.get(3))?,
        args,
        context,
    )
}

fn usb_class_fw(
    device_class: u8,
    device_subclass: u8,
    args: &Args<'_>,
    context: &str,
) -> Result<Vec<u8>, DevicePathError> {
    usb_class_node(
        device_class,
        device_subclass,
        num_u8(args.get(2))?,
        args,
        context,
    )
}

fn generic_node(
    device_type: DeviceType,
    args: &Args<'_>,
    first: usize,
    context: &str,
) -> Result<Vec<u8>, DevicePathError> {
    let sub_type = num_u8(args.get(first))?;
    let payload = if args.get(first + 1).is_empty() {
        Vec::new()
    } else {
        hex_blob(args.get(first + 1))?
    };
    node(device_type, sub_type, &payload, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_node_bytes(text: &str) -> Vec<u8> {
        let path = DevicePath::from_text(text).unwrap();
        let bytes = path.as_bytes();
        bytes[..bytes.len() - 4].to_vec()
    }

    #[test]
    fn pci_args_are_device_then_function() {
        assert_eq!(
            single_node_bytes("Pci(0x1C,0x2)"),
            [0x01, 0x01, 0x06, 0x00, 0x02, 0x1c]
        );
    }

    #[test]
    fn hex_and_decimal_numbers() {
        assert_eq!(single_node_bytes("Vlan(0x10)"), single_node_bytes("Vlan(16)"));
        assert!(DevicePath::from_text("Vlan(0x10000)").is_err());
        assert!(DevicePath::from_text("Vlan(zz)").is_err());
    }

    #[test]
    fn whitespace_between_args() {
        assert_eq!(
            single_node_bytes("Pci( 0x1 , 0x2 )"),
            single_node_bytes("Pci(0x1,0x2)")
        );
    }

    #[test]
    fn case_of_hex_digits_is_tolerated() {
        assert_eq!(
            single_node_bytes("MAC(525400ac9c41,0x1)"),
            single_node_bytes("MAC(525400AC9C41,0x1)")
        );
    }

    #[test]
    fn acpi_eisa_id_text() {
        // Acpi(PNP0A03,0x0) is the long spelling of PciRoot(0x0)
        assert_eq!(
            single_node_bytes("Acpi(PNP0A03,0x0)"),
            single_node_bytes("PciRoot(0x0)")
        );
    }

    #[test]
    fn ata_one_and_three_arg_forms() {
        assert_eq!(
            single_node_bytes("Ata(0x0)"),
            single_node_bytes("Ata(Primary,Master,0x0)")
        );
        assert_eq!(
            single_node_bytes("Ata(Secondary,Slave,0x1)"),
            [0x03, 0x01, 0x08, 0x00, 0x01, 0x01, 0x01, 0x00]
        );
    }

    #[test]
    fn uri_payload_is_verbatim() {
        let bytes = single_node_bytes("Uri(http://a/b,c d)");
        assert_eq!(&bytes[4..], b"http://a/b,c d");
        assert_eq!(single_node_bytes("Uri()").len(), 4);
    }

    #[test]
    fn unrecognized_names_become_file_paths() {
        let path = DevicePath::from_text_relaxed("NotANode(1)").unwrap();
        let bytes = path.as_bytes();
        assert_eq!(bytes[0], 0x04);
        assert_eq!(bytes[1], 0x04);

        // but plain file paths do not trip the plausibility check
        assert!(DevicePath::from_text(r"\EFI\BOOT\BOOTX64.EFI").is_ok());
    }

    #[test]
    fn empty_text_is_end_only() {
        let path = DevicePath::from_text("").unwrap();
        assert_eq!(path.as_bytes(), [0x7f, 0xff, 0x04, 0x00]);
    }

    #[test]
    fn uart_named_arguments() {
        let bytes = single_node_bytes("Uart(115200,8,N,1)");
        assert_eq!(bytes[0..2], [0x03, 0x0e]);
        assert_eq!(&bytes[8..16], &115200u64.to_le_bytes());
        assert_eq!(bytes[16..19], [8, 1, 1]);
        assert_eq!(
            single_node_bytes("Uart(DEFAULT,DEFAULT,D,D)"),
            single_node_bytes("Uart(0,0,0,0)")
        );
    }

    #[test]
    fn nvme_eui_byte_order() {
        let bytes = single_node_bytes("NVMe(0x1,01-02-03-04-05-06-07-08)");
        // text order is most-significant first
        assert_eq!(bytes[8..16], [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn hd_mbr_form() {
        let bytes = single_node_bytes("HD(1,MBR,0xBE1AFDFA,0x3F,0xFBFC1)");
        assert_eq!(bytes[0..2], [0x04, 0x01]);
        // partition number
        assert_eq!(bytes[4..8], 1u32.to_le_bytes());
        // serial lives in the first four signature bytes
        assert_eq!(bytes[24..28], 0xbe1afdfau32.to_le_bytes());
        // format MBR, signature type MBR
        assert_eq!(bytes[40..42], [0x01, 0x01]);
    }
}
