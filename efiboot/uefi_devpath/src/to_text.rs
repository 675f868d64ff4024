// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rendering of device paths into the UEFI textual representation.
//!
//! Output casing follows the reference text forms: hex values are upper-case
//! with a `0x` prefix, GUIDs are upper-case 8-4-4-4-12 groups, and type or
//! subtype numbers in the generic fallback forms are decimal.

use crate::node::AcpiNode;
use crate::node::BbsNode;
use crate::node::DevicePathNode;
use crate::node::HardwareNode;
use crate::node::MediaNode;
use crate::node::MessagingNode;
use crate::DevicePath;
use guid::Guid;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use uefi_wire::devpath;
use uefi_wire::devpath::DeviceType;

pub(crate) fn chain_to_text(
    path: &DevicePath,
    display_only: bool,
    allow_shortcuts: bool,
) -> String {
    let mut out = String::new();
    for node in path.nodes() {
        if let DevicePathNode::EndInstance = node {
            out.push(',');
            continue;
        }
        if !out.is_empty() && !out.ends_with(',') {
            out.push('/');
        }
        node_to_text(&mut out, &node, display_only, allow_shortcuts);
    }
    out
}

fn node_to_text(
    out: &mut String,
    node: &DevicePathNode<'_>,
    display_only: bool,
    allow_shortcuts: bool,
) {
    match node {
        DevicePathNode::Hardware(hw) => hardware_to_text(out, hw),
        DevicePathNode::Acpi(acpi) => acpi_to_text(out, acpi),
        DevicePathNode::Messaging(msg) => messaging_to_text(out, msg, display_only, allow_shortcuts),
        DevicePathNode::Media(media) => media_to_text(out, media, display_only),
        DevicePathNode::Bbs(bbs) => bbs_to_text(out, bbs, display_only),
        DevicePathNode::Unknown {
            device_type,
            sub_type,
            payload,
        } => generic_to_text(out, Some(*device_type), *sub_type, payload),
        // Handled by the chain loop.
        DevicePathNode::EndInstance | DevicePathNode::EndEntire => {}
    }
}

/// The generic fallback form: a per-type family name for recognized types,
/// `Path(type,subtype,…)` otherwise, with the payload as a hex blob.
pub(crate) fn generic_to_text(
    out: &mut String,
    device_type: Option<DeviceType>,
    sub_type: u8,
    payload: &[u8],
) {
    let family = device_type.and_then(|t| match t {
        DeviceType::HARDWARE => Some("HardwarePath"),
        DeviceType::ACPI => Some("AcpiPath"),
        DeviceType::MESSAGING => Some("Msg"),
        DeviceType::MEDIA => Some("MediaPath"),
        DeviceType::BIOS_BOOT_SPEC => Some("BbsPath"),
        _ => None,
    });
    match (family, device_type) {
        (Some(family), _) => out.push_str(&format!("{family}({sub_type}")),
        (None, Some(device_type)) => {
            out.push_str(&format!("Path({},{sub_type}", device_type.0))
        }
        (None, None) => unreachable!(),
    }
    if !payload.is_empty() {
        out.push(',');
        push_hex(out, payload);
    }
    out.push(')');
}

fn push_hex(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
}

fn push_guid(out: &mut String, guid: &Guid) {
    out.push_str(&format!("{guid:#}"));
}

fn hardware_to_text(out: &mut String, node: &HardwareNode<'_>) {
    match node {
        HardwareNode::Pci(pci) => {
            let (device, function) = (pci.device, pci.function);
            out.push_str(&format!("Pci(0x{device:X},0x{function:X})"));
        }
        HardwareNode::PcCard(pccard) => {
            out.push_str(&format!("PcCard(0x{:X})", pccard.function_number));
        }
        HardwareNode::MemoryMapped(mm) => {
            let (ty, start, end) = (mm.memory_type, mm.start_address, mm.end_address);
            out.push_str(&format!("MemoryMapped(0x{ty:X},0x{start:X},0x{end:X})"));
        }
        HardwareNode::Vendor { vendor_guid, data } => {
            out.push_str("VenHw(");
            push_guid(out, vendor_guid);
            if !data.is_empty() {
                out.push(',');
                push_hex(out, data);
            }
            out.push(')');
        }
        HardwareNode::Controller(ctrl) => {
            let controller = ctrl.controller_number;
            out.push_str(&format!("Ctrl(0x{controller:X})"));
        }
        HardwareNode::Bmc(bmc) => {
            let (ty, base) = (bmc.interface_type, bmc.base_address);
            out.push_str(&format!("BMC(0x{ty:X},0x{base:X})"));
        }
        HardwareNode::Unknown { sub_type, payload } => {
            generic_to_text(out, Some(DeviceType::HARDWARE), sub_type.0, payload)
        }
    }
}

fn acpi_to_text(out: &mut String, node: &AcpiNode<'_>) {
    match node {
        AcpiNode::Hid(acpi) => {
            let (hid, uid) = (acpi.hid, acpi.uid);
            if hid & devpath::PNP_EISA_ID_MASK == devpath::PNP_EISA_ID_CONST {
                let text = match devpath::eisa_id_to_num(hid) {
                    0x0a03 => Some("PciRoot"),
                    0x0a08 => Some("PcieRoot"),
                    0x0604 => Some("Floppy"),
                    0x0301 => Some("Keyboard"),
                    0x0501 => Some("Serial"),
                    0x0401 => Some("ParallelPort"),
                    _ => None,
                };
                match text {
                    Some(name) => out.push_str(&format!("{name}(0x{uid:X})")),
                    None => out.push_str(&format!(
                        "Acpi(PNP{:04X},0x{uid:X})",
                        devpath::eisa_id_to_num(hid)
                    )),
                }
            } else {
                out.push_str(&format!("Acpi(0x{hid:08X},0x{uid:X})"));
            }
        }
        AcpiNode::Unknown { sub_type, payload } => {
            generic_to_text(out, Some(DeviceType::ACPI), sub_type.0, payload)
        }
    }
}

fn network_protocol(out: &mut String, protocol: u16) {
    match protocol {
        6 => out.push_str("TCP"),
        17 => out.push_str("UDP"),
        other => out.push_str(&format!("0x{other:X}")),
    }
}

fn messaging_to_text(
    out: &mut String,
    node: &MessagingNode<'_>,
    display_only: bool,
    allow_shortcuts: bool,
) {
    match node {
        MessagingNode::Atapi(atapi) => {
            let lun = atapi.lun;
            if display_only {
                out.push_str(&format!("Ata(0x{lun:X})"));
            } else {
                out.push_str(&format!(
                    "Ata({},{},0x{lun:X})",
                    if atapi.primary_secondary == 1 {
                        "Secondary"
                    } else {
                        "Primary"
                    },
                    if atapi.slave_master == 1 {
                        "Slave"
                    } else {
                        "Master"
                    },
                ));
            }
        }
        MessagingNode::Scsi(scsi) => {
            let (pun, lun) = (scsi.target_id, scsi.logical_unit);
            out.push_str(&format!("Scsi(0x{pun:X},0x{lun:X})"));
        }
        MessagingNode::FibreChannel(fibre) => {
            let (wwn, lun) = (fibre.world_wide_name, fibre.lun);
            out.push_str(&format!("Fibre(0x{wwn:X},0x{lun:X})"));
        }
        MessagingNode::Ieee1394(fw) => {
            let guid = fw.guid;
            out.push_str(&format!("I1394({guid:X})"));
        }
        MessagingNode::Usb(usb) => {
            let (port, iface) = (usb.parent_port_number, usb.interface_number);
            out.push_str(&format!("USB(0x{port:X},0x{iface:X})"));
        }
        MessagingNode::UsbClass(class) => usb_class_to_text(out, class, allow_shortcuts),
        MessagingNode::LogicalUnit(unit) => {
            out.push_str(&format!("Unit(0x{:X})", unit.lun));
        }
        MessagingNode::Sata(sata) => {
            let (port, pmp, lun) = (
                sata.hba_port_number,
                sata.port_multiplier_port_number,
                sata.lun,
            );
            out.push_str(&format!("Sata(0x{port:X},0x{pmp:X},0x{lun:X})"));
        }
        MessagingNode::MacAddress(mac) => {
            // Only 6 bytes are meaningful for ethernet-like interface types.
            let len = if mac.if_type <= 1 { 6 } else { 32 };
            out.push_str("MAC(");
            push_hex(out, &mac.mac_address[..len]);
            out.push_str(&format!(",0x{:X})", mac.if_type));
        }
        MessagingNode::Ipv4(ip) => {
            out.push_str(&format!("IPv4({}", Ipv4Addr::from(ip.remote_ip_address)));
            if !display_only {
                out.push(',');
                network_protocol(out, ip.protocol);
                out.push_str(if ip.static_ip_address != 0 {
                    ",Static,"
                } else {
                    ",DHCP,"
                });
                out.push_str(&format!(
                    "{},{},{}",
                    Ipv4Addr::from(ip.local_ip_address),
                    Ipv4Addr::from(ip.gateway_ip_address),
                    Ipv4Addr::from(ip.subnet_mask),
                ));
            }
            out.push(')');
        }
        MessagingNode::Ipv6(ip) => {
            out.push_str(&format!("IPv6({}", Ipv6Addr::from(ip.remote_ip_address)));
            if !display_only {
                out.push(',');
                network_protocol(out, ip.protocol);
                out.push_str(match ip.ip_address_origin {
                    0 => ",Static,",
                    1 => ",StatelessAutoConfigure,",
                    _ => ",StatefulAutoConfigure,",
                });
                out.push_str(&format!(
                    "{},0x{:X},{}",
                    Ipv6Addr::from(ip.local_ip_address),
                    ip.prefix_length,
                    Ipv6Addr::from(ip.gateway_ip_address),
                ));
            }
            out.push(')');
        }
        MessagingNode::Uart(uart) => {
            out.push_str("Uart(");
            let baud = uart.baud_rate;
            if baud == 0 {
                out.push_str("DEFAULT,");
            } else {
                out.push_str(&format!("{baud},"));
            }
            if uart.data_bits == 0 {
                out.push_str("DEFAULT,");
            } else {
                out.push_str(&format!("{},", uart.data_bits));
            }
            match uart.parity {
                0 => out.push_str("D,"),
                1 => out.push_str("N,"),
                2 => out.push_str("E,"),
                3 => out.push_str("O,"),
                4 => out.push_str("M,"),
                5 => out.push_str("S,"),
                other => out.push_str(&format!("0x{other:X},")),
            }
            match uart.stop_bits {
                0 => out.push('D'),
                1 => out.push('1'),
                2 => out.push_str("1.5"),
                3 => out.push('2'),
                other => out.push_str(&format!("0x{other:X}")),
            }
            out.push(')');
        }
        MessagingNode::Vlan(vlan) => {
            let vlan_id = vlan.vlan_id;
            out.push_str(&format!("Vlan({vlan_id})"));
        }
        MessagingNode::NvmeNamespace(nvme) => {
            let nsid = nvme.namespace_id;
            let eui = nvme.namespace_uuid.to_le_bytes();
            out.push_str(&format!(
                "NVMe(0x{nsid:X},{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X})",
                eui[7], eui[6], eui[5], eui[4], eui[3], eui[2], eui[1], eui[0]
            ));
        }
        MessagingNode::Uri(uri) => {
            out.push_str("Uri(");
            out.push_str(&String::from_utf8_lossy(uri));
            out.push(')');
        }
        MessagingNode::Ufs(ufs) => {
            out.push_str(&format!("UFS(0x{:X},0x{:X})", ufs.pun, ufs.lun));
        }
        MessagingNode::Sd(sd) => {
            out.push_str(&format!("SD(0x{:X})", sd.slot_number));
        }
        MessagingNode::Emmc(emmc) => {
            out.push_str(&format!("eMMC(0x{:X})", emmc.slot_number));
        }
        MessagingNode::Unknown { sub_type, payload } => {
            generic_to_text(out, Some(DeviceType::MESSAGING), sub_type.0, payload)
        }
    }
}

fn usb_class_to_text(out: &mut String, class: &devpath::UsbClassDevice, allow_shortcuts: bool) {
    let (vid, pid) = (class.vendor_id, class.product_id);
    if allow_shortcuts {
        let name = match class.device_class {
            1 => Some("UsbAudio"),
            2 => Some("UsbCDCControl"),
            3 => Some("UsbHID"),
            6 => Some("UsbImage"),
            7 => Some("UsbPrinter"),
            8 => Some("UsbMassStorage"),
            9 => Some("UsbHub"),
            10 => Some("UsbCDCData"),
            11 => Some("UsbSmartCard"),
            14 => Some("UsbVideo"),
            220 => Some("UsbDiagnostic"),
            224 => Some("UsbWireless"),
            _ => None,
        };
        if let Some(name) = name {
            out.push_str(&format!(
                "{name}(0x{vid:X},0x{pid:X},0x{:X},0x{:X})",
                class.device_subclass, class.device_protocol
            ));
            return;
        }
        if class.device_class == 254 {
            let name = match class.device_subclass {
                1 => Some("UsbDeviceFirmwareUpdate"),
                2 => Some("UsbIrdaBridge"),
                3 => Some("UsbTestAndMeasurement"),
                _ => None,
            };
            if let Some(name) = name {
                out.push_str(&format!(
                    "{name}(0x{vid:X},0x{pid:X},0x{:X})",
                    class.device_protocol
                ));
                return;
            }
        }
    }
    out.push_str(&format!(
        "UsbClass(0x{vid:X},0x{pid:X},0x{:X},0x{:X},0x{:X})",
        class.device_class, class.device_subclass, class.device_protocol
    ));
}

fn media_to_text(out: &mut String, node: &MediaNode<'_>, display_only: bool) {
    match node {
        MediaNode::HardDrive(hd) => {
            let part = hd.partition_number;
            let (start, size) = (hd.partition_start, hd.partition_size);
            out.push_str(&format!("HD({part},"));
            match hd.signature_type {
                devpath::SignatureType::MBR => {
                    let sig = hd.partition_signature;
                    let serial = u32::from_le_bytes(sig[..4].try_into().unwrap());
                    out.push_str(&format!("MBR,0x{serial:08X},"));
                }
                devpath::SignatureType::GUID => {
                    out.push_str("GPT,");
                    push_guid(out, &Guid::from(hd.partition_signature));
                    out.push(',');
                }
                other => {
                    out.push_str(&format!("{},0,", other.0));
                }
            }
            out.push_str(&format!("0x{start:X},0x{size:X})"));
        }
        MediaNode::Cdrom(cd) => {
            let entry = cd.boot_entry;
            if display_only {
                out.push_str(&format!("CDROM(0x{entry:X})"));
            } else {
                let (start, size) = (cd.partition_start, cd.partition_size);
                out.push_str(&format!("CDROM(0x{entry:X},0x{start:X},0x{size:X})"));
            }
        }
        MediaNode::Vendor { vendor_guid, data } => {
            out.push_str("VenMedia(");
            push_guid(out, vendor_guid);
            if !data.is_empty() {
                out.push(',');
                push_hex(out, data);
            }
            out.push(')');
        }
        MediaNode::File(path) => {
            out.push_str(&path.to_string());
        }
        MediaNode::MediaProtocol(guid) => {
            out.push_str("Media(");
            push_guid(out, guid);
            out.push(')');
        }
        MediaNode::PiwgFirmwareFile(guid) => {
            out.push_str("FvFile(");
            push_guid(out, guid);
            out.push(')');
        }
        MediaNode::PiwgFirmwareVolume(guid) => {
            out.push_str("Fv(");
            push_guid(out, guid);
            out.push(')');
        }
        MediaNode::OffsetRange(range) => {
            let (start, end) = (range.starting_offset, range.ending_offset);
            out.push_str(&format!("Offset(0x{start:X},0x{end:X})"));
        }
        MediaNode::Unknown { sub_type, payload } => {
            generic_to_text(out, Some(DeviceType::MEDIA), sub_type.0, payload)
        }
    }
}

fn bbs_to_text(out: &mut String, node: &BbsNode<'_>, display_only: bool) {
    match node {
        BbsNode::Bbs101 { fixed, description } => {
            let device_type = fixed.device_type;
            out.push_str("BBS(");
            match device_type {
                1 => out.push_str("Floppy"),
                2 => out.push_str("Harddrive"),
                3 => out.push_str("CDROM"),
                4 => out.push_str("PCMCIA"),
                5 => out.push_str("USB"),
                6 => out.push_str("Network"),
                other => out.push_str(&format!("0x{other:X}")),
            }
            out.push(',');
            out.push_str(&String::from_utf8_lossy(description));
            if !display_only {
                let flags = fixed.status_flag;
                out.push_str(&format!(",0x{flags:X}"));
            }
            out.push(')');
        }
        BbsNode::Unknown { sub_type, payload } => {
            generic_to_text(out, Some(DeviceType::BIOS_BOOT_SPEC), *sub_type, payload)
        }
    }
}
