// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! UEFI device-path codec: binary validation and the round-trip between the
//! packed node-chain representation and the textual representation defined by
//! the UEFI specification ("Device Path Text Representation").
//!
//! A device path is a sequence of typed, length-prefixed nodes terminated by
//! an End-Entire node:
//!
//! ```text
//! u8 type | u8 sub_type | u16le length | (length - 4) payload bytes
//! ```
//!
//! [`DevicePath`] owns one validated chain. [`validate`] checks raw bytes
//! without allocating. Text conversion goes through
//! [`DevicePath::to_text`] and [`DevicePath::from_text`]; e.g.
//! `PciRoot(0x0)/Pci(0x1,0x1)/Ata(0x0)` or
//! `HD(1,GPT,C8F57909-D589-41A1-9958-44C7F229E150,0x800,0x12C000)/\EFI\fedora\shimx64.efi`.

#![forbid(unsafe_code)]

pub mod node;

mod from_text;
mod to_text;

pub use node::DevicePathNode;

use thiserror::Error;
use uefi_wire::devpath::DevicePathHeader;
use uefi_wire::devpath::DeviceType;
use uefi_wire::devpath::EndSubType;
use zerocopy::FromBytes;
use zerocopy::IntoBytes;

/// Errors produced by the binary and textual device-path codecs.
#[derive(Debug, Error)]
pub enum DevicePathError {
    #[error("buffer too small to hold a device path node")]
    Truncated,
    #[error("node length field smaller than the 4-byte header")]
    NodeLength,
    #[error("node extends past the end of its buffer")]
    NodeOverrun,
    #[error("malformed device path text near `{0}`")]
    Syntax(String),
    #[error("invalid numeric argument `{0}`")]
    Number(String),
    #[error("invalid GUID argument")]
    Guid(#[source] guid::ParseError),
    #[error("invalid IP address argument")]
    IpAddress(#[source] std::net::AddrParseError),
    #[error("`{0}` parses as a file path but looks like an unrecognized node type")]
    ImplausibleFilePath(String),
}

/// Walk the nodes of a chain within `bytes[..limit]`, returning the byte size
/// of the chain (End-Entire included).
fn walk_chain(bytes: &[u8], limit: usize) -> Result<usize, DevicePathError> {
    let mut offset = 0;
    loop {
        if limit - offset < size_of::<DevicePathHeader>() {
            return Err(DevicePathError::Truncated);
        }
        let (header, _) = DevicePathHeader::read_from_prefix(&bytes[offset..limit])
            .map_err(|_| DevicePathError::Truncated)?;
        let length = header.node_length();

        if header.device_type == DeviceType::END && EndSubType(header.sub_type) == EndSubType::ENTIRE
        {
            // The terminator's length field must be exactly the header size.
            if length != size_of::<DevicePathHeader>() {
                return Err(DevicePathError::NodeLength);
            }
            return Ok(offset + length);
        }

        if length < size_of::<DevicePathHeader>() {
            return Err(DevicePathError::NodeLength);
        }
        // The node must fit, with room left for a terminator.
        if length > limit - offset || limit - offset - length < size_of::<DevicePathHeader>() {
            return Err(DevicePathError::NodeOverrun);
        }
        offset += length;
    }
}

/// Check whether a prefix of `bytes` forms a well-formed device-path chain.
///
/// `max_len` bounds how many bytes of `bytes` may be examined; `0` means
/// unbounded (the whole slice). An End-only chain is valid.
pub fn validate(bytes: &[u8], max_len: usize) -> bool {
    let limit = if max_len == 0 || max_len > bytes.len() {
        bytes.len()
    } else {
        max_len
    };
    walk_chain(bytes, limit).is_ok()
}

/// An owned, validated device-path chain, End-Entire terminator included.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DevicePath(Vec<u8>);

impl DevicePath {
    /// Validate and copy exactly one chain from the front of `bytes`,
    /// ignoring anything that follows it.
    pub fn from_bytes(bytes: &[u8]) -> Result<DevicePath, DevicePathError> {
        let (path, _) = DevicePath::parse_prefix(bytes)?;
        Ok(path)
    }

    /// Validate and copy one chain from the front of `bytes`, returning the
    /// chain and the remaining bytes. Used to carve up a load option's
    /// FilePathList region.
    pub fn parse_prefix(bytes: &[u8]) -> Result<(DevicePath, &[u8]), DevicePathError> {
        let size = walk_chain(bytes, bytes.len())?;
        let (chain, rest) = bytes.split_at(size);
        Ok((DevicePath(chain.to_vec()), rest))
    }

    /// A chain holding nothing but the End-Entire terminator. This is the
    /// path list a freshly created boot entry carries.
    pub fn end_entire() -> DevicePath {
        DevicePath(DevicePathHeader::END_ENTIRE.as_bytes().to_vec())
    }

    /// The full wire representation, End node included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte size of the chain, End node included.
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the non-terminator nodes of the chain.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { rest: &self.0 }
    }

    /// Render the canonical textual representation.
    ///
    /// `display_only` selects the spec's abbreviated display forms of some
    /// nodes (`Ata`, `IPv4`, `IPv6`, `CDROM`, `BBS`); `allow_shortcuts`
    /// selects friendly shortcut names (the USB class nodes). The UEFI
    /// specification is remarkably vague on the difference between the two;
    /// they are honored independently as inputs to the rendering rules.
    pub fn to_text(&self, display_only: bool, allow_shortcuts: bool) -> String {
        to_text::chain_to_text(self, display_only, allow_shortcuts)
    }

    /// Parse the textual representation into a newly allocated chain.
    ///
    /// Text that does not match any recognized node form becomes a file-path
    /// node, which is spec-conformant but usually user error (a misspelled
    /// node name silently turns into a filename). This constructor therefore
    /// rejects such parses with [`DevicePathError::ImplausibleFilePath`] when
    /// the file-path text still looks like a `Name(...)` node invocation; use
    /// [`DevicePath::from_text_relaxed`] to accept them.
    pub fn from_text(text: &str) -> Result<DevicePath, DevicePathError> {
        from_text::text_to_chain(text, false)
    }

    /// Like [`DevicePath::from_text`], but without the plausibility check.
    pub fn from_text_relaxed(text: &str) -> Result<DevicePath, DevicePathError> {
        from_text::text_to_chain(text, true)
    }
}

impl std::fmt::Debug for DevicePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text(false, false))
    }
}

impl std::fmt::Display for DevicePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text(false, true))
    }
}

/// Iterator over the nodes of a validated chain, End-Entire excluded.
pub struct Nodes<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Nodes<'a> {
    type Item = DevicePathNode<'a>;

    fn next(&mut self) -> Option<DevicePathNode<'a>> {
        match DevicePathNode::parse(self.rest) {
            Ok((DevicePathNode::EndEntire, _)) | Err(_) => None,
            Ok((node, rest)) => {
                self.rest = rest;
                Some(node)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // PciRoot(0x0)/Pci(0x1,0x1)/Ata(0x0)
    const HDD_PATH: &[u8] = &[
        0x02, 0x01, 0x0c, 0x00, 0xd0, 0x41, 0x03, 0x0a, 0x00, 0x00, 0x00, 0x00, // PciRoot
        0x01, 0x01, 0x06, 0x00, 0x01, 0x01, // Pci
        0x03, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, // Ata
        0x7f, 0xff, 0x04, 0x00, // End
    ];

    const END_ONLY: &[u8] = &[0x7f, 0xff, 0x04, 0x00];

    #[test]
    fn validate_well_formed() {
        assert!(validate(HDD_PATH, 0));
        assert!(validate(HDD_PATH, HDD_PATH.len()));
        // Trailing garbage after the End node is outside the chain.
        let mut extra = HDD_PATH.to_vec();
        extra.extend_from_slice(&[1, 2, 3]);
        assert!(validate(&extra, 0));
        assert_eq!(
            DevicePath::from_bytes(&extra).unwrap().as_bytes(),
            HDD_PATH
        );
    }

    #[test]
    fn validate_end_only() {
        assert!(validate(END_ONLY, 0));
        let path = DevicePath::end_entire();
        assert_eq!(path.as_bytes(), END_ONLY);
        assert_eq!(path.byte_len(), 4);
        assert_eq!(path.nodes().count(), 0);
    }

    #[test]
    fn validate_rejects_short_length() {
        let mut bad = HDD_PATH.to_vec();
        bad[14] = 3; // Pci node length -> 3
        assert!(!validate(&bad, 0));
        assert!(matches!(
            DevicePath::from_bytes(&bad),
            Err(DevicePathError::NodeLength)
        ));
    }

    #[test]
    fn validate_rejects_overrun() {
        let mut bad = HDD_PATH.to_vec();
        bad[14] = 0x40; // Pci node length past the buffer
        assert!(!validate(&bad, 0));
        assert!(matches!(
            DevicePath::from_bytes(&bad),
            Err(DevicePathError::NodeOverrun)
        ));
    }

    #[test]
    fn validate_rejects_missing_end() {
        // Dropping the End node leaves the last real node with no room for a
        // terminator after it.
        let truncated = &HDD_PATH[..HDD_PATH.len() - 4];
        assert!(!validate(truncated, 0));
        assert!(matches!(
            DevicePath::from_bytes(truncated),
            Err(DevicePathError::NodeOverrun)
        ));
    }

    #[test]
    fn validate_rejects_bad_end_length() {
        for bad_len in [0u8, 1, 5] {
            let mut bad = HDD_PATH.to_vec();
            bad[28] = bad_len;
            assert!(!validate(&bad, 0), "end length {bad_len}");
        }
    }

    #[test]
    fn validate_honors_max_len() {
        // Limit cuts into the chain.
        assert!(!validate(HDD_PATH, HDD_PATH.len() - 1));
        assert!(!validate(HDD_PATH, 5));
    }

    #[test]
    fn parse_prefix_splits_concatenated_chains() {
        let mut two = HDD_PATH.to_vec();
        two.extend_from_slice(END_ONLY);
        let (first, rest) = DevicePath::parse_prefix(&two).unwrap();
        assert_eq!(first.as_bytes(), HDD_PATH);
        assert_eq!(rest, END_ONLY);
        let (second, rest) = DevicePath::parse_prefix(rest).unwrap();
        assert_eq!(second.as_bytes(), END_ONLY);
        assert!(rest.is_empty());
    }

    #[test]
    fn nodes_iterator_counts() {
        let path = DevicePath::from_bytes(HDD_PATH).unwrap();
        assert_eq!(path.nodes().count(), 3);
    }

    // The literal round-trip scenarios exercised by the reference vectors.

    #[test]
    fn hddpath_round_trip() {
        let text = "PciRoot(0x0)/Pci(0x1,0x1)/Ata(0x0)";
        let path = DevicePath::from_bytes(HDD_PATH).unwrap();
        assert_eq!(path.to_text(true, true), text);
        let parsed = DevicePath::from_text(text).unwrap();
        assert_eq!(parsed.as_bytes(), HDD_PATH);
    }

    #[test]
    fn macpath_round_trip() {
        let text = "PciRoot(0x0)/Pci(0x3,0x0)/MAC(525400123456,0x1)";
        let mut raw = Vec::new();
        raw.extend_from_slice(&[
            0x02, 0x01, 0x0c, 0x00, 0xd0, 0x41, 0x03, 0x0a, 0x00, 0x00, 0x00, 0x00,
        ]);
        raw.extend_from_slice(&[0x01, 0x01, 0x06, 0x00, 0x00, 0x03]);
        let mut mac = vec![0x03, 0x0b, 0x25, 0x00];
        mac.extend_from_slice(&[0x52, 0x54, 0x00, 0x12, 0x34, 0x56]);
        mac.extend_from_slice(&[0; 26]);
        mac.push(0x01);
        raw.extend_from_slice(&mac);
        raw.extend_from_slice(&[0x7f, 0xff, 0x04, 0x00]);

        let path = DevicePath::from_bytes(&raw).unwrap();
        assert_eq!(path.to_text(false, false), text);
        assert_eq!(DevicePath::from_text(text).unwrap().as_bytes(), &raw[..]);
    }

    #[test]
    fn uripath_round_trip_both_forms() {
        let short = "PciRoot(0x0)/Pci(0x1C,0x2)/Pci(0x0,0x1)/MAC(525400AC9C41,0x1)/\
                     IPv4(0.0.0.0)/Uri(http://boot.ipxe.org/ipxe.efi)";
        let long = "PciRoot(0x0)/Pci(0x1C,0x2)/Pci(0x0,0x1)/MAC(525400AC9C41,0x1)/\
                    IPv4(0.0.0.0,0x0,DHCP,0.0.0.0,0.0.0.0,0.0.0.0)/\
                    Uri(http://boot.ipxe.org/ipxe.efi)";

        let mut raw = Vec::new();
        raw.extend_from_slice(&[
            0x02, 0x01, 0x0c, 0x00, 0xd0, 0x41, 0x03, 0x0a, 0x00, 0x00, 0x00, 0x00,
        ]);
        raw.extend_from_slice(&[0x01, 0x01, 0x06, 0x00, 0x02, 0x1c]);
        raw.extend_from_slice(&[0x01, 0x01, 0x06, 0x00, 0x01, 0x00]);
        raw.extend_from_slice(&[0x03, 0x0b, 0x25, 0x00]);
        raw.extend_from_slice(&[0x52, 0x54, 0x00, 0xac, 0x9c, 0x41]);
        raw.extend_from_slice(&[0; 26]);
        raw.push(0x01);
        raw.extend_from_slice(&[0x03, 0x0c, 0x1b, 0x00]);
        raw.extend_from_slice(&[0; 23]);
        let uri = b"http://boot.ipxe.org/ipxe.efi";
        raw.extend_from_slice(&[0x03, 0x18, (4 + uri.len()) as u8, 0x00]);
        raw.extend_from_slice(uri);
        raw.extend_from_slice(&[0x7f, 0xff, 0x04, 0x00]);

        let path = DevicePath::from_bytes(&raw).unwrap();
        assert_eq!(path.to_text(true, true), short);
        assert_eq!(path.to_text(false, false), long);
        assert_eq!(DevicePath::from_text(short).unwrap().as_bytes(), &raw[..]);
        assert_eq!(DevicePath::from_text(long).unwrap().as_bytes(), &raw[..]);
    }

    #[test]
    fn fvfilepath_round_trip() {
        let text = "Fv(7CB8BDC9-F8EB-4F34-AAEA-3EE4AF6516A1)/\
                    FvFile(7C04A583-9E3E-4F1C-AD65-E05268D0B4D1)";
        let path = DevicePath::from_text(text).unwrap();
        assert_eq!(path.to_text(false, false), text);

        // GUID byte order on the wire is little-endian in the first three
        // groups.
        let fv_payload = &path.as_bytes()[4..20];
        assert_eq!(
            fv_payload,
            [
                0xc9, 0xbd, 0xb8, 0x7c, 0xeb, 0xf8, 0x34, 0x4f, 0xaa, 0xea, 0x3e, 0xe4, 0xaf,
                0x65, 0x16, 0xa1
            ]
        );
    }

    #[test]
    fn implausible_text_is_rejected() {
        let path = DevicePath::from_text("Uri(http://x)").unwrap();
        assert!(matches!(
            path.nodes().next(),
            Some(DevicePathNode::Messaging(node::MessagingNode::Uri(_)))
        ));

        // Wrong case: not a recognized node name, would become a file path.
        assert!(matches!(
            DevicePath::from_text("URI(http://x)"),
            Err(DevicePathError::ImplausibleFilePath(_))
        ));

        let relaxed = DevicePath::from_text_relaxed("URI(http://x)").unwrap();
        assert!(matches!(
            relaxed.nodes().next(),
            Some(DevicePathNode::Media(node::MediaNode::File(_)))
        ));
    }

    #[test]
    fn unknown_node_generic_round_trip() {
        let raw = [
            0x6f, 0x22, 0x08, 0x00, 0xde, 0xad, 0xbe, 0xef, // unknown type
            0x7f, 0xff, 0x04, 0x00,
        ];
        let path = DevicePath::from_bytes(&raw).unwrap();
        let text = path.to_text(false, false);
        assert_eq!(text, "Path(111,34,DEADBEEF)");
        assert_eq!(DevicePath::from_text(&text).unwrap().as_bytes(), raw);
    }

    #[test]
    fn multi_instance_round_trip() {
        let text = "PciRoot(0x0)/Pci(0x1,0x0),PciRoot(0x0)/Pci(0x2,0x0)";
        let path = DevicePath::from_text(text).unwrap();
        assert_eq!(path.nodes().count(), 5); // 4 nodes + instance separator
        assert_eq!(path.to_text(false, false), text);
    }

    #[test]
    fn file_path_round_trip() {
        let text = r"HD(1,GPT,C8F57909-D589-41A1-9958-44C7F229E150,0x800,0x12C000)/\EFI\fedora\shimx64.efi";
        let path = DevicePath::from_text(text).unwrap();
        assert_eq!(path.to_text(false, false), text);
    }
}
