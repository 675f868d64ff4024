// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Codec for `EFI_LOAD_OPTION` records.
//!
//! Persisted layout:
//!
//! ```text
//! u32le attributes | u16le file_path_list_length |
//! UCS-2 LE description, null-terminated |
//! file_path_list_length bytes of concatenated device-path chains |
//! optional data (may be empty)
//! ```

use thiserror::Error;
use ucs2::Ucs2LeSlice;
use ucs2::Ucs2LeVec;
use uefi_devpath::DevicePath;
use uefi_devpath::DevicePathError;
use uefi_wire::load_option::EfiLoadOptionHeader;
use zerocopy::FromBytes;
use zerocopy::IntoBytes;

#[derive(Debug, Error)]
pub enum LoadOptionError {
    #[error("record shorter than the fixed load-option header")]
    RecordTooShort,
    #[error("description is not a null-terminated UCS-2 string")]
    Description(#[source] ucs2::Ucs2ParseError),
    #[error("file path list length exceeds the record")]
    FilePathListOverrun,
    #[error("file path list does not hold whole, valid device paths")]
    FilePathList(#[source] DevicePathError),
    #[error("file path list holds no device paths")]
    EmptyPathList,
    #[error("file path list length exceeds the u16 wire field")]
    FilePathListTooLong,
}

/// A decoded `EFI_LOAD_OPTION`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOption {
    pub attributes: u32,
    pub description: String,
    pub paths: Vec<DevicePath>,
    pub optional_data: Vec<u8>,
}

impl LoadOption {
    /// Decode a raw load-option record.
    pub fn parse(record: &[u8]) -> Result<LoadOption, LoadOptionError> {
        let (header, rest) = EfiLoadOptionHeader::read_from_prefix(record)
            .map_err(|_| LoadOptionError::RecordTooShort)?;

        // Find the description's null terminator among the aligned u16
        // pairs; the record's tail (optional data) may have odd length, so
        // the whole remainder cannot be handed to the UCS-2 validator.
        let nul_index = rest
            .chunks_exact(2)
            .position(|pair| pair == [0, 0])
            .ok_or(LoadOptionError::Description(
                ucs2::Ucs2ParseError::MissingNullTerm,
            ))?;
        let (description, rest) = rest.split_at((nul_index + 1) * 2);
        let description =
            Ucs2LeSlice::from_slice_with_nul(description).map_err(LoadOptionError::Description)?;

        let list_length = header.file_path_list_length as usize;
        if list_length > rest.len() {
            return Err(LoadOptionError::FilePathListOverrun);
        }
        let (mut region, optional_data) = rest.split_at(list_length);

        // The declared region must be carved exactly into whole chains; a
        // trailing fragment or a chain crossing the boundary is corruption.
        let mut paths = Vec::new();
        while !region.is_empty() {
            let (path, remaining) =
                DevicePath::parse_prefix(region).map_err(LoadOptionError::FilePathList)?;
            paths.push(path);
            region = remaining;
        }
        if paths.is_empty() {
            return Err(LoadOptionError::EmptyPathList);
        }

        Ok(LoadOption {
            attributes: header.attributes,
            description: description.to_string(),
            paths,
            optional_data: optional_data.to_vec(),
        })
    }

    /// Encode back into the persisted byte layout.
    pub fn encode(&self) -> Result<Vec<u8>, LoadOptionError> {
        encode_parts(
            self.attributes,
            &self.description,
            self.paths.iter(),
            &self.optional_data,
        )
    }
}

pub(crate) fn encode_parts<'a>(
    attributes: u32,
    description: &str,
    paths: impl Iterator<Item = &'a DevicePath>,
    optional_data: &[u8],
) -> Result<Vec<u8>, LoadOptionError> {
    let paths: Vec<&DevicePath> = paths.collect();
    let list_length: usize = paths.iter().map(|p| p.byte_len()).sum();
    let file_path_list_length: u16 = list_length
        .try_into()
        .map_err(|_| LoadOptionError::FilePathListTooLong)?;

    let description = Ucs2LeVec::from(description);
    let header = EfiLoadOptionHeader {
        attributes,
        file_path_list_length,
    };

    let mut record =
        Vec::with_capacity(size_of_val(&header) + description.as_bytes().len() + list_length);
    record.extend_from_slice(header.as_bytes());
    record.extend_from_slice(description.as_bytes());
    for path in paths {
        record.extend_from_slice(path.as_bytes());
    }
    record.extend_from_slice(optional_data);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wchar::wchz;

    // Boot0003 from a Fedora installation: attributes ACTIVE, description
    // "Fedora", one path HD(1,GPT,…)/\EFI\fedora\shimx64.efi, no optional
    // data.
    const FEDORA: &[u8] = &[
        0x01, 0x00, 0x00, 0x00, 0x62, 0x00, 0x46, 0x00, 0x65, 0x00, 0x64, 0x00, 0x6f, 0x00, 0x72,
        0x00, 0x61, 0x00, 0x00, 0x00, 0x04, 0x01, 0x2a, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x08,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x12, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09,
        0x79, 0xf5, 0xc8, 0x89, 0xd5, 0xa1, 0x41, 0x99, 0x58, 0x44, 0xc7, 0xf2, 0x29, 0xe1, 0x50,
        0x02, 0x02, 0x04, 0x04, 0x34, 0x00, 0x5c, 0x00, 0x45, 0x00, 0x46, 0x00, 0x49, 0x00, 0x5c,
        0x00, 0x66, 0x00, 0x65, 0x00, 0x64, 0x00, 0x6f, 0x00, 0x72, 0x00, 0x61, 0x00, 0x5c, 0x00,
        0x73, 0x00, 0x68, 0x00, 0x69, 0x00, 0x6d, 0x00, 0x78, 0x00, 0x36, 0x00, 0x34, 0x00, 0x2e,
        0x00, 0x65, 0x00, 0x66, 0x00, 0x69, 0x00, 0x00, 0x00, 0x7f, 0xff, 0x04, 0x00,
    ];

    #[test]
    fn fedora_decode_encode() {
        let option = LoadOption::parse(FEDORA).unwrap();
        assert_eq!(option.attributes, 0x00000001);
        assert_eq!(option.description, "Fedora");
        assert_eq!(option.paths.len(), 1);
        assert_eq!(
            option.paths[0].to_text(false, false),
            "HD(1,GPT,C8F57909-D589-41A1-9958-44C7F229E150,0x800,0x12C000)/\\EFI\\fedora\\shimx64.efi"
        );
        assert!(option.optional_data.is_empty());

        assert_eq!(option.encode().unwrap(), FEDORA);
    }

    /// A hand-built option with one path and five bytes of optional data,
    /// used to probe every malformed-record rejection.
    fn sample() -> Vec<u8> {
        let path = DevicePath::from_text("PciRoot(0x0)/Pci(0x1,0x2)/Ata(0x0)").unwrap();
        let mut record = Vec::new();
        record.extend_from_slice(&1u32.to_le_bytes());
        record.extend_from_slice(&(path.byte_len() as u16).to_le_bytes());
        record.extend_from_slice(wchz!(u16, "Bad option").as_bytes());
        record.extend_from_slice(path.as_bytes());
        record.extend_from_slice(&[1, 2, 3, 4, 5]);
        record
    }

    const SAMPLE_PATH_LEN: usize = 12 + 6 + 8 + 4;
    const SAMPLE_DATA_LEN: usize = 5;

    fn set_list_length(record: &mut [u8], len: u16) {
        record[4..6].copy_from_slice(&len.to_le_bytes());
    }

    #[test]
    fn sample_round_trips() {
        let record = sample();
        let option = LoadOption::parse(&record).unwrap();
        assert_eq!(option.description, "Bad option");
        assert_eq!(option.optional_data, [1, 2, 3, 4, 5]);
        assert_eq!(option.encode().unwrap(), record);
    }

    #[test]
    fn record_too_short() {
        assert!(matches!(
            LoadOption::parse(&[1, 2, 3, 4, 5]),
            Err(LoadOptionError::RecordTooShort)
        ));
    }

    #[test]
    fn list_length_off_by_one_rejected() {
        let mut record = sample();
        set_list_length(&mut record, (SAMPLE_PATH_LEN - 1) as u16);
        assert!(matches!(
            LoadOption::parse(&record),
            Err(LoadOptionError::FilePathList(_))
        ));

        let mut record = sample();
        set_list_length(&mut record, (SAMPLE_PATH_LEN + 1) as u16);
        assert!(matches!(
            LoadOption::parse(&record),
            Err(LoadOptionError::FilePathList(_))
        ));
    }

    #[test]
    fn list_length_spanning_whole_record_rejected() {
        let mut record = sample();
        let total = record.len() as u16;
        set_list_length(&mut record, total);
        assert!(matches!(
            LoadOption::parse(&record),
            Err(LoadOptionError::FilePathListOverrun)
        ));
    }

    #[test]
    fn zero_list_length_rejected() {
        let mut record = sample();
        set_list_length(&mut record, 0);
        assert!(matches!(
            LoadOption::parse(&record),
            Err(LoadOptionError::EmptyPathList)
        ));
    }

    #[test]
    fn unterminated_description_rejected() {
        let mut record = sample();
        // Overwrite the description's null terminator; the scan then runs
        // into the odd-aligned tail of the record.
        let nul_at = 6 + "Bad option".len() * 2;
        record[nul_at] = b'x';
        record[nul_at + 1] = 0x01;
        assert!(matches!(
            LoadOption::parse(&record),
            Err(LoadOptionError::Description(_)) | Err(LoadOptionError::FilePathListOverrun)
        ));
    }

    #[test]
    fn corrupt_end_node_rejected() {
        for bad_len in [1u8, 0] {
            let mut record = sample();
            let end_length_at = record.len() - SAMPLE_DATA_LEN - 2;
            record[end_length_at] = bad_len;
            assert!(matches!(
                LoadOption::parse(&record),
                Err(LoadOptionError::FilePathList(_))
            ));
        }
    }

    #[test]
    fn truncated_optional_data_still_parses() {
        let record = sample();
        for cut in 1..=SAMPLE_DATA_LEN {
            let option = LoadOption::parse(&record[..record.len() - cut]).unwrap();
            assert_eq!(option.optional_data.len(), SAMPLE_DATA_LEN - cut);
        }
        // One byte further truncates the path region itself.
        assert!(matches!(
            LoadOption::parse(&record[..record.len() - SAMPLE_DATA_LEN - 1]),
            Err(LoadOptionError::FilePathListOverrun)
        ));
    }

    #[test]
    fn multiple_chains_in_list() {
        let first = DevicePath::from_text("PciRoot(0x0)/Pci(0x1,0x0)").unwrap();
        let second = DevicePath::end_entire();
        let option = LoadOption {
            attributes: 1,
            description: "Two".to_string(),
            paths: vec![first.clone(), second.clone()],
            optional_data: Vec::new(),
        };
        let record = option.encode().unwrap();
        let reparsed = LoadOption::parse(&record).unwrap();
        assert_eq!(reparsed.paths, vec![first, second]);
    }
}
