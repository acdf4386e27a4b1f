//! The fixed-layout anchor record persisted at a well-known key.

use ntkv_result::{Error, Result};
use ntkv_types::oclass::OC_NAME_MAX;

use crate::wire::{get_string, get_u32, put_string, put_u32, string_size};

/// Current anchor wire version.
pub const ANCHOR_VERSION: u32 = 1;

/// Size of the five fixed `u32` fields.
const FIXED_SIZE: usize = 20;

/// Bootstrap record of a dataset. Serialized layout (all little-endian):
///
/// ```text
/// offset  size  field
/// 0       4     version
/// 4       4     n_bytes_header      (compressed size)
/// 8       4     len_header          (uncompressed size)
/// 12      4     n_bytes_footer
/// 16      4     len_footer
/// 20      var   object_class_name   (u32 length prefix + UTF-8 bytes)
/// ```
///
/// The anchor is strictly the last record written on close; a reader that
/// observes a valid anchor may assume the rest of the dataset is durable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetAnchor {
    pub version: u32,
    pub n_bytes_header: u32,
    pub len_header: u32,
    pub n_bytes_footer: u32,
    pub len_footer: u32,
    pub object_class: String,
}

impl Default for DatasetAnchor {
    fn default() -> Self {
        Self {
            version: ANCHOR_VERSION,
            n_bytes_header: 0,
            len_header: 0,
            n_bytes_footer: 0,
            len_footer: 0,
            object_class: "SX".to_string(),
        }
    }
}

impl DatasetAnchor {
    /// Worst-case serialized size; the read path fetches this bound and
    /// deserializes from the front.
    pub const fn max_size() -> usize {
        FIXED_SIZE + 4 + OC_NAME_MAX
    }

    /// Exact serialized size of this anchor.
    pub fn serialized_size(&self) -> usize {
        FIXED_SIZE + string_size(&self.object_class)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        put_u32(&mut buf, self.version);
        put_u32(&mut buf, self.n_bytes_header);
        put_u32(&mut buf, self.len_header);
        put_u32(&mut buf, self.n_bytes_footer);
        put_u32(&mut buf, self.len_footer);
        put_string(&mut buf, &self.object_class);
        buf
    }

    /// Deserialize from the front of `bytes`; trailing bytes are ignored
    /// so a worst-case-sized read buffer can be handed in directly.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let too_short = || Error::BadAnchor("anchor too short".to_string());
        if bytes.len() < FIXED_SIZE {
            return Err(too_short());
        }
        let mut offset = 0usize;
        let version = get_u32(bytes, &mut offset).ok_or_else(too_short)?;
        let n_bytes_header = get_u32(bytes, &mut offset).ok_or_else(too_short)?;
        let len_header = get_u32(bytes, &mut offset).ok_or_else(too_short)?;
        let n_bytes_footer = get_u32(bytes, &mut offset).ok_or_else(too_short)?;
        let len_footer = get_u32(bytes, &mut offset).ok_or_else(too_short)?;
        let object_class = get_string(bytes, &mut offset)
            .ok_or_else(|| Error::BadAnchor("object class name overruns buffer".to_string()))?;
        if object_class.len() > OC_NAME_MAX {
            return Err(Error::BadAnchor("object class name too long".to_string()));
        }
        Ok(Self {
            version,
            n_bytes_header,
            len_header,
            n_bytes_footer,
            len_footer,
            object_class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DatasetAnchor {
        DatasetAnchor {
            version: ANCHOR_VERSION,
            n_bytes_header: 11,
            len_header: 25,
            n_bytes_footer: 7,
            len_footer: 9,
            object_class: "RP_XSF".to_string(),
        }
    }

    #[test]
    fn roundtrip() {
        let anchor = sample();
        let bytes = anchor.serialize();
        assert_eq!(bytes.len(), anchor.serialized_size());
        assert_eq!(DatasetAnchor::deserialize(&bytes).unwrap(), anchor);
    }

    #[test]
    fn roundtrip_with_trailing_bytes() {
        let anchor = sample();
        let mut bytes = anchor.serialize();
        bytes.resize(DatasetAnchor::max_size(), 0);
        assert_eq!(DatasetAnchor::deserialize(&bytes).unwrap(), anchor);
    }

    #[test]
    fn serialized_size_is_fixed_part_plus_name() {
        let anchor = sample();
        assert_eq!(anchor.serialize().len(), 20 + 4 + anchor.object_class.len());
    }

    #[test]
    fn truncated_fixed_part_is_rejected() {
        let bytes = sample().serialize();
        assert!(matches!(
            DatasetAnchor::deserialize(&bytes[..19]),
            Err(Error::BadAnchor(_))
        ));
    }

    #[test]
    fn truncated_name_prefix_is_rejected() {
        let bytes = sample().serialize();
        // Exactly the fixed fields: the string prefix itself is missing.
        assert!(matches!(
            DatasetAnchor::deserialize(&bytes[..20]),
            Err(Error::BadAnchor(_))
        ));
        // Prefix present but promising more bytes than remain.
        assert!(matches!(
            DatasetAnchor::deserialize(&bytes[..25]),
            Err(Error::BadAnchor(_))
        ));
    }

    #[test]
    fn max_name_length_fits_max_size() {
        let mut anchor = sample();
        anchor.object_class = "X".repeat(OC_NAME_MAX);
        let bytes = anchor.serialize();
        assert!(bytes.len() <= DatasetAnchor::max_size());
        assert_eq!(DatasetAnchor::deserialize(&bytes).unwrap(), anchor);
    }
}
