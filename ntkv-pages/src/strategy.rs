//! Deterministic mapping from logical page identities to physical store
//! keys.

use ntkv_types::ids::{
    OID_ANCHOR_LEGACY, OID_FOOTER_LEGACY, OID_HEADER_LEGACY, OID_METADATA, OID_PAGE_LIST,
};
use ntkv_types::keys::{
    AKEY_ANCHOR, AKEY_FOOTER, AKEY_HEADER, AKEY_LEGACY, DKEY_LEGACY, DKEY_META,
};
use ntkv_types::oclass::ObjectClass;
use ntkv_types::{ObjectId, StoreKey};

use crate::meta::{ClusterId, ColumnId};

/// Object class used for the metadata records themselves, independent of
/// the dataset's payload class.
pub const METADATA_CLASS: ObjectClass = ObjectClass::SX;

/// The three fixed metadata records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MetadataKind {
    Anchor,
    Header,
    Footer,
}

/// Key derivation strategy, fixed per dataset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyMapping {
    /// One object per cluster, one dkey per column, one akey per page.
    /// Metadata lives in dedicated well-known objects.
    #[default]
    PerClusterPerColumn,
    /// Legacy mapping: every payload page lives in its own object with
    /// fixed dkey/akey; metadata uses separate reserved object ids.
    PerObjectUnique,
}

impl KeyMapping {
    /// Key of a payload page. `position` is the page's monotonically
    /// issued sequence number.
    pub fn payload_key(&self, cluster_id: ClusterId, column_id: ColumnId, position: u64) -> StoreKey {
        match self {
            KeyMapping::PerClusterPerColumn => StoreKey {
                oid: ObjectId::new(cluster_id, 0),
                dkey: column_id,
                akey: position,
            },
            KeyMapping::PerObjectUnique => StoreKey {
                oid: ObjectId::new(position, 0),
                dkey: DKEY_LEGACY,
                akey: AKEY_LEGACY,
            },
        }
    }

    /// Key of one of the fixed metadata records.
    pub fn metadata_key(&self, kind: MetadataKind) -> StoreKey {
        match self {
            KeyMapping::PerClusterPerColumn => {
                let akey = match kind {
                    MetadataKind::Anchor => AKEY_ANCHOR,
                    MetadataKind::Header => AKEY_HEADER,
                    MetadataKind::Footer => AKEY_FOOTER,
                };
                StoreKey {
                    oid: OID_METADATA,
                    dkey: DKEY_META,
                    akey,
                }
            }
            KeyMapping::PerObjectUnique => {
                let oid = match kind {
                    MetadataKind::Anchor => OID_ANCHOR_LEGACY,
                    MetadataKind::Header => OID_HEADER_LEGACY,
                    MetadataKind::Footer => OID_FOOTER_LEGACY,
                };
                StoreKey {
                    oid,
                    dkey: DKEY_LEGACY,
                    akey: AKEY_LEGACY,
                }
            }
        }
    }

    /// Key of a cluster group's page list blob. `position` is the sequence
    /// number allocated for the page list itself.
    pub fn page_list_key(&self, position: u64) -> StoreKey {
        let dkey = match self {
            KeyMapping::PerClusterPerColumn => DKEY_META,
            KeyMapping::PerObjectUnique => DKEY_LEGACY,
        };
        StoreKey {
            oid: OID_PAGE_LIST,
            dkey,
            akey: position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_cluster_per_column_is_deterministic() {
        let key = KeyMapping::PerClusterPerColumn.payload_key(42, 3, 99);
        assert_eq!(key.oid, ObjectId::new(42, 0));
        assert_eq!(key.dkey, 3);
        assert_eq!(key.akey, 99);
    }

    #[test]
    fn metadata_records_share_the_metadata_object() {
        let mapping = KeyMapping::PerClusterPerColumn;
        let anchor = mapping.metadata_key(MetadataKind::Anchor);
        let header = mapping.metadata_key(MetadataKind::Header);
        let footer = mapping.metadata_key(MetadataKind::Footer);
        assert_eq!(anchor.oid, OID_METADATA);
        assert_eq!(header.oid, OID_METADATA);
        assert_eq!(footer.oid, OID_METADATA);
        assert_eq!(anchor.dkey, DKEY_META);
        assert_ne!(anchor.akey, header.akey);
        assert_ne!(header.akey, footer.akey);
    }

    #[test]
    fn legacy_mapping_uses_one_object_per_page() {
        let mapping = KeyMapping::PerObjectUnique;
        let a = mapping.payload_key(1, 2, 7);
        let b = mapping.payload_key(1, 2, 8);
        assert_ne!(a.oid, b.oid);
        assert_eq!(a.dkey, b.dkey);
        assert_eq!(a.akey, b.akey);
        assert_eq!(mapping.metadata_key(MetadataKind::Anchor).oid, OID_ANCHOR_LEGACY);
    }

    #[test]
    fn page_lists_are_keyed_by_sequence_number() {
        let key = KeyMapping::PerClusterPerColumn.page_list_key(12);
        assert_eq!(key.oid, OID_PAGE_LIST);
        assert_eq!(key.dkey, DKEY_META);
        assert_eq!(key.akey, 12);
    }
}
