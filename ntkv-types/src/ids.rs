//! Object identifiers and the reserved-bit layout of generated ids.

use modular_bitfield::prelude::*;

use crate::oclass::ObjectClassId;

/// 128-bit object identifier.
///
/// The first component (`lo`) carries the caller-chosen identity; the upper
/// 32 bits of `hi` are reserved for the store and are stamped by id
/// generation (see [`ObjectId::embed_reserved`]). Equality and hashing are
/// component-wise.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub lo: u64,
    pub hi: u64,
}

/// Reserved bit layout of the `hi` word of a generated object id. The
/// store's id generator stamps the object type and class into the top 16
/// bits and leaves the low 32 bits to the caller.
#[bitfield]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u64)]
pub struct OidReserved {
    pub user: B32,
    pub meta: B16,
    pub class: B8,
    pub otype: B8,
}

/// Object type tag for multi-level KV objects with `u64` dkeys and akeys.
pub const OTYPE_MULTI_UINT64: u8 = 4;

/// Well-known object holding the anchor, header, and footer records.
pub const OID_METADATA: ObjectId = ObjectId::new(-11i64 as u64, 0);

/// Well-known object holding the per-cluster-group page list blobs.
pub const OID_PAGE_LIST: ObjectId = ObjectId::new(-12i64 as u64, 0);

/// Reserved metadata objects of the legacy one-object-per-page mapping.
pub const OID_ANCHOR_LEGACY: ObjectId = ObjectId::new(-1i64 as u64, 0);
pub const OID_HEADER_LEGACY: ObjectId = ObjectId::new(-2i64 as u64, 0);
pub const OID_FOOTER_LEGACY: ObjectId = ObjectId::new(-3i64 as u64, 0);

impl ObjectId {
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    /// Stamp the reserved bits of `hi` with the object type and class, the
    /// way the store's id generator does before an open. The caller-visible
    /// low bits are preserved.
    pub fn embed_reserved(&mut self, otype: u8, class: ObjectClassId) {
        self.hi = OidReserved::from(self.hi)
            .with_class((class & 0xff) as u8)
            .with_otype(otype)
            .into();
    }

    /// The object class id stamped into the reserved bits, if any.
    pub fn reserved_class(&self) -> ObjectClassId {
        OidReserved::from(self.hi).class() as ObjectClassId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_reserved_preserves_user_bits() {
        let mut oid = ObjectId::new(42, 0x0000_0000_dead_beef);
        oid.embed_reserved(OTYPE_MULTI_UINT64, 214);
        assert_eq!(oid.lo, 42);
        assert_eq!(oid.hi & 0xffff_ffff, 0xdead_beef);
        assert_eq!(oid.reserved_class(), 214);
        assert_eq!(oid.hi >> 56, OTYPE_MULTI_UINT64 as u64);
    }

    #[test]
    fn well_known_ids_are_distinct() {
        assert_ne!(OID_METADATA, OID_PAGE_LIST);
        assert_eq!(OID_METADATA.lo, u64::MAX - 10);
        assert_eq!(OID_PAGE_LIST.lo, u64::MAX - 11);
    }
}
