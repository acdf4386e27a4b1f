//! Key levels inside an object and the well-known metadata keys.

use crate::ids::ObjectId;

/// First-level key inside an object.
pub type DistributionKey = u64;

/// Second-level key, scoped by a distribution key.
pub type AttributeKey = u64;

/// A fully resolved physical address: object, distribution key, attribute
/// key. Produced by the key-mapping strategies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StoreKey {
    pub oid: ObjectId,
    pub dkey: DistributionKey,
    pub akey: AttributeKey,
}

/// Distribution key under which all metadata records live.
pub const DKEY_META: DistributionKey = 0x5a3c_69f0_cafe_4912;

/// Attribute keys of the three fixed metadata records.
pub const AKEY_ANCHOR: AttributeKey = 0x4243_544b_5344_422d;
pub const AKEY_HEADER: AttributeKey = 0x4243_544b_5344_421e;
pub const AKEY_FOOTER: AttributeKey = 0x4243_544b_5344_420f;

/// Fixed keys of the legacy one-object-per-page mapping.
pub const DKEY_LEGACY: DistributionKey = 0x5a3c_69f0_cafe_4a11;
pub const AKEY_LEGACY: AttributeKey = 0x4243_544b_5344_422d;
