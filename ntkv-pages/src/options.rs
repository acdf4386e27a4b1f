//! Options recognized by the page sink and source.

use crate::strategy::KeyMapping;

/// Compression setting forwarded to the block codec when none is given
/// explicitly. `0` disables compression.
pub const DEFAULT_COMPRESSION: i32 = 5;

/// Whether page reads go through the cluster cache or hit the store
/// directly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ClusterCache {
    #[default]
    On,
    Off,
}

/// Options of the write path.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Default storage class for newly generated object ids; recorded in
    /// the anchor so readers can restore it.
    pub object_class: String,
    /// Opaque compression setting forwarded to the codec.
    pub compression: i32,
    /// Key derivation strategy, fixed per dataset. Readers must be
    /// configured with the same mapping.
    pub key_mapping: KeyMapping,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            object_class: "SX".to_string(),
            compression: DEFAULT_COMPRESSION,
            key_mapping: KeyMapping::default(),
        }
    }
}

/// Options of the read path.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    pub cluster_cache: ClusterCache,
    pub key_mapping: KeyMapping,
}
