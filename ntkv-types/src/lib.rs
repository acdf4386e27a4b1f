//! Identifiers shared across the NTKV crates.
//!
//! These types live in `ntkv-types` so they can be reused by both the
//! object-store adapter and the page layer without either depending on the
//! other: the 128-bit [`ObjectId`](ids::ObjectId), the two key levels of an
//! object ([`DistributionKey`](keys::DistributionKey) and
//! [`AttributeKey`](keys::AttributeKey)), the object-class registry, and the
//! raw status codes spoken by the store surface.

pub mod errno;
pub mod ids;
pub mod keys;
pub mod oclass;

pub use errno::RawStatus;
pub use ids::ObjectId;
pub use keys::{AttributeKey, DistributionKey, StoreKey};
pub use oclass::{ObjectClass, ObjectClassId};
