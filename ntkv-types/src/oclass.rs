//! Object classes: opaque 16-bit tags describing data distribution and
//! protection, resolved by name.

/// Numeric object class id as understood by the store.
pub type ObjectClassId = u16;

/// Upper bound on the length of an object class name.
pub const OC_NAME_MAX: usize = 64;

/// Registry of the classes the in-memory store recognizes. The explicit
/// layout classes are contiguous starting at 200.
const CLASSES: &[(&str, ObjectClassId)] = &[
    ("RP_XSF", 80),
    ("S1", 200),
    ("S2", 201),
    ("S4", 202),
    ("S8", 203),
    ("S16", 204),
    ("S32", 205),
    ("S64", 206),
    ("S128", 207),
    ("S256", 208),
    ("S512", 209),
    ("S1K", 210),
    ("S2K", 211),
    ("S4K", 212),
    ("S8K", 213),
    ("SX", 214),
];

/// Wrapper around an [`ObjectClassId`]. The zero id means "unknown"; an
/// unknown class on open leaves id generation to the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectClass {
    id: ObjectClassId,
}

impl ObjectClass {
    pub const UNKNOWN: Self = Self { id: 0 };

    /// Default storage class for newly created datasets.
    pub const SX: Self = Self { id: 214 };

    pub const fn from_id(id: ObjectClassId) -> Self {
        Self { id }
    }

    /// Resolve a class by name; unrecognized names (including names longer
    /// than [`OC_NAME_MAX`]) map to [`ObjectClass::UNKNOWN`].
    pub fn from_name(name: &str) -> Self {
        if name.len() > OC_NAME_MAX {
            return Self::UNKNOWN;
        }
        CLASSES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, id)| Self { id })
            .unwrap_or(Self::UNKNOWN)
    }

    pub fn id(&self) -> ObjectClassId {
        self.id
    }

    pub fn is_unknown(&self) -> bool {
        self.id == 0
    }

    /// The registered name of this class, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        CLASSES.iter().find(|(_, id)| *id == self.id).map(|&(n, _)| n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_id_roundtrip() {
        for &(name, id) in CLASSES {
            let class = ObjectClass::from_name(name);
            assert_eq!(class.id(), id);
            assert_eq!(class.name(), Some(name));
        }
    }

    #[test]
    fn unknown_names_resolve_to_unknown() {
        assert!(ObjectClass::from_name("NOPE").is_unknown());
        assert!(ObjectClass::from_name("").is_unknown());
        let long = "S".repeat(OC_NAME_MAX + 1);
        assert!(ObjectClass::from_name(&long).is_unknown());
    }

    #[test]
    fn default_class_is_registered() {
        assert_eq!(ObjectClass::SX.name(), Some("SX"));
        assert!(!ObjectClass::SX.is_unknown());
    }
}
