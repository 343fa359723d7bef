//! 128-bit opaque object identifier (OID).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 128-bit opaque object identifier, serializable as two 64-bit halves.
/// Equality-comparable and copyable; deliberately exposes no ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    hi: u64,
    lo: u64,
}

impl ObjectId {
    pub fn from_parts(hi: u64, lo: u64) -> Self {
        Self { hi, lo }
    }

    pub fn hi(&self) -> u64 {
        self.hi
    }

    pub fn lo(&self) -> u64 {
        self.lo
    }

    /// Generates a new random OID. Used by reference backends implementing
    /// `Backend::obj_get_new_id`; the core itself never manufactures OIDs
    /// on its own.
    pub fn new_random() -> Self {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        let hi = u64::from_be_bytes(bytes[0..8].try_into().unwrap());
        let lo = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
        Self { hi, lo }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_value() {
        let a = ObjectId::from_parts(1, 2);
        let b = ObjectId::from_parts(1, 2);
        let c = ObjectId::from_parts(1, 3);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn random_ids_are_distinct() {
        let a = ObjectId::new_random();
        let b = ObjectId::new_random();
        assert_ne!(a, b);
    }
}
