//! FNV-1a running hash over component identities.

use crate::id::ComponentId;

/// Incremental FNV-1a hash over a sequence of component identities.
///
/// Two entities holding the same set of kinds, visited in the same order,
/// produce the same checksum; any added or removed kind changes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checksum(u64);

impl Checksum {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    /// Fold one component identity into the hash.
    pub fn push(&mut self, kind: ComponentId) {
        for byte in kind.0.to_le_bytes() {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    /// The current hash value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<ComponentId> for Checksum {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut sum = Self::new();
        for kind in iter {
            sum.push(kind);
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_offset_basis() {
        assert_eq!(Checksum::new().value(), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn order_and_membership_matter() {
        let a: Checksum = [ComponentId(1), ComponentId(2)].into_iter().collect();
        let b: Checksum = [ComponentId(2), ComponentId(1)].into_iter().collect();
        let c: Checksum = [ComponentId(1)].into_iter().collect();
        assert_ne!(a, b);
        assert_ne!(a, c);
        let again: Checksum = [ComponentId(1), ComponentId(2)].into_iter().collect();
        assert_eq!(a, again);
    }
}
