use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// The query-flags word of the legacy wire format.
///
/// Only the secondary-read bit is interpreted by the metadata layer;
/// the remaining bits belong to the transport and round-trip through
/// [`bits`](QueryFlags::bits) / [`from_bits`](QueryFlags::from_bits)
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryFlags(u32);

impl QueryFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Permits execution of the request against a non-primary replica.
    /// Wire position of the legacy secondaryOk bit.
    pub const SECONDARY_OK: Self = Self(1 << 2);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if all flags in `other` are set in `self`.
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn secondary_ok(self) -> bool {
        self.contains(Self::SECONDARY_OK)
    }
}

impl BitOr for QueryFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
