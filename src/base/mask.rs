use std::fmt::{Display, Formatter};
use std::ops::{BitAnd, Not};

use serde::{Deserialize, Serialize};

/// Fixed-width signal bundle, one bit per port or input. Bit order is the
/// port/input index. Indices at or above `MAX_WIDTH` do not exist: they read
/// as clear and setting them is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortMask(u32);

pub const MAX_WIDTH: usize = 32;

impl PortMask {
    pub const EMPTY: PortMask = PortMask(0);

    pub const fn from_bits(bits: u32) -> Self {
        PortMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn onehot(idx: usize) -> Self {
        if idx >= MAX_WIDTH {
            PortMask(0)
        } else {
            PortMask(1 << idx)
        }
    }

    /// all `width` low bits set
    pub const fn full(width: usize) -> Self {
        if width >= MAX_WIDTH {
            PortMask(u32::MAX)
        } else {
            PortMask((1u32 << width) - 1)
        }
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn get(self, idx: usize) -> bool {
        self.0 & PortMask::onehot(idx).0 != 0
    }

    pub fn set(&mut self, idx: usize, value: bool) {
        *self = if value { self.with(idx) } else { self.without(idx) };
    }

    pub const fn with(self, idx: usize) -> Self {
        PortMask(self.0 | PortMask::onehot(idx).0)
    }

    pub const fn without(self, idx: usize) -> Self {
        PortMask(self.0 & !PortMask::onehot(idx).0)
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Index of the set bit if exactly one bit is set.
    pub fn single(self) -> Option<usize> {
        (self.count() == 1).then(|| self.0.trailing_zeros() as usize)
    }

    /// Drop every bit at or above `width`.
    pub const fn truncate(self, width: usize) -> Self {
        PortMask(self.0 & PortMask::full(width).0)
    }

    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_WIDTH).filter(move |&i| self.get(i))
    }

    /// Render the low `width` bits, msb first.
    pub fn to_bin(self, width: usize) -> String {
        (0..width).rev().map(|i| if self.get(i) { '1' } else { '0' }).collect()
    }
}

impl FromIterator<usize> for PortMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter().fold(PortMask::EMPTY, PortMask::with)
    }
}

impl BitAnd for PortMask {
    type Output = PortMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        PortMask(self.0 & rhs.0)
    }
}

// callers truncate to their own width
impl Not for PortMask {
    type Output = PortMask;

    fn not(self) -> Self::Output {
        PortMask(!self.0)
    }
}

impl Display for PortMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
