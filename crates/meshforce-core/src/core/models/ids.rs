use std::fmt;

/// Stable global particle identifier, independent of where the particle sits in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ParticleTag(pub u32);

impl ParticleTag {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParticleTag {
    fn from(tag: u32) -> Self {
        Self(tag)
    }
}

/// Index of a mesh triangle type; parameters are stored per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TriangleTypeId(pub usize);

impl TriangleTypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TriangleTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a particle in the local (owned followed by ghost) arrays.
pub type LocalIndex = usize;

/// Reverse-map entry for a tag that has no local copy on this partition.
pub const NOT_LOCAL: u32 = u32::MAX;
