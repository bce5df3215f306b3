//! Identity types for the network model.
//!
//! An [`EntityId`] is an index into the model's slot storage paired with the
//! slot's generation at the time the entity was inserted. Removing an
//! entity bumps the slot generation, so every copy of the old id fails the
//! liveness check even after the slot is reused.

use std::fmt;

/// Stable handle to a population, projection, synapse or generic input
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub const INVALID: EntityId = EntityId {
        index: u32::MAX,
        generation: u32::MAX,
    };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// True unless this is the [`EntityId::INVALID`] sentinel.
    ///
    /// This says nothing about liveness; ask the model for that.
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "EntityId(INVALID)")
        } else {
            write!(f, "EntityId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(!EntityId::INVALID.is_valid());
        assert!(EntityId::new(0, 0).is_valid());
        assert_eq!(EntityId::default(), EntityId::INVALID);
    }

    #[test]
    fn test_generation_distinguishes_reuse() {
        let a = EntityId::new(3, 0);
        let b = EntityId::new(3, 1);
        assert_ne!(a, b);
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", EntityId::new(4, 2)), "EntityId(4v2)");
        assert_eq!(format!("{:?}", EntityId::INVALID), "EntityId(INVALID)");
    }
}
