//! Edge flags describing which neighbors of an active cell are missing.

use bitflags::bitflags;

bitflags! {
    /// Per-cell outline code. Zero for inactive cells and for fully surrounded ones.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EdgeFlags: u8 {
        const RIGHT = 1 << 0;
        const LEFT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;

        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
    }
}

impl Default for EdgeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl EdgeFlags {
    /// Every single-direction flag with the offset of the neighbor it tests.
    pub const DIRECTIONS: [(EdgeFlags, (i32, i32)); 4] = [
        (EdgeFlags::RIGHT, (1, 0)),
        (EdgeFlags::LEFT, (-1, 0)),
        (EdgeFlags::TOP, (0, 1)),
        (EdgeFlags::BOTTOM, (0, -1)),
    ];

    /// True for a cell sitting on the outline.
    pub fn is_edge(self) -> bool {
        !self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values_match_atlas_codes() {
        assert_eq!(EdgeFlags::TOP_LEFT.bits(), 6);
        assert_eq!(EdgeFlags::BOTTOM_RIGHT.bits(), 9);
        assert_eq!(EdgeFlags::all().bits(), 15);
    }

    #[test]
    fn test_corner_contains_sides() {
        assert!(EdgeFlags::TOP_LEFT.contains(EdgeFlags::TOP));
        assert!(!EdgeFlags::TOP_LEFT.contains(EdgeFlags::BOTTOM));
        assert!(!EdgeFlags::default().is_edge());
    }
}
