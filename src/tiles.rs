//! Tile identities and the lookup tables that chain them together.
//!
//! Discriminants follow the atlas layout: 0 is "no tile", everything else maps
//! to atlas cell `discriminant - 1`.

use serde::{Deserialize, Serialize};

use crate::tilemap::Tilemap;

/// Body tile variants: 16 edge/corner tiles followed by six 2x2 middle blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileType {
    #[default]
    None = 0,

    TopLeftOuter,
    Top1,
    Top2,
    TopRightOuter,

    Left1,
    /// Opening facing bottom-right.
    BotRightInner,
    /// Opening facing bottom-left.
    BotLeftInner,
    Right1,

    Left2,
    TopRightInner,
    TopLeftInner,
    Right2,

    BotLeftOuter,
    Bot1,
    Bot2,
    BotRightOuter,

    Middle1TopL,
    Middle1TopR,
    Middle2TopL,
    Middle2TopR,
    Middle1BotL,
    Middle1BotR,
    Middle2BotL,
    Middle2BotR,
    Middle3TopL,
    Middle3TopR,
    Middle4TopL,
    Middle4TopR,
    Middle3BotL,
    Middle3BotR,
    Middle4BotL,
    Middle4BotR,
    Middle5TopL,
    Middle5TopR,
    Middle6TopL,
    Middle6TopR,
    Middle5BotL,
    Middle5BotR,
    Middle6BotL,
    Middle6BotR,
}

/// Cliff tile variants, laid out as a 4x4 atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CliffType {
    #[default]
    None = 0,
    TopLeft,
    Top1,
    Top2,
    TopRight,
    Left1,
    Mid1,
    Mid2,
    Right1,
    Left2,
    Mid3,
    Mid4,
    Right2,
    BotLeft,
    Bot1,
    Bot2,
    BotRight,
}

/// Coarse grouping of body tiles, used for previews.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileClass {
    Empty,
    OuterCorner,
    InnerCorner,
    Side,
    Middle,
}

/// Anything that can be written into a renderer tile array.
pub trait AtlasTile: Copy {
    /// Atlas cell, `-1` for no tile.
    fn atlas_index(self) -> i32;

    fn is_none(self) -> bool {
        self.atlas_index() < 0
    }
}

impl AtlasTile for TileType {
    fn atlas_index(self) -> i32 {
        self as i32 - 1
    }
}

impl AtlasTile for CliffType {
    fn atlas_index(self) -> i32 {
        self as i32 - 1
    }
}

/// Side tiles toggle between their two variants along a run.
pub const SIDE_CONTINUATION: [(TileType, TileType); 8] = [
    (TileType::Left1, TileType::Left2),
    (TileType::Right1, TileType::Right2),
    (TileType::Top1, TileType::Top2),
    (TileType::Bot1, TileType::Bot2),
    (TileType::Left2, TileType::Left1),
    (TileType::Right2, TileType::Right1),
    (TileType::Top2, TileType::Top1),
    (TileType::Bot2, TileType::Bot1),
];

/// Left half of a middle block -> the right half next to it.
pub const MIDDLE_RIGHT_CONTINUATION: [(TileType, TileType); 12] = [
    (TileType::Middle1BotL, TileType::Middle1BotR),
    (TileType::Middle2BotL, TileType::Middle2BotR),
    (TileType::Middle3BotL, TileType::Middle3BotR),
    (TileType::Middle4BotL, TileType::Middle4BotR),
    (TileType::Middle5BotL, TileType::Middle5BotR),
    (TileType::Middle6BotL, TileType::Middle6BotR),
    (TileType::Middle1TopL, TileType::Middle1TopR),
    (TileType::Middle2TopL, TileType::Middle2TopR),
    (TileType::Middle3TopL, TileType::Middle3TopR),
    (TileType::Middle4TopL, TileType::Middle4TopR),
    (TileType::Middle5TopL, TileType::Middle5TopR),
    (TileType::Middle6TopL, TileType::Middle6TopR),
];

/// Bottom-left of a middle block -> the top-left above it. Blocks only ever
/// grow upward from their bottom-left seed.
pub const MIDDLE_TOP_CONTINUATION: [(TileType, TileType); 6] = [
    (TileType::Middle1BotL, TileType::Middle1TopL),
    (TileType::Middle2BotL, TileType::Middle2TopL),
    (TileType::Middle3BotL, TileType::Middle3TopL),
    (TileType::Middle4BotL, TileType::Middle4TopL),
    (TileType::Middle5BotL, TileType::Middle5TopL),
    (TileType::Middle6BotL, TileType::Middle6TopL),
];

/// Cliff tile -> the tile to its right.
pub const CLIFF_RIGHT_CONTINUATION: [(CliffType, CliffType); 12] = [
    (CliffType::TopLeft, CliffType::Top1),
    (CliffType::Top1, CliffType::Top2),
    (CliffType::Top2, CliffType::Top1),
    (CliffType::Left1, CliffType::Mid1),
    (CliffType::Mid1, CliffType::Mid2),
    (CliffType::Mid2, CliffType::Mid1),
    (CliffType::Left2, CliffType::Mid3),
    (CliffType::Mid3, CliffType::Mid4),
    (CliffType::Mid4, CliffType::Mid3),
    (CliffType::BotLeft, CliffType::Bot1),
    (CliffType::Bot1, CliffType::Bot2),
    (CliffType::Bot2, CliffType::Bot1),
];

/// Look `from` up in a continuation table.
pub fn continuation<K: Copy + PartialEq, V: Copy>(table: &[(K, V)], from: K) -> Option<V> {
    table.iter().find(|(key, _)| *key == from).map(|&(_, next)| next)
}

impl TileType {
    /// Seeds of the six middle blocks.
    pub const MIDDLE_BOT_LEFTS: [TileType; 6] = [
        TileType::Middle1BotL,
        TileType::Middle2BotL,
        TileType::Middle3BotL,
        TileType::Middle4BotL,
        TileType::Middle5BotL,
        TileType::Middle6BotL,
    ];

    pub fn is_inner_corner(self) -> bool {
        matches!(
            self,
            TileType::BotRightInner
                | TileType::BotLeftInner
                | TileType::TopRightInner
                | TileType::TopLeftInner
        )
    }

    pub fn is_middle(self) -> bool {
        self as u8 >= TileType::Middle1TopL as u8
    }

    pub fn is_middle_bot_left(self) -> bool {
        Self::MIDDLE_BOT_LEFTS.contains(&self)
    }

    /// Which of the six middle blocks this tile belongs to (1-based).
    pub fn middle_block(self) -> Option<u8> {
        if !self.is_middle() {
            return None;
        }
        // Blocks come in 8-tile bands holding two blocks each:
        // TopL TopR TopL TopR BotL BotR BotL BotR.
        let offset = self as u8 - TileType::Middle1TopL as u8;
        let band = offset / 8;
        let second = (offset % 4) >= 2;
        Some(band * 2 + 1 + second as u8)
    }

    pub fn class(self) -> TileClass {
        match self {
            TileType::None => TileClass::Empty,
            TileType::TopLeftOuter
            | TileType::TopRightOuter
            | TileType::BotLeftOuter
            | TileType::BotRightOuter => {
                TileClass::OuterCorner
            }
            t if t.is_inner_corner() => TileClass::InnerCorner,
            t if t.is_middle() => TileClass::Middle,
            _ => TileClass::Side,
        }
    }
}

/// Flatten a tile grid into the renderer's row-major index array.
///
/// Cells within `crop_offset / 2 + 1` of any border become `-1`; a
/// `crop_offset` of 0 keeps everything.
pub fn flatten<T: AtlasTile>(tiles: &Tilemap<T>, crop_offset: usize) -> Vec<i32> {
    let (width, height) = (tiles.width, tiles.height);
    let border = if crop_offset == 0 { 0 } else { crop_offset / 2 + 1 };
    tiles
        .iter()
        .map(|(x, y, tile)| {
            let cropped = border > 0
                && (x < border || y < border || x + border >= width || y + border >= height);
            if cropped {
                -1
            } else {
                tile.atlas_index()
            }
        })
        .collect()
}
