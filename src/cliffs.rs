//! Cliff autotiling.
//!
//! Cliffs only have outer corners and horizontal runs. Corners come from the
//! edge flags, then every other cell continues whatever its left neighbor is.

use crate::edges::EdgeFlags;
use crate::error::Result;
use crate::processor::GridProcessor;
use crate::tiles::{continuation, CliffType, TileType, CLIFF_RIGHT_CONTINUATION};
use crate::tilemap::{Mask, Tilemap};

struct CornerRule {
    flag: EdgeFlags,
    corner: CliffType,
    /// Rows up to the body tile that decides whether the corner is drawn.
    body_offset: i32,
    /// Body tile -> cliff tile replacing the corner.
    demotions: [(TileType, CliffType); 2],
}

const TOP_DEMOTIONS: [(TileType, CliffType); 2] = [
    (TileType::Bot1, CliffType::Top1),
    (TileType::Bot2, CliffType::Top2),
];

const BOTTOM_DEMOTIONS: [(TileType, CliffType); 2] = [
    (TileType::Bot1, CliffType::Bot1),
    (TileType::Bot2, CliffType::Bot2),
];

const CORNER_RULES: [CornerRule; 4] = [
    CornerRule {
        flag: EdgeFlags::TOP_LEFT,
        corner: CliffType::TopLeft,
        body_offset: 1,
        demotions: TOP_DEMOTIONS,
    },
    CornerRule {
        flag: EdgeFlags::TOP_RIGHT,
        corner: CliffType::TopRight,
        body_offset: 1,
        demotions: TOP_DEMOTIONS,
    },
    CornerRule {
        flag: EdgeFlags::BOTTOM_LEFT,
        corner: CliffType::BotLeft,
        body_offset: 2,
        demotions: BOTTOM_DEMOTIONS,
    },
    CornerRule {
        flag: EdgeFlags::BOTTOM_RIGHT,
        corner: CliffType::BotRight,
        body_offset: 2,
        demotions: BOTTOM_DEMOTIONS,
    },
];

/// Classify the doubled `cliff_mask` against the body tiles sitting on it.
///
/// `body_tiles` must already be at double resolution.
pub fn classify_cliffs<P: GridProcessor>(
    processor: &P,
    cliff_mask: &Mask,
    body_tiles: &Tilemap<TileType>,
) -> Result<Tilemap<CliffType>> {
    let doubled = processor.double_resolution(cliff_mask);
    doubled.ensure_same_shape(body_tiles)?;

    let edges = processor.outline(&doubled);
    let mut tiles: Tilemap<CliffType> = Tilemap::new(doubled.width, doubled.height);
    let mut corners = Mask::new(doubled.width, doubled.height);

    for rule in &CORNER_RULES {
        let matching = processor.equals_flag(&edges, rule.flag);
        for p in processor.active_positions(&matching) {
            let body = body_tiles
                .get_offset(p.x, p.y, 0, rule.body_offset)
                .copied()
                .unwrap_or_default();
            let tile = continuation(&rule.demotions, body).unwrap_or(rule.corner);
            tiles.set(p.x, p.y, tile);
        }
        processor.intersect_add(&matching, &mut corners)?;
    }

    let mut rest = doubled;
    processor.intersect_remove(&corners, &mut rest)?;
    for p in processor.active_positions(&rest) {
        let left = tiles.get_offset(p.x, p.y, -1, 0).copied().unwrap_or_default();
        let tile = continuation(&CLIFF_RIGHT_CONTINUATION, left).unwrap_or_default();
        tiles.set(p.x, p.y, tile);
    }

    Ok(tiles)
}
