//! Body autotiling.
//!
//! Classification runs on the doubled mask so that every coarse cell becomes a
//! 2x2 block of tiles. Passes run in a fixed order and each later pass only
//! fills cells that are still unset:
//!
//! 1. outer corners, straight from the edge flags
//! 2. inner corners, interior cells whose diagonal neighbor is empty
//! 3. sides, alternating between two variants along each run
//! 4. middle blocks, grown from randomly chosen bottom-left seeds

use log::debug;
use rand::Rng;

use crate::edges::EdgeFlags;
use crate::error::{LevelGenError, Result};
use crate::processor::{GridProcessor, Offset, Point};
use crate::tiles::{
    continuation, TileType, MIDDLE_RIGHT_CONTINUATION, MIDDLE_TOP_CONTINUATION, SIDE_CONTINUATION,
};
use crate::tilemap::{Mask, Tilemap};
use crate::weighted::WeightedSelection;

const OUTER_CORNERS: [(EdgeFlags, TileType); 4] = [
    (EdgeFlags::TOP_LEFT, TileType::TopLeftOuter),
    (EdgeFlags::TOP_RIGHT, TileType::TopRightOuter),
    (EdgeFlags::BOTTOM_LEFT, TileType::BotLeftOuter),
    (EdgeFlags::BOTTOM_RIGHT, TileType::BotRightOuter),
];

const INNER_CORNERS: [(Offset, TileType); 4] = [
    ((-1, 1), TileType::TopLeftInner),
    ((1, 1), TileType::TopRightInner),
    ((-1, -1), TileType::BotLeftInner),
    ((1, -1), TileType::BotRightInner),
];

/// How one straight edge is tiled.
struct SideRule {
    flag: EdgeFlags,
    /// Used after an outer corner or anything unrecognized.
    base: TileType,
    /// Used right after an inner corner.
    alternate: TileType,
    /// Neighbor whose tile decides this one.
    preceding: Offset,
}

const SIDE_RULES: [SideRule; 4] = [
    SideRule {
        flag: EdgeFlags::LEFT,
        base: TileType::Left2,
        alternate: TileType::Left1,
        preceding: (0, -1),
    },
    SideRule {
        flag: EdgeFlags::RIGHT,
        base: TileType::Right2,
        alternate: TileType::Right1,
        preceding: (0, -1),
    },
    SideRule {
        flag: EdgeFlags::TOP,
        base: TileType::Top1,
        alternate: TileType::Top2,
        preceding: (-1, 0),
    },
    SideRule {
        flag: EdgeFlags::BOTTOM,
        base: TileType::Bot1,
        alternate: TileType::Bot2,
        preceding: (-1, 0),
    },
];

impl SideRule {
    fn next(&self, previous: TileType) -> TileType {
        if let Some(next) = continuation(&SIDE_CONTINUATION, previous) {
            next
        } else if previous.is_inner_corner() {
            self.alternate
        } else {
            self.base
        }
    }

    /// Sort key that puts every cell after its preceding neighbor.
    fn traversal_key(&self, point: Point, width: usize) -> i64 {
        let sign = |d: i32| if d < 0 { -1 } else { 1 };
        let x = point.x as i64 * sign(self.preceding.0);
        let y = point.y as i64 * sign(self.preceding.1) * width as i64;
        -(x + y)
    }
}

/// The middle selector may only seed blocks, and must be able to pick one.
pub fn validate_middle_tiles(middle_tiles: &WeightedSelection<TileType>) -> Result<()> {
    if middle_tiles.total_weight() == 0 {
        return Err(LevelGenError::Config(
            "middle tile strategy needs at least one positive weight".to_string(),
        ));
    }
    if let Some(bad) = middle_tiles.items().find(|t| !t.is_middle_bot_left()) {
        return Err(LevelGenError::Config(format!(
            "middle tile strategy may only hold bottom-left middle tiles, found {bad:?}"
        )));
    }
    Ok(())
}

/// Classify every cell of the doubled `mask`.
pub fn classify_tiles<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    mask: &Mask,
    middle_tiles: &WeightedSelection<TileType>,
    rng: &mut R,
) -> Result<Tilemap<TileType>> {
    validate_middle_tiles(middle_tiles)?;

    let doubled = processor.double_resolution(mask);
    let edges = processor.outline(&doubled);
    let mut tiles: Tilemap<TileType> = Tilemap::new(doubled.width, doubled.height);

    for (flag, tile) in OUTER_CORNERS {
        let corners = processor.equals_flag(&edges, flag);
        for p in processor.active_positions(&corners) {
            tiles.set(p.x, p.y, tile);
        }
    }

    let mut interior = processor.equals_flag(&edges, EdgeFlags::empty());
    processor.intersect(&doubled, &mut interior)?;

    for (direction, tile) in INNER_CORNERS {
        let mut corners = interior.clone();
        let covered = processor.has_neighbor(&doubled, direction);
        processor.intersect_remove(&covered, &mut corners)?;
        for p in processor.active_positions(&corners) {
            tiles.set(p.x, p.y, tile);
        }
    }

    for rule in &SIDE_RULES {
        let sides = processor.equals_flag(&edges, rule.flag);
        let mut positions = processor.active_positions(&sides);
        positions.sort_by_key(|&p| rule.traversal_key(p, tiles.width));
        for p in positions {
            let (dx, dy) = rule.preceding;
            let previous = tiles.get_offset(p.x, p.y, dx, dy).copied().unwrap_or_default();
            tiles.set(p.x, p.y, rule.next(previous));
        }
    }

    let mut seeded = 0usize;
    for p in processor.active_positions(&interior) {
        if *tiles.get(p.x, p.y) != TileType::None {
            continue;
        }
        let left = tiles.get_offset(p.x, p.y, -1, 0).copied().unwrap_or_default();
        let below = tiles.get_offset(p.x, p.y, 0, -1).copied().unwrap_or_default();
        let tile = continuation(&MIDDLE_RIGHT_CONTINUATION, left)
            .or_else(|| continuation(&MIDDLE_TOP_CONTINUATION, below))
            .unwrap_or_else(|| {
                seeded += 1;
                middle_tiles.select_random(rng)
            });
        tiles.set(p.x, p.y, tile);
    }

    debug!(
        "autotiled {}x{} mask, {} middle blocks seeded",
        mask.width, mask.height, seeded
    );
    Ok(tiles)
}
