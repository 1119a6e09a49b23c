//! ASCII rendering of masks and tile grids
//!
//! Every renderer prints the top row first, so the output reads the way the
//! level looks.

use crate::tiles::{CliffType, TileClass, TileType};
use crate::tilemap::{Mask, Tilemap};

/// Get ASCII character for a body tile
pub fn tile_char(tile: TileType) -> char {
    match tile.class() {
        TileClass::Empty => '.',
        TileClass::OuterCorner => '+',
        TileClass::InnerCorner => '*',
        TileClass::Middle => match tile.middle_block() {
            Some(block) => char::from(b'0' + block),
            None => '?',
        },
        TileClass::Side => match tile {
            TileType::Top1 | TileType::Top2 | TileType::Bot1 | TileType::Bot2 => '-',
            _ => '|',
        },
    }
}

/// Get ASCII character for a cliff tile
pub fn cliff_char(cliff: CliffType) -> char {
    match cliff {
        CliffType::None => '.',
        CliffType::TopLeft | CliffType::TopRight | CliffType::BotLeft | CliffType::BotRight => '+',
        CliffType::Top1 | CliffType::Top2 => '^',
        CliffType::Bot1 | CliffType::Bot2 => 'v',
        CliffType::Left1 | CliffType::Left2 | CliffType::Right1 | CliffType::Right2 => '|',
        CliffType::Mid1 | CliffType::Mid2 | CliffType::Mid3 | CliffType::Mid4 => '#',
    }
}

/// Render any grid with a per-cell character function.
pub fn render_grid<T>(grid: &Tilemap<T>, cell: impl Fn(&T) -> char) -> String {
    let mut out = String::with_capacity((grid.width + 1) * grid.height);
    for y in (0..grid.height).rev() {
        for x in 0..grid.width {
            out.push(cell(grid.get(x, y)));
        }
        out.push('\n');
    }
    out
}

pub fn render_mask(mask: &Mask) -> String {
    render_grid(mask, |&active| if active { '#' } else { '.' })
}

pub fn render_tiles(tiles: &Tilemap<TileType>) -> String {
    render_grid(tiles, |&tile| tile_char(tile))
}

pub fn render_cliffs(cliffs: &Tilemap<CliffType>) -> String {
    render_grid(cliffs, |&cliff| cliff_char(cliff))
}

/// Legend for [`render_tiles`].
pub fn tile_legend() -> &'static str {
    concat!(
        "  .  empty\n",
        "  +  outer corner\n",
        "  *  inner corner\n",
        "  -  top/bottom side\n",
        "  |  left/right side\n",
        " 1-6 middle block\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_top_row_first() {
        let mut mask = Mask::new(3, 2);
        mask.set(0, 0, true);
        mask.set(2, 1, true);
        assert_eq!(render_mask(&mask), "..#\n#..\n");
    }

    #[test]
    fn test_tile_chars() {
        assert_eq!(tile_char(TileType::None), '.');
        assert_eq!(tile_char(TileType::BotLeftOuter), '+');
        assert_eq!(tile_char(TileType::TopLeftInner), '*');
        assert_eq!(tile_char(TileType::Bot2), '-');
        assert_eq!(tile_char(TileType::Right1), '|');
        assert_eq!(tile_char(TileType::Middle1BotL), '1');
        assert_eq!(tile_char(TileType::Middle6TopR), '6');
        assert_eq!(cliff_char(CliffType::Mid3), '#');
    }

    #[test]
    fn test_render_tiles_dimensions() {
        let tiles = Tilemap::new_with(4, 3, TileType::Top1);
        let text = render_tiles(&tiles);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|l| l == "----"));
    }

    #[test]
    fn test_legend_covers_every_char() {
        let legend = tile_legend();
        assert_eq!(legend.lines().count(), 6);
        for c in ['.', '+', '*', '-', '|'] {
            assert!(legend.lines().any(|l| l.trim_start().starts_with(c)));
        }
    }
}
