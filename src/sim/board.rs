//! Snake-path board geometry
//!
//! Maps linear tile indices (1-100) onto a 10x10 grid laid out in
//! boustrophedon order: tile 1 sits at the bottom-left, each row reverses
//! direction, tile 100 ends at the top-left. The full coordinate table is
//! built once on first access and shared.

use std::sync::OnceLock;

use glam::Vec2;

use crate::consts::{BOARD_TILES, BOARD_Y_OFFSET, GRID_WIDTH, TILE_SIZE};

/// Grid position of a tile: (column, row), both 0-based.
///
/// Row 0 is the top row of the displayed board; tile 1 lives in row 9.
/// Even tile-rows (counted from the bottom) run left to right, odd rows
/// right to left.
pub fn tile_to_grid(tile: u8) -> (u8, u8) {
    let tile = tile.clamp(1, BOARD_TILES);
    let i = tile - 1;
    let tile_row = i / GRID_WIDTH;
    let row = GRID_WIDTH - 1 - tile_row;
    let col = if tile_row % 2 == 0 {
        i % GRID_WIDTH
    } else {
        GRID_WIDTH - 1 - (i % GRID_WIDTH)
    };
    (col, row)
}

/// World-space coordinate of a tile's center, for token placement and
/// camera targeting. O(1) after the first call.
pub fn tile_to_world(tile: u8) -> Vec2 {
    let table = world_table();
    let tile = tile.clamp(1, BOARD_TILES);
    table[(tile - 1) as usize]
}

fn world_table() -> &'static [Vec2; BOARD_TILES as usize] {
    static TABLE: OnceLock<[Vec2; BOARD_TILES as usize]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [Vec2::ZERO; BOARD_TILES as usize];
        for (i, slot) in table.iter_mut().enumerate() {
            let (col, row) = tile_to_grid(i as u8 + 1);
            *slot = Vec2::new(
                col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
                row as f32 * TILE_SIZE + TILE_SIZE / 2.0 + BOARD_Y_OFFSET,
            );
        }
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_corners() {
        // Tile 1 bottom-left, tile 100 top-left (10 rows, direction flips each row)
        assert_eq!(tile_to_grid(1), (0, 9));
        assert_eq!(tile_to_grid(10), (9, 9));
        assert_eq!(tile_to_grid(11), (9, 8));
        assert_eq!(tile_to_grid(100), (0, 0));
    }

    #[test]
    fn test_row_boundaries_share_column() {
        // Every row transition keeps the column (the path snakes, never jumps)
        for boundary in (10..100).step_by(10) {
            let (col_a, row_a) = tile_to_grid(boundary);
            let (col_b, row_b) = tile_to_grid(boundary + 1);
            assert_eq!(col_a, col_b, "tiles {} and {}", boundary, boundary + 1);
            assert_eq!(row_a, row_b + 1);
        }
    }

    #[test]
    fn test_bijection() {
        let mut seen = HashSet::new();
        for tile in 1..=100u8 {
            let (col, row) = tile_to_grid(tile);
            assert!(col < 10 && row < 10);
            assert!(seen.insert((col, row)), "duplicate cell for tile {}", tile);
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_world_offset() {
        let p = tile_to_world(100);
        assert!((p.x - TILE_SIZE / 2.0).abs() < f32::EPSILON);
        assert!((p.y - (TILE_SIZE / 2.0 + BOARD_Y_OFFSET)).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_adjacent_tiles_are_grid_neighbors(tile in 1u8..100) {
            let (c1, r1) = tile_to_grid(tile);
            let (c2, r2) = tile_to_grid(tile + 1);
            let dist = (c1 as i16 - c2 as i16).abs() + (r1 as i16 - r2 as i16).abs();
            prop_assert_eq!(dist, 1);
        }

        #[test]
        fn prop_world_matches_grid(tile in 1u8..=100) {
            let (col, row) = tile_to_grid(tile);
            let p = tile_to_world(tile);
            prop_assert!((p.x - (col as f32 * TILE_SIZE + TILE_SIZE / 2.0)).abs() < 0.001);
            prop_assert!((p.y - (row as f32 * TILE_SIZE + TILE_SIZE / 2.0 + BOARD_Y_OFFSET)).abs() < 0.001);
        }
    }
}
