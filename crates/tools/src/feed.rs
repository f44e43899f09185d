use gridview_common::{CellCoord, GridConfig};

/// Deterministic highlight source.
///
/// Produces `count` cells inside `[0, width) x [0, height)`. Cells are not
/// deduplicated. The same seed always yields the same sequence.
pub fn random_cells(grid: &GridConfig, count: usize, seed: u64) -> Vec<CellCoord> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        mix(state)
    };
    let cells: Vec<CellCoord> = (0..count)
        .map(|_| {
            let x = below(next(), grid.width());
            let y = below(next(), grid.height());
            CellCoord::new(x as i32, y as i32)
        })
        .collect();
    tracing::debug!(count, seed, "generated highlight cells");
    cells
}

/// splitmix64 output function.
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Map a uniform u64 onto `[0, bound)` by widening multiply.
fn below(value: u64, bound: u32) -> u32 {
    ((value as u128 * bound as u128) >> 64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_stay_in_bounds() {
        let grid = GridConfig::new(37, 5, 0).unwrap();
        let cells = random_cells(&grid, 5_000, 1);
        assert_eq!(cells.len(), 5_000);
        assert!(cells.iter().all(|c| grid.contains(*c)));
    }

    #[test]
    fn same_seed_same_cells() {
        let grid = GridConfig::default();
        assert_eq!(random_cells(&grid, 100, 9), random_cells(&grid, 100, 9));
        assert_ne!(random_cells(&grid, 100, 9), random_cells(&grid, 100, 10));
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(random_cells(&GridConfig::default(), 0, 3).is_empty());
    }

    #[test]
    fn single_cell_grid_always_origin() {
        let grid = GridConfig::new(1, 1, 0).unwrap();
        assert!(
            random_cells(&grid, 50, 77)
                .iter()
                .all(|c| *c == CellCoord::new(0, 0))
        );
    }

    #[test]
    fn cells_cover_the_grid() {
        let grid = GridConfig::new(4, 4, 0).unwrap();
        let cells = random_cells(&grid, 1_000, 5);
        for x in 0..4 {
            for y in 0..4 {
                assert!(cells.contains(&CellCoord::new(x, y)), "missing ({x}, {y})");
            }
        }
    }
}
