use crate::grid::{Grid, Position};
use crate::rules::RuleSet;

const SUDOKU_VALUES: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Classic 9x9 sudoku rules: each digit once per row, column and 3x3 box.
///
/// No propagation pass is defined; the puzzle solves by search alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SudokuRules;

impl SudokuRules {
    pub fn new() -> Self {
        Self
    }

    fn row_positions(row: usize) -> impl Iterator<Item = Position> {
        (0..9).map(move |col| Position::new(row, col))
    }

    fn col_positions(col: usize) -> impl Iterator<Item = Position> {
        (0..9).map(move |row| Position::new(row, col))
    }

    fn box_positions(row: usize, col: usize) -> impl Iterator<Item = Position> {
        let box_row = row - row % 3;
        let box_col = col - col % 3;
        (0..9).map(move |i| Position::new(box_row + i / 3, box_col + i % 3))
    }

    /// A unit is valid when every filled cell holds 1-9 and no value
    /// occurs twice, and complete when additionally no cell is empty.
    fn unit_ok(grid: &Grid, unit: impl Iterator<Item = Position>, require_complete: bool) -> bool {
        let mut seen = [false; 10];
        for pos in unit {
            match grid.get(pos) {
                Some(v) => {
                    if !(1..=9).contains(&v) || seen[v as usize] {
                        return false;
                    }
                    seen[v as usize] = true;
                }
                None => {
                    if require_complete {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn all_units_ok(grid: &Grid, require_complete: bool) -> bool {
        for i in 0..9 {
            if !Self::unit_ok(grid, Self::row_positions(i), require_complete) {
                return false;
            }
            if !Self::unit_ok(grid, Self::col_positions(i), require_complete) {
                return false;
            }
            if !Self::unit_ok(
                grid,
                Self::box_positions((i / 3) * 3, (i % 3) * 3),
                require_complete,
            ) {
                return false;
            }
        }
        true
    }
}

impl RuleSet for SudokuRules {
    fn values(&self) -> &[u8] {
        &SUDOKU_VALUES
    }

    fn is_legal(&self, grid: &Grid, pos: Position, value: u8) -> bool {
        for p in Self::row_positions(pos.row) {
            if grid.get(p) == Some(value) {
                return false;
            }
        }
        for p in Self::col_positions(pos.col) {
            if grid.get(p) == Some(value) {
                return false;
            }
        }
        for p in Self::box_positions(pos.row, pos.col) {
            if grid.get(p) == Some(value) {
                return false;
            }
        }
        true
    }

    fn is_solved(&self, grid: &Grid) -> bool {
        grid.size() == 9 && Self::all_units_ok(grid, true)
    }

    fn is_consistent(&self, grid: &Grid) -> bool {
        grid.size() == 9 && Self::all_units_ok(grid, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved_grid() -> Grid {
        Grid::from_string(
            "534678912672195348198342567859761423426853791713924856961537284287419635345286179",
        )
        .unwrap()
    }

    #[test]
    fn test_solved_grid_passes() {
        let rules = SudokuRules::new();
        assert!(rules.is_solved(&solved_grid()));
        assert!(rules.is_consistent(&solved_grid()));
    }

    #[test]
    fn test_incomplete_grid_not_solved() {
        let rules = SudokuRules::new();
        let grid = Grid::from_string(
            "530070000600195000098000060800060003400803001700020006060000280000419005000080079",
        )
        .unwrap();
        assert!(!rules.is_solved(&grid));
        assert!(rules.is_consistent(&grid));
    }

    #[test]
    fn test_row_duplicate_is_inconsistent() {
        let rules = SudokuRules::new();
        let mut grid = Grid::new(9);
        grid.set_given(Position::new(0, 0), 5);
        grid.set_given(Position::new(0, 7), 5);
        assert!(!rules.is_consistent(&grid));
    }

    #[test]
    fn test_out_of_range_value_is_inconsistent() {
        let rules = SudokuRules::new();
        let mut grid = Grid::new(9);
        grid.set(Position::new(0, 0), Some(200));
        assert!(!rules.is_consistent(&grid));
        assert!(!rules.is_solved(&grid));
    }

    #[test]
    fn test_is_legal_respects_units() {
        let rules = SudokuRules::new();
        let mut grid = Grid::new(9);
        grid.set_given(Position::new(0, 0), 5);
        // Same row, same column, same box.
        assert!(!rules.is_legal(&grid, Position::new(0, 8), 5));
        assert!(!rules.is_legal(&grid, Position::new(8, 0), 5));
        assert!(!rules.is_legal(&grid, Position::new(2, 2), 5));
        // Unrelated cell.
        assert!(rules.is_legal(&grid, Position::new(4, 4), 5));
        assert!(rules.is_legal(&grid, Position::new(0, 8), 6));
    }
}
