use serde::{Deserialize, Serialize};

/// A cell coordinate, 0-based, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Flat index into a grid of the given size.
    pub fn index(&self, size: usize) -> usize {
        self.row * size + self.col
    }
}

/// A single cell: an optional value plus a given/guess flag.
///
/// A fixed cell's value is immutable for the duration of solving; a
/// non-fixed cell holds either nothing or a solver guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    value: Option<u8>,
    fixed: bool,
}

impl Cell {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn given(value: u8) -> Self {
        Self {
            value: Some(value),
            fixed: true,
        }
    }

    pub fn value(&self) -> Option<u8> {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }
}

/// A square board of cells with a size fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty grid: every cell unset and not fixed.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::empty(); size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, pos: Position) -> usize {
        assert!(
            pos.row < self.size && pos.col < self.size,
            "position ({}, {}) out of bounds for size {}",
            pos.row,
            pos.col,
            self.size
        );
        pos.index(self.size)
    }

    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[self.idx(pos)]
    }

    pub fn get(&self, pos: Position) -> Option<u8> {
        self.cell(pos).value
    }

    /// Set or clear a guess. The fixed flag is left untouched.
    pub fn set(&mut self, pos: Position, value: Option<u8>) {
        let i = self.idx(pos);
        self.cells[i].value = value;
    }

    /// Set a given (pre-filled, immutable) value.
    pub fn set_given(&mut self, pos: Position, value: u8) {
        let i = self.idx(pos);
        self.cells[i] = Cell::given(value);
    }

    /// Clear the value and the fixed flag.
    pub fn clear(&mut self, pos: Position) {
        let i = self.idx(pos);
        self.cells[i] = Cell::empty();
    }

    pub fn is_fixed(&self, pos: Position) -> bool {
        self.cell(pos).fixed
    }

    /// Snapshot of all cell values in row-major order.
    pub fn clone_values(&self) -> Vec<Option<u8>> {
        self.cells.iter().map(|c| c.value).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|c| c.value.is_some())
    }

    /// All positions without a value, in row-major order.
    pub fn empty_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                let pos = Position::new(row, col);
                if self.cell(pos).is_empty() {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    /// Number of fixed (given) cells.
    pub fn given_count(&self) -> usize {
        self.cells.iter().filter(|c| c.fixed).count()
    }

    /// Number of cells currently holding a value.
    pub fn value_count(&self) -> usize {
        self.cells.iter().filter(|c| c.value.is_some()).count()
    }

    /// Parse a grid from a digit string, `0` meaning empty.
    ///
    /// The string length must be a perfect square; every non-zero digit
    /// becomes a given. This is the usual one-line sudoku format:
    /// `"530070000600195000..."`.
    pub fn from_string(s: &str) -> Option<Self> {
        let chars: Vec<char> = s.chars().collect();
        let size = (chars.len() as f64).sqrt() as usize;
        if size * size != chars.len() {
            return None;
        }
        let mut grid = Self::new(size);
        for (i, ch) in chars.iter().enumerate() {
            let digit = ch.to_digit(10)? as u8;
            if digit != 0 {
                grid.cells[i] = Cell::given(digit);
            }
        }
        Some(grid)
    }

    /// Build a grid from integer rows, `-1` meaning empty.
    ///
    /// Non-negative entries become givens. All rows must have the same
    /// length as the number of rows.
    pub fn from_rows(rows: &[Vec<i8>]) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        let mut grid = Self::new(size);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v >= 0 {
                    grid.set_given(Position::new(r, c), v as u8);
                }
            }
        }
        Some(grid)
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                match self.get(Position::new(row, col)) {
                    Some(v) => write!(f, "{} ", v)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(9);
        assert_eq!(grid.size(), 9);
        assert_eq!(grid.empty_positions().len(), 81);
        assert_eq!(grid.given_count(), 0);
        assert!(!grid.is_complete());
    }

    #[test]
    fn test_set_and_clear() {
        let mut grid = Grid::new(4);
        let pos = Position::new(1, 2);
        grid.set(pos, Some(3));
        assert_eq!(grid.get(pos), Some(3));
        assert!(!grid.is_fixed(pos));
        grid.clear(pos);
        assert_eq!(grid.get(pos), None);
    }

    #[test]
    fn test_given_is_fixed() {
        let mut grid = Grid::new(4);
        let pos = Position::new(0, 0);
        grid.set_given(pos, 2);
        assert!(grid.is_fixed(pos));
        assert_eq!(grid.get(pos), Some(2));
    }

    #[test]
    fn test_from_string() {
        let puzzle =
            "530070000600195000098000060800060003400803001700020006060000280000419005000080079";
        let grid = Grid::from_string(puzzle).unwrap();
        assert_eq!(grid.size(), 9);
        assert_eq!(grid.get(Position::new(0, 0)), Some(5));
        assert_eq!(grid.get(Position::new(0, 2)), None);
        assert!(grid.is_fixed(Position::new(0, 0)));
        assert_eq!(grid.given_count(), 30);
    }

    #[test]
    fn test_from_string_rejects_bad_length() {
        assert!(Grid::from_string("12345").is_none());
    }

    #[test]
    fn test_from_rows() {
        let rows = vec![vec![0, -1], vec![-1, 1]];
        let grid = Grid::from_rows(&rows).unwrap();
        assert_eq!(grid.get(Position::new(0, 0)), Some(0));
        assert_eq!(grid.get(Position::new(0, 1)), None);
        assert_eq!(grid.get(Position::new(1, 1)), Some(1));
    }

    #[test]
    fn test_clone_values_snapshot() {
        let mut grid = Grid::new(2);
        grid.set(Position::new(0, 1), Some(1));
        assert_eq!(grid.clone_values(), vec![None, Some(1), None, None]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_panics() {
        let grid = Grid::new(4);
        grid.get(Position::new(0, 4));
    }

    #[test]
    fn test_serde_round_trip() {
        let grid = Grid::from_string("1002003400210043").unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(grid, back);
    }
}
