use crate::grid::{Grid, Position};
use crate::rules::{Propagation, RuleSet};

const BINARY_VALUES: [u8; 2] = [0, 1];

/// Binary (0/1 balance) puzzle rules on an even-sized grid.
///
/// A solved grid has no three consecutive equal values in any row or
/// column, exactly N/2 zeros and ones per row and column, and no two
/// identical rows or columns.
#[derive(Debug, Clone)]
pub struct BinaryRules {
    size: usize,
}

impl BinaryRules {
    pub fn new(size: usize) -> Self {
        assert!(size % 2 == 0, "binary puzzle size must be even");
        Self { size }
    }

    fn row_values(grid: &Grid, row: usize) -> Vec<Option<u8>> {
        (0..grid.size())
            .map(|col| grid.get(Position::new(row, col)))
            .collect()
    }

    fn col_values(grid: &Grid, col: usize) -> Vec<Option<u8>> {
        (0..grid.size())
            .map(|row| grid.get(Position::new(row, col)))
            .collect()
    }

    fn counts(values: &[Option<u8>]) -> (usize, usize) {
        let zeros = values.iter().filter(|v| **v == Some(0)).count();
        let ones = values.iter().filter(|v| **v == Some(1)).count();
        (zeros, ones)
    }

    fn has_triple(values: &[Option<u8>]) -> bool {
        values.windows(3).any(|w| {
            w[0].is_some() && w[0] == w[1] && w[1] == w[2]
        })
    }

    /// Assign a forced value, recording it on the trail. Returns false if
    /// the forced value is itself illegal, which kills the branch.
    fn force(
        &self,
        grid: &mut Grid,
        trail: &mut Vec<(Position, u8)>,
        pos: Position,
        value: u8,
    ) -> bool {
        if !self.is_legal(grid, pos, value) {
            return false;
        }
        grid.set(pos, Some(value));
        trail.push((pos, value));
        true
    }

    /// Rule 1: two adjacent equal cells force the opposite value on both
    /// flanking cells.
    fn propagate_pairs(
        &self,
        grid: &mut Grid,
        trail: &mut Vec<(Position, u8)>,
        changed: &mut bool,
    ) -> bool {
        let n = self.size;
        for row in 0..n {
            for col in 0..n - 1 {
                let a = grid.get(Position::new(row, col));
                if a.is_some() && a == grid.get(Position::new(row, col + 1)) {
                    let forced = 1 - a.unwrap();
                    if col > 0 {
                        let p = Position::new(row, col - 1);
                        if grid.get(p).is_none() {
                            if !self.force(grid, trail, p, forced) {
                                return false;
                            }
                            *changed = true;
                        }
                    }
                    if col + 2 < n {
                        let p = Position::new(row, col + 2);
                        if grid.get(p).is_none() {
                            if !self.force(grid, trail, p, forced) {
                                return false;
                            }
                            *changed = true;
                        }
                    }
                }
            }
        }
        for col in 0..n {
            for row in 0..n - 1 {
                let a = grid.get(Position::new(row, col));
                if a.is_some() && a == grid.get(Position::new(row + 1, col)) {
                    let forced = 1 - a.unwrap();
                    if row > 0 {
                        let p = Position::new(row - 1, col);
                        if grid.get(p).is_none() {
                            if !self.force(grid, trail, p, forced) {
                                return false;
                            }
                            *changed = true;
                        }
                    }
                    if row + 2 < n {
                        let p = Position::new(row + 2, col);
                        if grid.get(p).is_none() {
                            if !self.force(grid, trail, p, forced) {
                                return false;
                            }
                            *changed = true;
                        }
                    }
                }
            }
        }
        true
    }

    /// Rule 2: a line at N/2 of one value forces the other value into
    /// all of its remaining empty cells.
    fn propagate_counts(
        &self,
        grid: &mut Grid,
        trail: &mut Vec<(Position, u8)>,
        changed: &mut bool,
    ) -> bool {
        let n = self.size;
        let half = n / 2;
        for row in 0..n {
            let (zeros, ones) = Self::counts(&Self::row_values(grid, row));
            let forced = if zeros == half && ones < half {
                Some(1)
            } else if ones == half && zeros < half {
                Some(0)
            } else {
                None
            };
            if let Some(v) = forced {
                for col in 0..n {
                    let p = Position::new(row, col);
                    if grid.get(p).is_none() {
                        if !self.force(grid, trail, p, v) {
                            return false;
                        }
                        *changed = true;
                    }
                }
            }
        }
        for col in 0..n {
            let (zeros, ones) = Self::counts(&Self::col_values(grid, col));
            let forced = if zeros == half && ones < half {
                Some(1)
            } else if ones == half && zeros < half {
                Some(0)
            } else {
                None
            };
            if let Some(v) = forced {
                for row in 0..n {
                    let p = Position::new(row, col);
                    if grid.get(p).is_none() {
                        if !self.force(grid, trail, p, v) {
                            return false;
                        }
                        *changed = true;
                    }
                }
            }
        }
        true
    }

    /// Rule 3: a row with a single empty cell may not be completed so as
    /// to duplicate an already-complete row, and two complete rows must
    /// never be equal.
    ///
    /// Rows only; column uniqueness is left to the search fallback. Must
    /// run before the count rule, which otherwise fills the single gap
    /// first and defers the duplicate to the goal test.
    fn propagate_unique_rows(
        &self,
        grid: &mut Grid,
        trail: &mut Vec<(Position, u8)>,
        changed: &mut bool,
    ) -> bool {
        let n = self.size;
        let complete: Vec<Vec<Option<u8>>> = (0..n)
            .map(|row| Self::row_values(grid, row))
            .filter(|vals| vals.iter().all(|v| v.is_some()))
            .collect();
        if complete.is_empty() {
            return true;
        }
        for (i, a) in complete.iter().enumerate() {
            if complete[i + 1..].contains(a) {
                return false;
            }
        }
        for row in 0..n {
            let vals = Self::row_values(grid, row);
            let empties: Vec<usize> = (0..n).filter(|&c| vals[c].is_none()).collect();
            if empties.len() != 1 {
                continue;
            }
            let col = empties[0];
            let mut allowed = Vec::new();
            for v in BINARY_VALUES {
                let mut candidate = vals.clone();
                candidate[col] = Some(v);
                if !complete.iter().any(|done| *done == candidate) {
                    allowed.push(v);
                }
            }
            match allowed.as_slice() {
                [] => return false,
                [v] => {
                    if !self.force(grid, trail, Position::new(row, col), *v) {
                        return false;
                    }
                    *changed = true;
                }
                _ => {}
            }
        }
        true
    }

    fn lines_ok(&self, grid: &Grid, require_complete: bool) -> bool {
        let n = self.size;
        let half = n / 2;
        let mut complete_rows: Vec<Vec<Option<u8>>> = Vec::new();
        let mut complete_cols: Vec<Vec<Option<u8>>> = Vec::new();
        for i in 0..n {
            for vals in [Self::row_values(grid, i), Self::col_values(grid, i)] {
                if vals.iter().flatten().any(|v| *v > 1) {
                    return false;
                }
                if Self::has_triple(&vals) {
                    return false;
                }
                let (zeros, ones) = Self::counts(&vals);
                if zeros > half || ones > half {
                    return false;
                }
                if require_complete && (zeros != half || ones != half) {
                    return false;
                }
            }
            let row = Self::row_values(grid, i);
            if row.iter().all(|v| v.is_some()) {
                if complete_rows.contains(&row) {
                    return false;
                }
                complete_rows.push(row);
            }
            let col = Self::col_values(grid, i);
            if col.iter().all(|v| v.is_some()) {
                if complete_cols.contains(&col) {
                    return false;
                }
                complete_cols.push(col);
            }
        }
        true
    }
}

impl RuleSet for BinaryRules {
    fn values(&self) -> &[u8] {
        &BINARY_VALUES
    }

    fn is_legal(&self, grid: &Grid, pos: Position, value: u8) -> bool {
        let n = self.size;
        let (row, col) = (pos.row, pos.col);
        let v = Some(value);
        let at = |r: usize, c: usize| grid.get(Position::new(r, c));

        // Three consecutive in the row: pair to the left, pair to the
        // right, or filling the gap between two equal neighbours.
        if col >= 2 && at(row, col - 1) == v && at(row, col - 2) == v {
            return false;
        }
        if col + 2 < n && at(row, col + 1) == v && at(row, col + 2) == v {
            return false;
        }
        if col >= 1 && col + 1 < n && at(row, col - 1) == v && at(row, col + 1) == v {
            return false;
        }

        // Same for the column.
        if row >= 2 && at(row - 1, col) == v && at(row - 2, col) == v {
            return false;
        }
        if row + 2 < n && at(row + 1, col) == v && at(row + 2, col) == v {
            return false;
        }
        if row >= 1 && row + 1 < n && at(row - 1, col) == v && at(row + 1, col) == v {
            return false;
        }

        // Neither count may pass N/2.
        let half = n / 2;
        let row_count = (0..n).filter(|&c| at(row, c) == v).count();
        if row_count + 1 > half {
            return false;
        }
        let col_count = (0..n).filter(|&r| at(r, col) == v).count();
        if col_count + 1 > half {
            return false;
        }

        true
    }

    fn propagate(&mut self, grid: &mut Grid, trail: &mut Vec<(Position, u8)>) -> Propagation {
        let mut changed = false;
        if !self.propagate_pairs(grid, trail, &mut changed) {
            return Propagation::Contradiction;
        }
        if !self.propagate_unique_rows(grid, trail, &mut changed) {
            return Propagation::Contradiction;
        }
        if !self.propagate_counts(grid, trail, &mut changed) {
            return Propagation::Contradiction;
        }
        if changed {
            Propagation::Changed
        } else {
            Propagation::Unchanged
        }
    }

    fn is_solved(&self, grid: &Grid) -> bool {
        grid.size() == self.size && grid.is_complete() && self.lines_ok(grid, true)
    }

    fn is_consistent(&self, grid: &Grid) -> bool {
        grid.size() == self.size && self.lines_ok(grid, false)
    }
}
