use crate::error::Error;
use crate::grid::{Grid, Position};
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};

const KAKURO_VALUES: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

/// A sum clue, anchored at the first open cell of its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub row: usize,
    pub col: usize,
    pub sum: u32,
    pub horizontal: bool,
}

impl Clue {
    pub fn across(row: usize, col: usize, sum: u32) -> Self {
        Self {
            row,
            col,
            sum,
            horizontal: true,
        }
    }

    pub fn down(row: usize, col: usize, sum: u32) -> Self {
        Self {
            row,
            col,
            sum,
            horizontal: false,
        }
    }
}

/// A kakuro board: the value grid, the blocked-cell mask and the clues.
///
/// Clues are boundary data; the solver works on the runs derived from
/// them by [`KakuroRules::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KakuroBoardData")]
pub struct KakuroBoard {
    grid: Grid,
    blocked: Vec<bool>,
    clues: Vec<Clue>,
}

/// Raw mirror of [`KakuroBoard`]; deserialization funnels through the
/// validating constructor.
#[derive(Deserialize)]
struct KakuroBoardData {
    grid: Grid,
    blocked: Vec<bool>,
    clues: Vec<Clue>,
}

impl TryFrom<KakuroBoardData> for KakuroBoard {
    type Error = Error;

    fn try_from(data: KakuroBoardData) -> Result<Self, Error> {
        Self::with_grid(data.grid, data.blocked, data.clues)
    }
}

impl KakuroBoard {
    /// Build an empty board from a blocked mask and clue list.
    ///
    /// Rejects a mask of the wrong length, out-of-bounds or blocked clue
    /// anchors, zero sums, and cell values outside 1-9.
    pub fn new(size: usize, blocked: Vec<bool>, clues: Vec<Clue>) -> Result<Self, Error> {
        Self::with_grid(Grid::new(size), blocked, clues)
    }

    /// Build a board around an existing (possibly pre-filled) grid.
    pub fn with_grid(grid: Grid, blocked: Vec<bool>, clues: Vec<Clue>) -> Result<Self, Error> {
        let size = grid.size();
        if blocked.len() != size * size {
            return Err(Error::InvalidInput(format!(
                "blocked mask has {} entries, expected {}",
                blocked.len(),
                size * size
            )));
        }
        for (i, flag) in blocked.iter().enumerate() {
            let (row, col) = (i / size, i % size);
            match grid.get(Position::new(row, col)) {
                Some(_) if *flag => {
                    return Err(Error::InvalidInput(format!(
                        "blocked cell ({}, {}) holds a value",
                        row, col
                    )));
                }
                Some(v) if !(1..=9).contains(&v) => {
                    return Err(Error::InvalidInput(format!(
                        "cell ({}, {}) holds {}, outside 1-9",
                        row, col, v
                    )));
                }
                _ => {}
            }
        }
        for clue in &clues {
            if clue.row >= size || clue.col >= size {
                return Err(Error::InvalidInput(format!(
                    "clue anchor ({}, {}) out of bounds",
                    clue.row, clue.col
                )));
            }
            if blocked[clue.row * size + clue.col] {
                return Err(Error::InvalidInput(format!(
                    "clue anchor ({}, {}) is a blocked cell",
                    clue.row, clue.col
                )));
            }
            if clue.sum == 0 {
                return Err(Error::InvalidInput(format!(
                    "clue at ({}, {}) has zero sum",
                    clue.row, clue.col
                )));
            }
        }
        Ok(Self {
            grid,
            blocked,
            clues,
        })
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    pub fn is_blocked(&self, pos: Position) -> bool {
        self.blocked[pos.index(self.grid.size())]
    }

    pub(crate) fn blocked_mask(&self) -> &[bool] {
        &self.blocked
    }

    /// Open cells in row-major order.
    pub fn open_positions(&self) -> Vec<Position> {
        let size = self.grid.size();
        (0..size * size)
            .filter(|i| !self.blocked[*i])
            .map(|i| Position::new(i / size, i % size))
            .collect()
    }
}

impl std::fmt::Display for KakuroBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.grid.size();
        for row in 0..size {
            for col in 0..size {
                let pos = Position::new(row, col);
                if self.is_blocked(pos) {
                    write!(f, " # ")?;
                } else {
                    match self.grid.get(pos) {
                        Some(v) => write!(f, " {} ", v)?,
                        None => write!(f, " _ ")?,
                    }
                }
            }
            writeln!(f)?;
        }
        for clue in &self.clues {
            writeln!(
                f,
                "{:>2} {} from ({}, {})",
                clue.sum,
                if clue.horizontal { "across" } else { "down" },
                clue.row,
                clue.col
            )?;
        }
        Ok(())
    }
}

/// Handle into the run arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunId(usize);

/// One run: a contiguous sequence of open cells bound to a sum clue,
/// plus the live bookkeeping the solver maintains while searching.
#[derive(Debug, Clone)]
pub struct Run {
    cells: Vec<Position>,
    target_sum: u32,
    current_sum: u32,
    used: u16,
    remaining: usize,
}

impl Run {
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    pub fn target_sum(&self) -> u32 {
        self.target_sum
    }

    fn uses(&self, value: u8) -> bool {
        self.used & (1 << value) != 0
    }

    /// Smallest and largest totals reachable by `count` distinct unused
    /// digits, with `extra` also treated as unavailable.
    fn bounds(&self, count: usize, extra: u8) -> (u32, u32) {
        let mut free: Vec<u32> = (1..=9u8)
            .filter(|d| !self.uses(*d) && *d != extra)
            .map(u32::from)
            .collect();
        if free.len() < count {
            // Not enough distinct digits left; unreachable bounds.
            return (u32::MAX, 0);
        }
        let min: u32 = free.iter().take(count).sum();
        free.reverse();
        let max: u32 = free.iter().take(count).sum();
        (min, max)
    }

    /// Whether placing `value` leaves the run completable: the last cell
    /// must hit the target exactly, earlier cells must leave the rest
    /// reachable with distinct digits 1-9.
    fn admits(&self, value: u8) -> bool {
        if self.uses(value) {
            return false;
        }
        let sum = self.current_sum + u32::from(value);
        if self.remaining == 1 {
            return sum == self.target_sum;
        }
        if sum >= self.target_sum {
            return false;
        }
        let rest = self.target_sum - sum;
        let (min, max) = self.bounds(self.remaining - 1, value);
        min <= rest && rest <= max
    }
}

/// Kakuro rule set: run-sum admissibility over the derived run arena.
///
/// Cells keep integer handles into the arena instead of references, so
/// a cell shared by an across and a down run is just the intersection
/// point of two handle lists.
#[derive(Debug, Clone)]
pub struct KakuroRules {
    size: usize,
    blocked: Vec<bool>,
    runs: Vec<Run>,
    cell_runs: Vec<Vec<RunId>>,
}

impl KakuroRules {
    /// Derive the run set from the board's clues and seed the run state
    /// from any already-filled cells.
    pub fn new(board: &KakuroBoard) -> Result<Self, Error> {
        let size = board.size();
        let blocked = board.blocked_mask().to_vec();
        let mut runs: Vec<Run> = Vec::new();
        let mut cell_runs: Vec<Vec<RunId>> = vec![Vec::new(); size * size];

        for clue in board.clues() {
            let mut cells = Vec::new();
            let (mut row, mut col) = (clue.row, clue.col);
            while row < size && col < size && !blocked[row * size + col] {
                cells.push(Position::new(row, col));
                if clue.horizontal {
                    col += 1;
                } else {
                    row += 1;
                }
            }
            let id = RunId(runs.len());
            for pos in &cells {
                let slot = &mut cell_runs[pos.index(size)];
                if slot.len() >= 2 {
                    return Err(Error::InvalidInput(format!(
                        "cell ({}, {}) belongs to more than two runs",
                        pos.row, pos.col
                    )));
                }
                slot.push(id);
            }
            runs.push(Run {
                cells,
                target_sum: clue.sum,
                current_sum: 0,
                used: 0,
                remaining: 0,
            });
        }

        // Seed run bookkeeping from pre-filled cells.
        for run in &mut runs {
            run.remaining = run.cells.len();
            for pos in run.cells.clone() {
                if let Some(v) = board.grid().get(pos) {
                    run.current_sum += u32::from(v);
                    run.used |= 1 << v;
                    run.remaining -= 1;
                }
            }
        }

        Ok(Self {
            size,
            blocked,
            runs,
            cell_runs,
        })
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    fn runs_of(&self, pos: Position) -> &[RunId] {
        &self.cell_runs[pos.index(self.size)]
    }
}

impl RuleSet for KakuroRules {
    fn values(&self) -> &[u8] {
        &KAKURO_VALUES
    }

    fn is_fillable(&self, pos: Position) -> bool {
        !self.blocked[pos.index(self.size)]
    }

    fn is_legal(&self, _grid: &Grid, pos: Position, value: u8) -> bool {
        self.runs_of(pos)
            .iter()
            .all(|id| self.runs[id.0].admits(value))
    }

    fn on_assign(&mut self, pos: Position, value: u8) {
        for id in self.cell_runs[pos.index(self.size)].clone() {
            let run = &mut self.runs[id.0];
            run.current_sum += u32::from(value);
            run.used |= 1 << value;
            run.remaining -= 1;
        }
    }

    fn on_unassign(&mut self, pos: Position, value: u8) {
        for id in self.cell_runs[pos.index(self.size)].clone() {
            let run = &mut self.runs[id.0];
            run.current_sum -= u32::from(value);
            run.used &= !(1 << value);
            run.remaining += 1;
        }
    }

    /// Recomputed from the grid, independent of the live counters: every
    /// open cell filled, every run duplicate-free and exactly on target.
    fn is_solved(&self, grid: &Grid) -> bool {
        for row in 0..self.size {
            for col in 0..self.size {
                let pos = Position::new(row, col);
                if !self.blocked[pos.index(self.size)] && grid.get(pos).is_none() {
                    return false;
                }
            }
        }
        self.runs.iter().all(|run| {
            let mut sum = 0u32;
            let mut seen = 0u16;
            for pos in &run.cells {
                match grid.get(*pos) {
                    Some(v) => {
                        if seen & (1 << v) != 0 {
                            return false;
                        }
                        seen |= 1 << v;
                        sum += u32::from(v);
                    }
                    None => return false,
                }
            }
            sum == run.target_sum
        })
    }

    fn is_consistent(&self, grid: &Grid) -> bool {
        self.runs.iter().all(|run| {
            let mut sum = 0u32;
            let mut seen = 0u16;
            let mut empty = 0usize;
            for pos in &run.cells {
                match grid.get(*pos) {
                    Some(v) => {
                        if !(1..=9).contains(&v) || seen & (1 << v) != 0 {
                            return false;
                        }
                        seen |= 1 << v;
                        sum += u32::from(v);
                    }
                    None => empty += 1,
                }
            }
            if empty == 0 {
                return sum == run.target_sum;
            }
            // The rest of the run must still be reachable with distinct
            // unused digits.
            if sum >= run.target_sum {
                return false;
            }
            let rest = run.target_sum - sum;
            let mut free: Vec<u32> = (1..=9u8)
                .filter(|d| seen & (1 << d) == 0)
                .map(u32::from)
                .collect();
            if free.len() < empty {
                return false;
            }
            let min: u32 = free.iter().take(empty).sum();
            free.reverse();
            let max: u32 = free.iter().take(empty).sum();
            min <= rest && rest <= max
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 board, one blocked cell at (1, 1), an across run of length 2
    /// in row 0 and a down run of length 2 in column 0.
    fn small_board() -> KakuroBoard {
        let blocked = vec![
            false, false, true, //
            false, true, true, //
            true, true, true,
        ];
        let clues = vec![Clue::across(0, 0, 3), Clue::down(0, 0, 4)];
        KakuroBoard::new(3, blocked, clues).unwrap()
    }

    #[test]
    fn test_run_extraction() {
        let board = small_board();
        let rules = KakuroRules::new(&board).unwrap();
        assert_eq!(rules.runs().len(), 2);
        assert_eq!(rules.runs()[0].cells().len(), 2);
        assert_eq!(rules.runs()[0].target_sum(), 3);
        assert_eq!(rules.runs()[1].cells().len(), 2);
        // (0, 0) is the intersection of both runs.
        assert_eq!(rules.runs_of(Position::new(0, 0)).len(), 2);
        assert_eq!(rules.runs_of(Position::new(0, 1)).len(), 1);
    }

    #[test]
    fn test_blocked_cells_not_fillable() {
        let board = small_board();
        let rules = KakuroRules::new(&board).unwrap();
        assert!(!rules.is_fillable(Position::new(1, 1)));
        assert!(rules.is_fillable(Position::new(0, 0)));
    }

    #[test]
    fn test_last_cell_must_hit_target() {
        let board = small_board();
        let mut rules = KakuroRules::new(&board).unwrap();
        let grid = board.grid().clone();
        // Sum 3 over two cells only admits 1 and 2.
        assert!(rules.is_legal(&grid, Position::new(0, 1), 1));
        assert!(rules.is_legal(&grid, Position::new(0, 1), 2));
        assert!(!rules.is_legal(&grid, Position::new(0, 1), 3));

        let mut grid = grid;
        grid.set(Position::new(0, 1), Some(1));
        rules.on_assign(Position::new(0, 1), 1);
        // (0, 0) is now the last cell of the across run, so it must be
        // exactly 2 - which also still fits the down run.
        assert!(rules.is_legal(&grid, Position::new(0, 0), 2));
        assert!(!rules.is_legal(&grid, Position::new(0, 0), 1));
        assert!(!rules.is_legal(&grid, Position::new(0, 0), 3));

        rules.on_unassign(Position::new(0, 1), 1);
        grid.clear(Position::new(0, 1));
        assert!(rules.is_legal(&grid, Position::new(0, 1), 2));
    }

    #[test]
    fn test_no_duplicates_inside_run() {
        let board = small_board();
        let mut rules = KakuroRules::new(&board).unwrap();
        let mut grid = board.grid().clone();
        grid.set(Position::new(0, 0), Some(1));
        rules.on_assign(Position::new(0, 0), 1);
        // Down run (sum 4) now needs exactly 3 at (1, 0); 1 is used.
        assert!(!rules.is_legal(&grid, Position::new(1, 0), 1));
        assert!(rules.is_legal(&grid, Position::new(1, 0), 3));
    }

    #[test]
    fn test_is_solved_requires_exact_sums() {
        let board = small_board();
        let rules = KakuroRules::new(&board).unwrap();
        let mut grid = board.grid().clone();
        grid.set(Position::new(0, 0), Some(1));
        grid.set(Position::new(0, 1), Some(2));
        grid.set(Position::new(1, 0), Some(3));
        assert!(rules.is_solved(&grid));

        grid.set(Position::new(1, 0), Some(2));
        assert!(!rules.is_solved(&grid));
    }

    #[test]
    fn test_consistency_bounds() {
        let board = small_board();
        let rules = KakuroRules::new(&board).unwrap();
        let mut grid = board.grid().clone();
        assert!(rules.is_consistent(&grid));
        // 3 alone already exhausts the across target with a cell to go.
        grid.set(Position::new(0, 1), Some(3));
        assert!(!rules.is_consistent(&grid));
    }

    #[test]
    fn test_rejects_bad_layout() {
        // Clue anchored on a blocked cell.
        let blocked = vec![true, false, false, false];
        let res = KakuroBoard::new(2, blocked, vec![Clue::across(0, 0, 3)]);
        assert!(matches!(res, Err(Error::InvalidInput(_))));

        // Wrong mask length.
        let res = KakuroBoard::new(2, vec![false; 3], vec![]);
        assert!(matches!(res, Err(Error::InvalidInput(_))));

        // Cell value outside 1-9.
        let mut grid = Grid::new(2);
        grid.set(Position::new(0, 0), Some(12));
        let res = KakuroBoard::with_grid(grid, vec![false; 4], vec![]);
        assert!(matches!(res, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_open_positions() {
        let board = small_board();
        assert_eq!(
            board.open_positions(),
            vec![Position::new(0, 0), Position::new(0, 1), Position::new(1, 0)]
        );
    }

    #[test]
    fn test_deserialize_revalidates() {
        let board = small_board();
        let json = serde_json::to_string(&board).unwrap();
        let back: KakuroBoard = serde_json::from_str(&json).unwrap();
        assert_eq!(board, back);

        // A board bypassing the constructor fails to round-trip.
        let mut grid = Grid::new(3);
        grid.set(Position::new(0, 0), Some(17));
        let bad = KakuroBoard {
            grid,
            blocked: board.blocked.clone(),
            clues: board.clues.clone(),
        };
        let json = serde_json::to_string(&bad).unwrap();
        assert!(serde_json::from_str::<KakuroBoard>(&json).is_err());
    }
}
