use crate::binary::BinaryRules;
use crate::error::Error;
use crate::grid::{Grid, Position};
use crate::kakuro::{Clue, KakuroBoard, KakuroRules};
use crate::rules::RuleSet;
use crate::solver::{Solver, SolverConfig};
use crate::sudoku::SudokuRules;
use log::debug;
use serde::{Deserialize, Serialize};

/// Target difficulty for generated puzzles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// How many cells to carve out of a full sudoku grid (inclusive).
    fn removal_range(&self) -> (usize, usize) {
        match self {
            Difficulty::Easy => (40, 45),
            Difficulty::Medium => (46, 50),
            Difficulty::Hard => (51, 56),
            Difficulty::Expert => (57, 64),
        }
    }

    pub fn all_levels() -> &'static [Difficulty] {
        &[
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Expert,
        ]
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
            Difficulty::Expert => write!(f, "Expert"),
        }
    }
}

const BINARY_MAX_ATTEMPTS: usize = 50;
const BINARY_REPAIR_ITERATIONS: usize = 1_000;
const KAKURO_MAX_ATTEMPTS: usize = 100;
/// Generated kakuro sums are capped low to keep small boards friendly.
const KAKURO_SUM_CAP: u32 = 10;

/// Puzzle generator for all three puzzle types.
///
/// Every puzzle is built by construction - seed a valid solution, then
/// carve - rather than by validating random noise, with a small bounded
/// retry loop where a repair step can fail.
pub struct Generator {
    rng: SimpleRng,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Entropy-seeded generator.
    pub fn new() -> Self {
        Self {
            rng: SimpleRng::new(),
        }
    }

    /// Deterministic generator: the same seed reproduces the same
    /// puzzles, parameter for parameter.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SimpleRng::with_seed(seed),
        }
    }

    // ==================== Sudoku ====================

    /// Generate a 9x9 sudoku at the given difficulty.
    ///
    /// The three diagonal boxes are filled with independent random
    /// permutations (they cannot conflict), the rest is completed by the
    /// solver, then a difficulty-dependent number of cells is removed.
    pub fn sudoku(&mut self, difficulty: Difficulty) -> Grid {
        let mut grid = loop {
            let mut grid = Grid::new(9);
            for start in [0, 3, 6] {
                self.fill_box(&mut grid, start, start);
            }
            let mut rules = SudokuRules::new();
            if Solver::new().solve(&mut grid, &mut rules).is_ok() {
                break grid;
            }
            // Diagonal boxes are always completable; try fresh anyway.
        };

        let (lo, hi) = difficulty.removal_range();
        let to_remove = lo + self.rng.next_usize(hi - lo + 1);
        let mut removed = 0;
        while removed < to_remove {
            let idx = self.rng.next_usize(81);
            let pos = Position::new(idx / 9, idx % 9);
            if grid.get(pos).is_some() {
                grid.clear(pos);
                removed += 1;
            }
        }

        // Everything that survived the carve is a given.
        for row in 0..9 {
            for col in 0..9 {
                let pos = Position::new(row, col);
                if let Some(v) = grid.get(pos) {
                    grid.set_given(pos, v);
                }
            }
        }
        grid
    }

    /// Fill a 3x3 box with a random permutation of 1-9.
    fn fill_box(&mut self, grid: &mut Grid, start_row: usize, start_col: usize) {
        let mut values: Vec<u8> = (1..=9).collect();
        self.shuffle(&mut values);
        for (i, v) in values.into_iter().enumerate() {
            grid.set_given(Position::new(start_row + i / 3, start_col + i % 3), v);
        }
    }

    // ==================== Binary ====================

    /// Generate a binary puzzle of even size `size` (8 or 10 typically).
    ///
    /// Starts from a randomly flipped checkerboard, repairs it into a
    /// valid full grid (bounded iterations, fresh grid on failure), then
    /// erases roughly half the cells.
    pub fn binary(&mut self, size: usize) -> Result<Grid, Error> {
        if size == 0 || size % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "binary puzzle size must be a positive even number, got {}",
                size
            )));
        }

        let rules = BinaryRules::new(size);
        for attempt in 0..BINARY_MAX_ATTEMPTS {
            let mut values: Vec<Vec<u8>> = (0..size)
                .map(|row| {
                    (0..size)
                        .map(|col| {
                            let mut v = ((row + col) % 2) as u8;
                            if self.rng.next_bool() {
                                v = 1 - v;
                            }
                            v
                        })
                        .collect()
                })
                .collect();

            if !self.repair_binary(&mut values) {
                debug!("binary repair did not converge (attempt {})", attempt);
                continue;
            }

            let mut full = Grid::new(size);
            for (row, row_vals) in values.iter().enumerate() {
                for (col, &v) in row_vals.iter().enumerate() {
                    full.set(Position::new(row, col), Some(v));
                }
            }
            // The repair loop leaves no triples and balanced lines, but
            // duplicate rows or columns can survive it.
            if !rules.is_solved(&full) {
                debug!("binary repair left an invalid grid (attempt {})", attempt);
                continue;
            }

            let mut puzzle = Grid::new(size);
            for row in 0..size {
                for col in 0..size {
                    if self.rng.next_bool() {
                        puzzle.set_given(Position::new(row, col), values[row][col]);
                    }
                }
            }
            return Ok(puzzle);
        }
        Err(Error::Generation(
            "binary repair loop failed to converge".into(),
        ))
    }

    /// Repair a full 0/1 matrix into a triple-free, balanced grid.
    ///
    /// Alternates fixing consecutive triples with rebalancing row and
    /// column counts until a whole sweep changes nothing. Returns false
    /// if the iteration cap is hit first.
    fn repair_binary(&mut self, values: &mut [Vec<u8>]) -> bool {
        let size = values.len();
        let half = size / 2;
        for _ in 0..BINARY_REPAIR_ITERATIONS {
            let mut changed = false;

            for row in 0..size {
                for col in 0..size - 2 {
                    if values[row][col] == values[row][col + 1]
                        && values[row][col] == values[row][col + 2]
                    {
                        values[row][col + 2] = 1 - values[row][col];
                        changed = true;
                    }
                }
            }
            for col in 0..size {
                for row in 0..size - 2 {
                    if values[row][col] == values[row + 1][col]
                        && values[row][col] == values[row + 2][col]
                    {
                        values[row + 2][col] = 1 - values[row][col];
                        changed = true;
                    }
                }
            }

            // Rebalance only once no triple is left, so the swaps work
            // against a stable layout.
            if !changed {
                for row in 0..size {
                    let ones = values[row].iter().filter(|v| **v == 1).count();
                    if ones != half {
                        self.rebalance_row(values, row, half);
                        changed = true;
                    }
                }
                for col in 0..size {
                    let ones = (0..size).filter(|&r| values[r][col] == 1).count();
                    if ones != half {
                        self.rebalance_col(values, col, half);
                        changed = true;
                    }
                }
            }

            if !changed {
                return true;
            }
        }
        false
    }

    /// Swap excess majority cells to the minority value at random
    /// positions until the row holds exactly `half` ones.
    fn rebalance_row(&mut self, values: &mut [Vec<u8>], row: usize, half: usize) {
        let size = values.len();
        let mut indices: Vec<usize> = (0..size).collect();
        self.shuffle(&mut indices);
        let mut ones = values[row].iter().filter(|v| **v == 1).count();
        for col in indices {
            if ones > half && values[row][col] == 1 {
                values[row][col] = 0;
                ones -= 1;
            } else if ones < half && values[row][col] == 0 {
                values[row][col] = 1;
                ones += 1;
            }
            if ones == half {
                break;
            }
        }
    }

    fn rebalance_col(&mut self, values: &mut [Vec<u8>], col: usize, half: usize) {
        let size = values.len();
        let mut indices: Vec<usize> = (0..size).collect();
        self.shuffle(&mut indices);
        let mut ones = (0..size).filter(|&r| values[r][col] == 1).count();
        for row in indices {
            if ones > half && values[row][col] == 1 {
                values[row][col] = 0;
                ones -= 1;
            } else if ones < half && values[row][col] == 0 {
                values[row][col] = 1;
                ones += 1;
            }
            if ones == half {
                break;
            }
        }
    }

    // ==================== Kakuro ====================

    /// Generate a kakuro board of the given size (default callers use 5).
    ///
    /// Blocks about a quarter of the cells (corners kept open), gives
    /// every maximal open segment a sum clue favoring small sums, and
    /// accepts the layout only once the solver confirms it is solvable.
    pub fn kakuro(&mut self, size: usize) -> Result<KakuroBoard, Error> {
        if size < 2 {
            return Err(Error::InvalidInput(format!(
                "kakuro size must be at least 2, got {}",
                size
            )));
        }

        for attempt in 0..KAKURO_MAX_ATTEMPTS {
            let mut blocked = vec![false; size * size];
            for flag in blocked.iter_mut() {
                if self.rng.next_usize(4) == 0 {
                    *flag = true;
                }
            }
            blocked[0] = false;
            blocked[size * size - 1] = false;
            self.split_long_segments(&mut blocked, size);

            let clues = self.segment_clues(&blocked, size);
            let board = KakuroBoard::new(size, blocked, clues)?;

            // Random sums can contradict each other where runs cross;
            // only a successful solve proves the board is worth handing
            // out.
            let mut probe = board.clone();
            let mut rules = KakuroRules::new(&probe)?;
            let solver = Solver::with_config(SolverConfig::kakuro());
            match solver.solve(probe.grid_mut(), &mut rules) {
                Ok(()) => return Ok(board),
                Err(err) => debug!("kakuro attempt {} rejected: {}", attempt, err),
            }
        }
        Err(Error::Generation(
            "no solvable kakuro layout found within the retry budget".into(),
        ))
    }

    /// One clue per maximal run of open cells, across then down.
    fn segment_clues(&mut self, blocked: &[bool], size: usize) -> Vec<Clue> {
        let mut clues = Vec::new();
        let open = |row: usize, col: usize| !blocked[row * size + col];

        for row in 0..size {
            let mut col = 0;
            while col < size {
                if open(row, col) {
                    let start = col;
                    while col < size && open(row, col) {
                        col += 1;
                    }
                    clues.push(Clue::across(row, start, self.run_sum(col - start)));
                } else {
                    col += 1;
                }
            }
        }
        for col in 0..size {
            let mut row = 0;
            while row < size {
                if open(row, col) {
                    let start = row;
                    while row < size && open(row, col) {
                        row += 1;
                    }
                    clues.push(Clue::down(start, col, self.run_sum(row - start)));
                } else {
                    row += 1;
                }
            }
        }
        clues
    }

    /// Uniform sum between the run's minimum and a capped maximum.
    fn run_sum(&mut self, len: usize) -> u32 {
        let len = len as u32;
        let min = len * (len + 1) / 2;
        let max = 19u32.saturating_sub(len) * len / 2;
        let cap = max.min(KAKURO_SUM_CAP).max(min);
        min + self.rng.next_usize((cap - min + 1) as usize) as u32
    }

    /// Distinct digits 1-9 cap a run at nine cells; break anything
    /// longer by blocking a random interior cell until no over-long
    /// segment remains. The open corners are never blocked.
    fn split_long_segments(&mut self, blocked: &mut [bool], size: usize) {
        while let Some(cells) = Self::find_long_segment(blocked, size) {
            let eligible: Vec<usize> = cells
                .into_iter()
                .filter(|&i| i != 0 && i != size * size - 1)
                .collect();
            let pick = eligible[self.rng.next_usize(eligible.len())];
            blocked[pick] = true;
        }
    }

    /// First maximal open segment longer than nine cells, as flat
    /// indices, or `None`.
    fn find_long_segment(blocked: &[bool], size: usize) -> Option<Vec<usize>> {
        let open = |row: usize, col: usize| !blocked[row * size + col];
        for row in 0..size {
            let mut col = 0;
            while col < size {
                if open(row, col) {
                    let start = col;
                    while col < size && open(row, col) {
                        col += 1;
                    }
                    if col - start > 9 {
                        return Some((start..col).map(|c| row * size + c).collect());
                    }
                } else {
                    col += 1;
                }
            }
        }
        for col in 0..size {
            let mut row = 0;
            while row < size {
                if open(row, col) {
                    let start = row;
                    while row < size && open(row, col) {
                        row += 1;
                    }
                    if row - start > 9 {
                        return Some((start..row).map(|r| r * size + col).collect());
                    }
                } else {
                    row += 1;
                }
            }
        }
        None
    }

    /// Fisher-Yates shuffle.
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.rng.next_usize(i + 1);
            slice.swap(i, j);
        }
    }
}

/// Small PCG-style PRNG, seeded from the OS but replayable from a fixed
/// seed for deterministic generation in tests.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new() -> Self {
        let mut seed_bytes = [0u8; 8];
        getrandom::getrandom(&mut seed_bytes).unwrap_or_else(|_| {
            static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
            let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            seed_bytes = counter.to_le_bytes();
        });
        Self::with_seed(u64::from_le_bytes(seed_bytes))
    }

    fn with_seed(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((self.state >> 18) ^ self.state) >> 27) as u32;
        let rot = (self.state >> 59) as u32;
        u64::from(xorshifted.rotate_right(rot))
    }

    fn next_usize(&mut self, bound: usize) -> usize {
        (self.next_u64() as usize) % bound
    }

    fn next_bool(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }
}
