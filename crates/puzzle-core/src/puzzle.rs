use crate::binary::BinaryRules;
use crate::error::{Error, SolveError};
use crate::generator::{Difficulty, Generator};
use crate::grid::Grid;
use crate::kakuro::{KakuroBoard, KakuroRules};
use crate::rules::RuleSet;
use crate::solver::{Solver, SolverConfig};
use crate::sudoku::SudokuRules;
use serde::{Deserialize, Serialize};

/// The puzzle families the engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PuzzleKind {
    Sudoku,
    Binary,
    Kakuro,
}

impl std::fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PuzzleKind::Sudoku => write!(f, "sudoku"),
            PuzzleKind::Binary => write!(f, "binary"),
            PuzzleKind::Kakuro => write!(f, "kakuro"),
        }
    }
}

/// A puzzle instance of any supported kind.
///
/// Constructors validate the shape up front so that downstream code can
/// rely on a well-formed board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PuzzleData")]
pub enum Puzzle {
    Sudoku(Grid),
    Binary(Grid),
    Kakuro(KakuroBoard),
}

/// Raw mirror of [`Puzzle`]; deserialization funnels through the
/// validating constructors, so a crafted JSON file cannot smuggle
/// out-of-alphabet values past them.
#[derive(Deserialize)]
enum PuzzleData {
    Sudoku(Grid),
    Binary(Grid),
    Kakuro(KakuroBoard),
}

impl TryFrom<PuzzleData> for Puzzle {
    type Error = Error;

    fn try_from(data: PuzzleData) -> Result<Self, Error> {
        match data {
            PuzzleData::Sudoku(grid) => Puzzle::sudoku(grid),
            PuzzleData::Binary(grid) => Puzzle::binary(grid),
            // KakuroBoard revalidates in its own deserialization.
            PuzzleData::Kakuro(board) => Ok(Puzzle::Kakuro(board)),
        }
    }
}

impl Puzzle {
    /// Wrap a 9x9 grid holding digits 1-9 as a sudoku.
    pub fn sudoku(grid: Grid) -> Result<Self, Error> {
        if grid.size() != 9 {
            return Err(Error::InvalidInput(format!(
                "sudoku grids are 9x9, got {}x{}",
                grid.size(),
                grid.size()
            )));
        }
        for value in grid.clone_values().into_iter().flatten() {
            if !(1..=9).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "sudoku cells hold 1-9, got {}",
                    value
                )));
            }
        }
        Ok(Puzzle::Sudoku(grid))
    }

    /// Wrap an even-sized 0/1 grid as a binary puzzle.
    pub fn binary(grid: Grid) -> Result<Self, Error> {
        if grid.size() == 0 || grid.size() % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "binary grids have a positive even size, got {}",
                grid.size()
            )));
        }
        for value in grid.clone_values().into_iter().flatten() {
            if value > 1 {
                return Err(Error::InvalidInput(format!(
                    "binary cells hold 0 or 1, got {}",
                    value
                )));
            }
        }
        Ok(Puzzle::Binary(grid))
    }

    /// Wrap an already validated kakuro board.
    pub fn kakuro(board: KakuroBoard) -> Self {
        Puzzle::Kakuro(board)
    }

    pub fn kind(&self) -> PuzzleKind {
        match self {
            Puzzle::Sudoku(_) => PuzzleKind::Sudoku,
            Puzzle::Binary(_) => PuzzleKind::Binary,
            Puzzle::Kakuro(_) => PuzzleKind::Kakuro,
        }
    }

    pub fn grid(&self) -> &Grid {
        match self {
            Puzzle::Sudoku(grid) | Puzzle::Binary(grid) => grid,
            Puzzle::Kakuro(board) => board.grid(),
        }
    }

    /// Solve in place with the rule set and budget matching the kind.
    ///
    /// Kakuro gets a time and depth budget; the open-ended search space
    /// of a bad board would otherwise run away.
    pub fn solve(&mut self) -> Result<(), SolveError> {
        match self {
            Puzzle::Sudoku(grid) => {
                let mut rules = SudokuRules::new();
                Solver::new().solve(grid, &mut rules)
            }
            Puzzle::Binary(grid) => {
                let mut rules = BinaryRules::new(grid.size());
                Solver::new().solve(grid, &mut rules)
            }
            Puzzle::Kakuro(board) => {
                let mut rules =
                    KakuroRules::new(board).map_err(|_| SolveError::Unsatisfiable)?;
                Solver::with_config(SolverConfig::kakuro()).solve(board.grid_mut(), &mut rules)
            }
        }
    }

    /// Whether the current (possibly partial) fill breaks no rule.
    pub fn validate_partial(&self) -> bool {
        match self {
            Puzzle::Sudoku(grid) => SudokuRules::new().is_consistent(grid),
            Puzzle::Binary(grid) => BinaryRules::new(grid.size()).is_consistent(grid),
            Puzzle::Kakuro(board) => match KakuroRules::new(board) {
                Ok(rules) => rules.is_consistent(board.grid()),
                Err(_) => false,
            },
        }
    }

    /// Whether the puzzle is completely and correctly filled.
    pub fn is_solved(&self) -> bool {
        match self {
            Puzzle::Sudoku(grid) => SudokuRules::new().is_solved(grid),
            Puzzle::Binary(grid) => BinaryRules::new(grid.size()).is_solved(grid),
            Puzzle::Kakuro(board) => match KakuroRules::new(board) {
                Ok(rules) => rules.is_solved(board.grid()),
                Err(_) => false,
            },
        }
    }
}

/// Generate a fresh puzzle.
///
/// `size` defaults per kind (9 for sudoku, 8 for binary, 5 for kakuro)
/// and is ignored for sudoku. `difficulty` only affects sudoku and
/// defaults to [`Difficulty::Medium`].
pub fn generate(
    kind: PuzzleKind,
    size: Option<usize>,
    difficulty: Option<Difficulty>,
) -> Result<Puzzle, Error> {
    let mut generator = Generator::new();
    generate_with(&mut generator, kind, size, difficulty)
}

/// Like [`generate`] but with a caller-supplied generator, so seeded
/// runs stay reproducible.
pub fn generate_with(
    generator: &mut Generator,
    kind: PuzzleKind,
    size: Option<usize>,
    difficulty: Option<Difficulty>,
) -> Result<Puzzle, Error> {
    match kind {
        PuzzleKind::Sudoku => {
            if let Some(size) = size {
                if size != 9 {
                    return Err(Error::InvalidInput(format!(
                        "sudoku is only generated at size 9, got {}",
                        size
                    )));
                }
            }
            let grid = generator.sudoku(difficulty.unwrap_or(Difficulty::Medium));
            Ok(Puzzle::Sudoku(grid))
        }
        PuzzleKind::Binary => {
            let grid = generator.binary(size.unwrap_or(8))?;
            Ok(Puzzle::Binary(grid))
        }
        PuzzleKind::Kakuro => {
            let board = generator.kakuro(size.unwrap_or(5))?;
            Ok(Puzzle::Kakuro(board))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    #[test]
    fn test_sudoku_rejects_wrong_size() {
        assert!(matches!(
            Puzzle::sudoku(Grid::new(8)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sudoku_rejects_out_of_range_value() {
        let mut grid = Grid::new(9);
        grid.set_given(Position::new(0, 0), 10);
        assert!(matches!(
            Puzzle::sudoku(grid),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_binary_rejects_odd_size_and_bad_values() {
        assert!(Puzzle::binary(Grid::new(5)).is_err());
        let mut grid = Grid::new(4);
        grid.set_given(Position::new(0, 0), 2);
        assert!(Puzzle::binary(grid).is_err());
    }

    #[test]
    fn test_solve_dispatches_per_kind() {
        let mut generator = Generator::with_seed(11);
        let mut puzzle =
            generate_with(&mut generator, PuzzleKind::Sudoku, None, Some(Difficulty::Easy))
                .unwrap();
        assert!(!puzzle.is_solved());
        puzzle.solve().unwrap();
        assert!(puzzle.is_solved());

        let mut puzzle = generate_with(&mut generator, PuzzleKind::Binary, None, None).unwrap();
        puzzle.solve().unwrap();
        assert!(puzzle.is_solved());

        let mut puzzle = generate_with(&mut generator, PuzzleKind::Kakuro, None, None).unwrap();
        puzzle.solve().unwrap();
        assert!(puzzle.is_solved());
    }

    #[test]
    fn test_validate_partial_flags_conflicts() {
        let mut grid = Grid::new(9);
        grid.set_given(Position::new(0, 0), 5);
        grid.set_given(Position::new(0, 1), 5);
        let puzzle = Puzzle::sudoku(grid).unwrap();
        assert!(!puzzle.validate_partial());
    }

    #[test]
    fn test_generate_sudoku_rejects_other_sizes() {
        assert!(generate(PuzzleKind::Sudoku, Some(6), None).is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_alphabet_values() {
        // Variant construction skips the `Puzzle::sudoku` validation;
        // deserialization must not.
        let mut grid = Grid::new(9);
        grid.set(Position::new(0, 0), Some(200));
        let json = serde_json::to_string(&Puzzle::Sudoku(grid)).unwrap();
        assert!(serde_json::from_str::<Puzzle>(&json).is_err());

        let mut grid = Grid::new(4);
        grid.set(Position::new(0, 0), Some(5));
        grid.set(Position::new(0, 1), Some(5));
        let json = serde_json::to_string(&Puzzle::Binary(grid)).unwrap();
        assert!(serde_json::from_str::<Puzzle>(&json).is_err());
    }

    #[test]
    fn test_puzzle_serde_round_trip() {
        let mut generator = Generator::with_seed(5);
        let puzzle = generate_with(&mut generator, PuzzleKind::Kakuro, None, None).unwrap();
        let json = serde_json::to_string(&puzzle).unwrap();
        let back: Puzzle = serde_json::from_str(&json).unwrap();
        assert_eq!(puzzle, back);
    }
}
