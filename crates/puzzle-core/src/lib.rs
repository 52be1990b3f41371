//! Grid-based logic puzzle engine.
//!
//! One [`Grid`] model and one backtracking [`Solver`] serve three rule
//! sets: classic 9x9 sudoku, binary puzzles (0/1 grids with balance and
//! no-triple rules), and kakuro (cross-sum runs over a partially
//! blocked board). The [`Generator`] produces fresh puzzles of each
//! kind, and [`Puzzle`] wraps all of it behind one kind-dispatching
//! surface.

mod binary;
mod error;
mod generator;
mod grid;
mod kakuro;
mod puzzle;
mod rules;
mod solver;
mod sudoku;

pub use binary::BinaryRules;
pub use error::{Error, SolveError};
pub use generator::{Difficulty, Generator};
pub use grid::{Cell, Grid, Position};
pub use kakuro::{Clue, KakuroBoard, KakuroRules, Run, RunId};
pub use puzzle::{generate, generate_with, Puzzle, PuzzleKind};
pub use rules::{Propagation, RuleSet};
pub use solver::{Solver, SolverConfig};
pub use sudoku::SudokuRules;
