use crate::error::SolveError;
use crate::grid::{Grid, Position};
use crate::rules::{Propagation, RuleSet};
use log::debug;
use std::time::{Duration, Instant};

/// Configuration for the backtracking search.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock budget; exceeding it returns [`SolveError::Timeout`].
    pub time_budget: Option<Duration>,
    /// Recursion-depth ceiling, reported like the time budget.
    pub max_depth: Option<usize>,
    /// Whether to run propagation to a fixpoint before the search and
    /// after every assignment.
    pub propagate: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: None,
            max_depth: None,
            propagate: true,
        }
    }
}

impl SolverConfig {
    /// Kakuro preset: 5 second budget, depth ceiling 1000. Exceeding
    /// either abandons the search instead of iterating indefinitely.
    pub fn kakuro() -> Self {
        Self {
            time_budget: Some(Duration::from_secs(5)),
            max_depth: Some(1_000),
            propagate: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Solved,
    Exhausted,
    Budget,
}

#[derive(Default)]
struct SearchStats {
    nodes: usize,
    backtracks: usize,
}

/// Generic depth-first solver.
///
/// One skeleton serves all puzzle types: the [`RuleSet`] it is handed
/// decides legality, propagation and the goal test. Empty cells are
/// visited in row-major order, candidates in ascending value order, and
/// the first solution found wins.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solve the grid in place.
    ///
    /// On success the grid is fully assigned and `rules.is_solved`
    /// holds. On `Err` every solver assignment has been rolled back, so
    /// fixed and still-empty cells are exactly as before the call.
    pub fn solve<R: RuleSet>(&self, grid: &mut Grid, rules: &mut R) -> Result<(), SolveError> {
        if !rules.is_consistent(grid) {
            return Err(SolveError::Unsatisfiable);
        }

        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);
        let mut trail: Vec<(Position, u8)> = Vec::new();
        let mut stats = SearchStats::default();

        if self.config.propagate
            && propagate_fixpoint(rules, grid, &mut trail) == Propagation::Contradiction
        {
            rollback_to(grid, rules, &mut trail, 0);
            return Err(SolveError::Unsatisfiable);
        }

        let outcome = self.search(grid, rules, &mut trail, deadline, 0, &mut stats);
        debug!(
            "search finished: {:?} after {} nodes, {} backtracks",
            outcome, stats.nodes, stats.backtracks
        );
        match outcome {
            Outcome::Solved => Ok(()),
            Outcome::Exhausted => {
                rollback_to(grid, rules, &mut trail, 0);
                Err(SolveError::Unsatisfiable)
            }
            Outcome::Budget => {
                rollback_to(grid, rules, &mut trail, 0);
                Err(SolveError::Timeout)
            }
        }
    }

    fn search<R: RuleSet>(
        &self,
        grid: &mut Grid,
        rules: &mut R,
        trail: &mut Vec<(Position, u8)>,
        deadline: Option<Instant>,
        depth: usize,
        stats: &mut SearchStats,
    ) -> Outcome {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Outcome::Budget;
            }
        }
        if let Some(max) = self.config.max_depth {
            if depth > max {
                return Outcome::Budget;
            }
        }
        stats.nodes += 1;

        let pos = match next_empty(grid, rules) {
            Some(pos) => pos,
            // Grid complete: the global goal test has the final say.
            None => {
                return if rules.is_solved(grid) {
                    Outcome::Solved
                } else {
                    Outcome::Exhausted
                };
            }
        };

        let values = rules.values().to_vec();
        for value in values {
            if !rules.is_legal(grid, pos, value) {
                continue;
            }
            let mark = trail.len();
            grid.set(pos, Some(value));
            rules.on_assign(pos, value);
            trail.push((pos, value));

            let dead = self.config.propagate
                && propagate_fixpoint(rules, grid, trail) == Propagation::Contradiction;
            if !dead {
                match self.search(grid, rules, trail, deadline, depth + 1, stats) {
                    Outcome::Solved => return Outcome::Solved,
                    // Leave the trail as is; the caller unwinds it once.
                    Outcome::Budget => return Outcome::Budget,
                    Outcome::Exhausted => {}
                }
            }
            rollback_to(grid, rules, trail, mark);
            stats.backtracks += 1;
        }
        Outcome::Exhausted
    }
}

/// Next empty fillable cell in row-major order.
fn next_empty<R: RuleSet>(grid: &Grid, rules: &R) -> Option<Position> {
    let size = grid.size();
    for row in 0..size {
        for col in 0..size {
            let pos = Position::new(row, col);
            if rules.is_fillable(pos) && grid.get(pos).is_none() {
                return Some(pos);
            }
        }
    }
    None
}

/// Run single propagation passes until nothing changes or the branch
/// dies.
fn propagate_fixpoint<R: RuleSet>(
    rules: &mut R,
    grid: &mut Grid,
    trail: &mut Vec<(Position, u8)>,
) -> Propagation {
    loop {
        match rules.propagate(grid, trail) {
            Propagation::Changed => continue,
            done => return done,
        }
    }
}

/// Undo trail entries beyond `mark`, newest first.
fn rollback_to<R: RuleSet>(
    grid: &mut Grid,
    rules: &mut R,
    trail: &mut Vec<(Position, u8)>,
    mark: usize,
) {
    while trail.len() > mark {
        let (pos, value) = trail.pop().expect("trail shorter than mark");
        grid.set(pos, None);
        rules.on_unassign(pos, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryRules;
    use crate::kakuro::{Clue, KakuroBoard, KakuroRules};
    use crate::sudoku::SudokuRules;

    #[test]
    fn test_solve_empty_sudoku() {
        let mut grid = Grid::new(9);
        let mut rules = SudokuRules::new();
        Solver::new().solve(&mut grid, &mut rules).unwrap();
        assert!(rules.is_solved(&grid));
        // Candidates are tried in ascending order, so the first row of
        // an empty grid comes out as 1..=9.
        for col in 0..9 {
            assert_eq!(grid.get(Position::new(0, col)), Some(col as u8 + 1));
        }
    }

    #[test]
    fn test_solve_known_sudoku() {
        let mut grid = Grid::from_string(
            "530070000600195000098000060800060003400803001700020006060000280000419005000080079",
        )
        .unwrap();
        let mut rules = SudokuRules::new();
        Solver::new().solve(&mut grid, &mut rules).unwrap();
        let expected = Grid::from_string(
            "534678912672195348198342567859761423426853791713924856961537284287419635345286179",
        )
        .unwrap();
        assert_eq!(grid.clone_values(), expected.clone_values());
    }

    #[test]
    fn test_conflicting_givens_unsatisfiable() {
        let mut grid = Grid::new(9);
        grid.set_given(Position::new(0, 0), 5);
        grid.set_given(Position::new(0, 5), 5);
        let mut rules = SudokuRules::new();
        let err = Solver::new().solve(&mut grid, &mut rules).unwrap_err();
        assert_eq!(err, SolveError::Unsatisfiable);
        // Grid untouched.
        assert_eq!(grid.value_count(), 2);
    }

    #[test]
    fn test_solve_is_idempotent() {
        let mut grid = Grid::new(9);
        let mut rules = SudokuRules::new();
        let solver = Solver::new();
        solver.solve(&mut grid, &mut rules).unwrap();
        let snapshot = grid.clone_values();
        solver.solve(&mut grid, &mut rules).unwrap();
        assert_eq!(grid.clone_values(), snapshot);
    }

    #[test]
    fn test_unsatisfiable_grid_restored() {
        // A legal-looking start that cannot be completed: row 0 filled
        // except one cell, with the missing digit placed elsewhere in
        // that column.
        let mut grid = Grid::new(9);
        for (col, v) in [1u8, 2, 3, 4, 5, 6, 7, 8].iter().enumerate() {
            grid.set_given(Position::new(0, col), *v);
        }
        grid.set_given(Position::new(4, 8), 9);
        let before = grid.clone_values();
        let mut rules = SudokuRules::new();
        let err = Solver::new().solve(&mut grid, &mut rules).unwrap_err();
        assert_eq!(err, SolveError::Unsatisfiable);
        assert_eq!(grid.clone_values(), before);
    }

    #[test]
    fn test_solve_binary() {
        let mut grid = Grid::new(6);
        let mut rules = BinaryRules::new(6);
        Solver::new().solve(&mut grid, &mut rules).unwrap();
        assert!(rules.is_solved(&grid));
    }

    #[test]
    fn test_binary_propagation_alone_solves() {
        // One empty cell per row resolves without any branching.
        let mut grid = Grid::from_rows(&[
            vec![0, 1, 0, -1],
            vec![1, 0, 1, -1],
            vec![0, 1, 1, -1],
            vec![1, 0, 0, -1],
        ])
        .unwrap();
        let mut rules = BinaryRules::new(4);
        Solver::new().solve(&mut grid, &mut rules).unwrap();
        assert!(rules.is_solved(&grid));
        assert_eq!(grid.get(Position::new(0, 3)), Some(1));
    }

    #[test]
    fn test_solve_kakuro_two_cell_run() {
        // 3x3 with an across run (sum 3) and a down run (sum 4) meeting
        // at the corner: unique solution 1/2 across, 1/3 down.
        let blocked = vec![
            false, false, true, //
            false, true, true, //
            true, true, true,
        ];
        let clues = vec![Clue::across(0, 0, 3), Clue::down(0, 0, 4)];
        let mut board = KakuroBoard::new(3, blocked, clues).unwrap();
        let mut rules = KakuroRules::new(&board).unwrap();
        let solver = Solver::with_config(SolverConfig::kakuro());
        solver.solve(board.grid_mut(), &mut rules).unwrap();

        let a = board.grid().get(Position::new(0, 0)).unwrap();
        let b = board.grid().get(Position::new(0, 1)).unwrap();
        let c = board.grid().get(Position::new(1, 0)).unwrap();
        assert_eq!(a + b, 3);
        assert_ne!(a, b);
        assert_eq!(a + c, 4);
        assert_ne!(a, c);
    }

    #[test]
    fn test_kakuro_impossible_sum() {
        // Two cells cannot make 18 with distinct digits at most 9 + 8.
        let blocked = vec![false, false, true, false, true, true, true, true, true];
        let clues = vec![Clue::across(0, 0, 18)];
        let mut board = KakuroBoard::new(3, blocked, clues).unwrap();
        let mut rules = KakuroRules::new(&board).unwrap();
        let solver = Solver::with_config(SolverConfig::kakuro());
        let err = solver.solve(board.grid_mut(), &mut rules).unwrap_err();
        assert_eq!(err, SolveError::Unsatisfiable);
    }

    #[test]
    fn test_depth_ceiling_reports_timeout() {
        let mut grid = Grid::new(9);
        let mut rules = SudokuRules::new();
        let solver = Solver::with_config(SolverConfig {
            max_depth: Some(5),
            ..SolverConfig::default()
        });
        let err = solver.solve(&mut grid, &mut rules).unwrap_err();
        assert_eq!(err, SolveError::Timeout);
        // Everything rolled back on the way out.
        assert_eq!(grid.value_count(), 0);
    }

    #[test]
    fn test_zero_time_budget_reports_timeout() {
        let mut grid = Grid::new(9);
        let mut rules = SudokuRules::new();
        let solver = Solver::with_config(SolverConfig {
            time_budget: Some(Duration::ZERO),
            ..SolverConfig::default()
        });
        let err = solver.solve(&mut grid, &mut rules).unwrap_err();
        assert_eq!(err, SolveError::Timeout);
    }
}
