use crate::grid::{Grid, Position};

/// Outcome of a single propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// At least one forced value was assigned.
    Changed,
    /// Nothing new could be deduced.
    Unchanged,
    /// A forced value violates another rule; the current branch is dead.
    Contradiction,
}

/// The rule set of one puzzle type.
///
/// The backtracking solver is generic over this trait: it owns the
/// search skeleton, while the rule set decides which cells are fillable,
/// which values are legal, what can be deduced without branching and
/// when the grid counts as solved.
pub trait RuleSet {
    /// Candidate values in ascending order.
    fn values(&self) -> &[u8];

    /// Whether the solver should try to fill this cell at all.
    ///
    /// Everything is fillable by default; Kakuro excludes blocked cells.
    fn is_fillable(&self, _pos: Position) -> bool {
        true
    }

    /// Check a candidate against every rule touching the cell, without
    /// mutating anything. Called for every candidate at every branch, so
    /// it must stay cheap.
    fn is_legal(&self, grid: &Grid, pos: Position, value: u8) -> bool;

    /// Bookkeeping hook, called after the solver writes `value` at `pos`.
    fn on_assign(&mut self, _pos: Position, _value: u8) {}

    /// Bookkeeping hook, called after the solver erases `value` at `pos`.
    fn on_unassign(&mut self, _pos: Position, _value: u8) {}

    /// One pass of forced-value deduction.
    ///
    /// Every assignment made here must go through the grid *and* be
    /// pushed onto `trail` so the solver can roll it back symmetrically;
    /// any `on_assign`-style bookkeeping is the rule set's own job here,
    /// since the solver calls `on_unassign` for every rolled-back
    /// assignment, propagated or guessed. The solver repeats the pass
    /// until it reports `Unchanged`.
    fn propagate(&mut self, _grid: &mut Grid, _trail: &mut Vec<(Position, u8)>) -> Propagation {
        Propagation::Unchanged
    }

    /// The authoritative goal test: all cells filled and every rule
    /// holding globally, independent of how the cells were filled.
    fn is_solved(&self, grid: &Grid) -> bool;

    /// Whether the (possibly partial) grid violates no rule right now.
    fn is_consistent(&self, grid: &Grid) -> bool;
}
