/// Construction and generation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed grid dimensions, out-of-alphabet fixed values or an
    /// inconsistent board layout, detected at construction.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The generator exhausted its retry budget without producing a
    /// valid puzzle.
    #[error("generation failed: {0}")]
    Generation(String),
}

/// Search outcomes that are not solutions. Both are normal, expected
/// results, not failures of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// Every candidate assignment was exhausted: no solution exists
    /// under the given fixed cells.
    #[error("no solution exists for the given fixed cells")]
    Unsatisfiable,

    /// The wall-clock budget or recursion-depth ceiling was exceeded.
    /// Unlike `Unsatisfiable` this proves nothing about solvability.
    #[error("search budget exceeded before a solution was found")]
    Timeout,
}
