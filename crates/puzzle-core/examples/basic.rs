//! Basic example of using the puzzle engine

use puzzle_core::{generate, Difficulty, Grid, Puzzle, PuzzleKind};

fn main() {
    // Generate a sudoku
    println!("Generating a Medium difficulty sudoku...\n");
    let mut puzzle = generate(PuzzleKind::Sudoku, None, Some(Difficulty::Medium))
        .expect("sudoku generation never fails");

    println!("Generated puzzle:");
    println!("{}", puzzle.grid());
    println!("Given cells: {}", puzzle.grid().given_count());

    // Solve it
    println!("\nSolving...\n");
    match puzzle.solve() {
        Ok(()) => {
            println!("Solution:");
            println!("{}", puzzle.grid());
        }
        Err(err) => println!("No solution found: {}", err),
    }

    // Parse a puzzle from a string
    println!("--- Parsing a puzzle from string ---\n");
    let puzzle_string = "530070000600195000098000060800060003400803001700020006060000280000419005000080079";
    if let Some(grid) = Grid::from_string(puzzle_string) {
        println!("Parsed puzzle:");
        println!("{}", grid);

        let mut parsed = Puzzle::sudoku(grid).expect("well-formed 9x9 grid");
        parsed.solve().expect("known-solvable puzzle");
        println!("Solved:");
        println!("{}", parsed.grid());
    }

    // A binary puzzle and a kakuro from the same surface
    println!("--- Other puzzle kinds ---\n");
    let mut binary = generate(PuzzleKind::Binary, Some(8), None).expect("binary generation");
    println!("Binary 8x8 puzzle:");
    println!("{}", binary.grid());
    binary.solve().expect("generated puzzles are solvable");
    println!("Solved:");
    println!("{}", binary.grid());

    let mut kakuro = generate(PuzzleKind::Kakuro, Some(5), None).expect("kakuro generation");
    if let Puzzle::Kakuro(board) = &kakuro {
        println!("Kakuro 5x5 board:");
        println!("{}", board);
    }
    kakuro.solve().expect("generated puzzles are solvable");
    if let Puzzle::Kakuro(board) = &kakuro {
        println!("Solved:");
        println!("{}", board);
    }
}
