use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use puzzle_core::{generate_with, Difficulty, Generator, Puzzle, PuzzleKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "puzzle", version, about = "Generate and solve grid logic puzzles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a puzzle and write it as JSON
    Generate {
        #[arg(value_enum)]
        kind: KindArg,
        /// Grid size (sudoku is always 9)
        #[arg(long)]
        size: Option<usize>,
        /// Sudoku difficulty
        #[arg(long, value_enum)]
        difficulty: Option<DifficultyArg>,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Solve a JSON puzzle file
    Solve {
        input: PathBuf,
        /// Output file for the solved puzzle (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Pretty-print a JSON puzzle file
    Show { input: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Sudoku,
    Binary,
    Kakuro,
}

impl From<KindArg> for PuzzleKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Sudoku => PuzzleKind::Sudoku,
            KindArg::Binary => PuzzleKind::Binary,
            KindArg::Kakuro => PuzzleKind::Kakuro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl From<DifficultyArg> for Difficulty {
    fn from(difficulty: DifficultyArg) -> Self {
        match difficulty {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Expert => Difficulty::Expert,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate {
            kind,
            size,
            difficulty,
            seed,
            output,
        } => {
            let mut generator = match seed {
                Some(seed) => Generator::with_seed(seed),
                None => Generator::new(),
            };
            let puzzle =
                generate_with(&mut generator, kind.into(), size, difficulty.map(Into::into))?;
            info!("generated a {} puzzle", puzzle.kind());
            emit(&puzzle, output.as_deref())
        }
        Command::Solve { input, output } => {
            let mut puzzle = load(&input)?;
            puzzle.solve()?;
            info!("solved {}", input.display());
            emit(&puzzle, output.as_deref())
        }
        Command::Show { input } => {
            let puzzle = load(&input)?;
            print(&puzzle);
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<Puzzle, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn emit(puzzle: &Puzzle, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(puzzle)?;
    match output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn print(puzzle: &Puzzle) {
    match puzzle {
        Puzzle::Kakuro(board) => println!("{}", board),
        other => println!("{}", other.grid()),
    }
}
