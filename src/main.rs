//! Pyramid Puzzle Solver
//!
//! Fills a six-layer tetrahedral pyramid of 56 spheres with twelve flat
//! pieces. Pieces can be fixed on the board with placement notation before
//! the solver completes the rest.

use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use pyramid::grid::format_board;
use pyramid::{
    Board, Outcome, PieceId, Placement, PlacementSpec, Plane, PositionFilter, Registry, Rotation,
    SolveOptions,
};

/// Solves the tetrahedral sphere-packing pyramid puzzle.
#[derive(Parser)]
#[command(name = "pyramid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Complete the board and print the layers.
    Solve {
        #[command(flatten)]
        setup: Setup,

        /// Give up after visiting this many search nodes.
        #[arg(long, value_name = "N")]
        max_nodes: Option<u64>,
    },
    /// List the valid positions of one piece.
    Positions {
        /// Piece letter (A-L).
        piece: PieceId,

        #[command(flatten)]
        setup: Setup,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show valid and total placement counts per piece.
    Count {
        #[command(flatten)]
        setup: Setup,
    },
}

/// Pieces fixed on the board before the command runs.
#[derive(Args, Default)]
struct Setup {
    /// Place a piece first, e.g. `C:0,0,0:r0:p0` or `H:0,4,0:r0:p1:l`.
    #[arg(long = "place", value_name = "SPEC")]
    placements: Vec<PlacementSpec>,
}

/// Constraints on listed positions.
#[derive(Args, Default)]
struct FilterArgs {
    /// Only positions covering a cell with this x.
    #[arg(long)]
    x: Option<i32>,
    /// Only positions covering a cell with this y.
    #[arg(long)]
    y: Option<i32>,
    /// Only positions covering a cell with this z.
    #[arg(long)]
    z: Option<i32>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..6))]
    rotation: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..3))]
    plane: Option<u8>,
    #[arg(long)]
    mirror: Option<bool>,
    #[arg(long)]
    lean: Option<bool>,
    #[arg(long)]
    root_x: Option<i32>,
    #[arg(long)]
    root_y: Option<i32>,
    #[arg(long)]
    root_z: Option<i32>,
}

impl FilterArgs {
    fn to_filter(&self) -> pyramid::Result<PositionFilter> {
        Ok(PositionFilter {
            x: self.x,
            y: self.y,
            z: self.z,
            rotation: self.rotation.map(Rotation::new).transpose()?,
            plane: self.plane.map(Plane::new).transpose()?,
            lean: self.lean,
            mirror: self.mirror,
            root_x: self.root_x,
            root_y: self.root_y,
            root_z: self.root_z,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let start = Instant::now();
    let registry = Registry::new();
    info!(
        placements = registry.total(),
        elapsed = ?start.elapsed(),
        "built placement registry"
    );

    let output = match cli.command {
        Some(Command::Solve { setup, max_nodes }) => run_solve(&registry, &setup, max_nodes)?,
        Some(Command::Positions {
            piece,
            setup,
            filter,
        }) => run_positions(&registry, piece, &setup, &filter)?,
        Some(Command::Count { setup }) => run_count(&registry, &setup)?,
        // default: solve the empty board
        None => run_solve(&registry, &Setup::default(), None)?,
    };
    print!("{output}");
    Ok(())
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pyramid=debug")
        } else {
            EnvFilter::new("pyramid=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds a board with the requested pieces already placed.
fn setup_board<'r>(registry: &'r Registry, setup: &Setup) -> anyhow::Result<Board<'r>> {
    let mut board = Board::new(registry);
    for spec in &setup.placements {
        board
            .place_transform(spec.piece, &spec.transform)
            .with_context(|| format!("cannot place {spec}"))?;
    }
    Ok(board)
}

/// Solves the board and renders the result.
fn run_solve(
    registry: &Registry,
    setup: &Setup,
    max_nodes: Option<u64>,
) -> anyhow::Result<String> {
    let mut board = setup_board(registry, setup)?;

    let start = Instant::now();
    let report = board.solve_with(SolveOptions { max_nodes });
    info!(nodes = report.nodes, elapsed = ?start.elapsed(), "search finished");

    let output = match report.outcome {
        Outcome::Solved => {
            let placements: Vec<Placement> = board.placements().copied().collect();
            let mut output = format_board(&placements);
            output.push('\n');
            for placement in &placements {
                output.push_str(&format!("{}\n", PlacementSpec::from(placement)));
            }
            output.push_str(&format!("solved in {} nodes\n", report.nodes));
            output
        }
        Outcome::NoSolution => format!("no solution ({} nodes)\n", report.nodes),
        Outcome::BudgetExhausted => {
            format!("gave up after {} nodes\n", report.nodes)
        }
    };
    Ok(output)
}

/// Lists the positions of `piece` that fit the board and pass the filter.
fn run_positions(
    registry: &Registry,
    piece: PieceId,
    setup: &Setup,
    filter: &FilterArgs,
) -> anyhow::Result<String> {
    let board = setup_board(registry, setup)?;
    if let Some(placement) = board.placed(piece) {
        bail!(
            "piece {piece} is already placed at {}",
            PlacementSpec::from(placement)
        );
    }
    let filter = filter.to_filter()?;

    let mut output = String::new();
    let mut count = 0;
    for placement in board.valid_positions(piece).filter(|p| filter.matches(p)) {
        let cells: Vec<String> = placement
            .cells()
            .iter()
            .map(|(x, y, z)| format!("({x},{y},{z})"))
            .collect();
        output.push_str(&format!(
            "{}  {}\n",
            PlacementSpec::from(placement),
            cells.join(" ")
        ));
        count += 1;
    }
    output.push_str(&format!(
        "{count} of {} positions\n",
        registry.positions(piece).len()
    ));
    Ok(output)
}

/// Counts valid placements per piece.
fn run_count(registry: &Registry, setup: &Setup) -> anyhow::Result<String> {
    let board = setup_board(registry, setup)?;

    let mut output = String::new();
    for piece in PieceId::ALL {
        match board.placed(piece) {
            Some(placement) => output.push_str(&format!(
                "{piece} {:<9} placed {}\n",
                piece.name(),
                PlacementSpec::from(placement)
            )),
            None => output.push_str(&format!(
                "{piece} {:<9} {}/{}\n",
                piece.name(),
                board.valid_count(piece),
                registry.positions(piece).len()
            )),
        }
    }
    Ok(output)
}
