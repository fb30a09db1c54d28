//! Backtracking solver.
//!
//! The search works directly on a [`Board`]:
//! - a coverage check prunes branches where some empty cell can no longer be
//!   reached by any remaining placement;
//! - the piece with the fewest valid placements is branched on first;
//! - candidates are tried in registry order, so runs are deterministic.

use tracing::{debug, trace};

use crate::board::Board;
use crate::grid::CellMask;
use crate::pieces::PieceId;

/// Limits for a solver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveOptions {
    /// Maximum number of search nodes to visit. `None` searches to the end.
    pub max_nodes: Option<u64>,
}

/// How a solver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every piece is on the board.
    Solved,
    /// The search space was exhausted without a solution.
    NoSolution,
    /// The node budget ran out before the search finished.
    BudgetExhausted,
}

/// Result of [`Board::solve_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveReport {
    pub outcome: Outcome,
    /// Search nodes visited, including the root.
    pub nodes: u64,
}

impl SolveReport {
    pub fn is_solved(&self) -> bool {
        self.outcome == Outcome::Solved
    }
}

/// Result of one search node.
enum Step {
    Solved,
    DeadEnd,
    OutOfBudget,
}

struct Search {
    nodes: u64,
    max_nodes: u64,
}

impl Board<'_> {
    /// Completes the board with the remaining pieces.
    ///
    /// Returns true and leaves the board solved if a completion exists.
    /// Otherwise returns false and leaves the board as it was.
    pub fn solve(&mut self) -> bool {
        self.solve_with(SolveOptions::default()).is_solved()
    }

    /// Runs the search with limits.
    ///
    /// Unless the outcome is [`Outcome::Solved`], the board is left exactly
    /// as it was before the call.
    pub fn solve_with(&mut self, options: SolveOptions) -> SolveReport {
        let mut search = Search {
            nodes: 0,
            max_nodes: options.max_nodes.unwrap_or(u64::MAX),
        };
        let outcome = match self.search(&mut search, 0) {
            Step::Solved => Outcome::Solved,
            Step::DeadEnd => Outcome::NoSolution,
            Step::OutOfBudget => Outcome::BudgetExhausted,
        };
        debug!(?outcome, nodes = search.nodes, "solver finished");
        SolveReport {
            outcome,
            nodes: search.nodes,
        }
    }

    fn search(&mut self, search: &mut Search, depth: usize) -> Step {
        if search.nodes >= search.max_nodes {
            return Step::OutOfBudget;
        }
        search.nodes += 1;

        if self.unused().next().is_none() {
            return Step::Solved;
        }

        let empty = self.empty_cells();
        let reachable = self.reachable_cells();
        if empty & !reachable != 0 {
            trace!(depth, unreachable = empty & !reachable, "coverage prune");
            return Step::DeadEnd;
        }

        let Some(piece) = self.most_constrained() else {
            return Step::DeadEnd;
        };
        let candidates = self.valid[piece.index()].clone();
        if candidates.is_empty() {
            trace!(depth, %piece, "no valid placement");
            return Step::DeadEnd;
        }

        let registry = self.registry;
        let positions = registry.positions(piece);
        for index in candidates {
            let placement = &positions[index];
            trace!(depth, %piece, index, "try placement");
            self.apply(placement);
            match self.search(search, depth + 1) {
                Step::Solved => return Step::Solved,
                Step::DeadEnd => {
                    self.withdraw(placement);
                }
                Step::OutOfBudget => {
                    self.withdraw(placement);
                    return Step::OutOfBudget;
                }
            }
        }
        Step::DeadEnd
    }

    /// Union of every valid placement of every unused piece.
    fn reachable_cells(&self) -> CellMask {
        self.unused()
            .flat_map(|piece| self.valid_positions(piece))
            .fold(0, |mask, placement| mask | placement.mask)
    }

    /// The unused piece with the fewest valid placements, lowest id first.
    fn most_constrained(&self) -> Option<PieceId> {
        self.unused().min_by_key(|&piece| self.valid_count(piece))
    }
}
