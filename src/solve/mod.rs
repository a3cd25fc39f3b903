//! Solver contract: take a built model, return a terminal status and, when a
//! solution exists, a value for every variable.

#[cfg(feature = "cp-sat")]
mod cp_sat_backend;

#[cfg(feature = "cp-sat")]
pub use cp_sat_backend::CpSatSolver;

use crate::config::SolverSettings;
use crate::error::SolverError;
use crate::model::{LinearModel, RawAssignment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Terminal status of a solve, reported verbatim to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// A solution, not proven optimal (e.g. the time budget ran out).
    Feasible,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// The solver stopped without a solution or a proof.
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Present iff `status.has_solution()`.
    pub assignment: Option<RawAssignment>,
    pub objective_value: Option<f64>,
    pub wall_time: Duration,
}

impl SolveOutcome {
    /// An outcome without a solution.
    pub fn without_solution(status: SolveStatus, wall_time: Duration) -> Self {
        SolveOutcome {
            status,
            assignment: None,
            objective_value: None,
            wall_time,
        }
    }
}

/// A constraint solver backend.
///
/// Implementations must return a full assignment whenever the status is
/// `Optimal` or `Feasible`, and report backend failures as `SolverError`.
pub trait Solver {
    /// Whether `literal => constraint` can be passed through without big-M.
    fn supports_indicators(&self) -> bool;

    fn solve(&self, model: &LinearModel, settings: &SolverSettings) -> Result<SolveOutcome, SolverError>;
}

/// Lifecycle of one run: `Built -> Submitted -> Finished(status)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Built,
    Submitted,
    Finished(SolveStatus),
}

impl RunPhase {
    /// Move to the next phase. Only forward transitions are accepted.
    pub fn advance(self, next: RunPhase) -> RunPhase {
        let allowed = matches!(
            (self, next),
            (RunPhase::Built, RunPhase::Submitted) | (RunPhase::Submitted, RunPhase::Finished(_))
        );
        assert!(allowed, "invalid run transition {self:?} -> {next:?}");
        debug!(from = ?self, to = ?next, "run phase");
        next
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Finished(_))
    }
}
