//! Schedule results and the end-to-end run: build, solve, extract.
use crate::config::SchedulerConfig;
use crate::domain::{CourseId, ScheduleInput, StudentId, TimeBlock};
use crate::error::ScheduleError;
use crate::extract::extract;
use crate::model::{BuildOptions, build};
use crate::solve::{RunPhase, SolveStatus, Solver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// A student seated in one section occurrence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub course: CourseId,
    pub section: usize,
    pub time_block: TimeBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSchedule {
    /// Rank of the granted preference set, `None` if unassigned.
    pub granted_rank: Option<usize>,
    /// Ordered by time block.
    pub records: Vec<AttendanceRecord>,
}

impl StudentSchedule {
    pub fn is_assigned(&self) -> bool {
        self.granted_rank.is_some()
    }
}

/// A section bound to a time block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectionPlacement {
    pub course: CourseId,
    pub section: usize,
    pub time_block: TimeBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    /// Every student when a solution exists; empty otherwise.
    pub schedules: BTreeMap<StudentId, StudentSchedule>,
    pub placements: Vec<SectionPlacement>,
}

impl ScheduleResult {
    pub fn empty(status: SolveStatus) -> Self {
        ScheduleResult {
            status,
            objective_value: None,
            schedules: BTreeMap::new(),
            placements: Vec::new(),
        }
    }

    pub fn schedule(&self, student: &StudentId) -> Option<&StudentSchedule> {
        self.schedules.get(student)
    }

    pub fn assigned_count(&self) -> usize {
        self.schedules.values().filter(|s| s.is_assigned()).count()
    }

    pub fn unassigned(&self) -> Vec<&StudentId> {
        self.schedules
            .iter()
            .filter(|(_, s)| !s.is_assigned())
            .map(|(id, _)| id)
            .collect()
    }
}

/// Build the model for `input`, solve it with `solver`, and decode the result.
///
/// Configuration problems and inconsistent solutions are errors. `INFEASIBLE`
/// and `UNKNOWN` come back as a normal result with no schedules.
#[instrument(skip_all, fields(students = input.students.len(), courses = input.courses.len()))]
pub fn run<S: Solver + ?Sized>(
    input: &ScheduleInput,
    config: &SchedulerConfig,
    solver: &S,
) -> Result<ScheduleResult, ScheduleError> {
    config.validate()?;
    let options = BuildOptions::from_config(config, solver.supports_indicators());
    let model = build(input, options)?;

    let submitted = RunPhase::Built.advance(RunPhase::Submitted);
    let outcome = solver.solve(model.linear(), &config.solver)?;
    let finished = submitted.advance(RunPhase::Finished(outcome.status));
    debug_assert!(finished.is_terminal());

    let result = extract(&model, &outcome, config.verify)?;
    match result.status {
        SolveStatus::Optimal => {}
        SolveStatus::Feasible => warn!("solution found but not proven optimal"),
        SolveStatus::Infeasible => warn!("no schedule satisfies every constraint"),
        SolveStatus::Unknown => warn!("solver stopped without a solution"),
    }
    info!(
        status = %result.status,
        assigned = result.assigned_count(),
        students = input.students.len(),
        "run finished"
    );
    Ok(result)
}
