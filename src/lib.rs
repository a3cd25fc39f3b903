//! Student-to-section timetabling as a constraint model.
//!
//! [`model::build`] turns a [`domain::ScheduleInput`] into a solver-agnostic
//! [`model::LinearModel`], a [`solve::Solver`] backend solves it, and
//! [`extract::extract`] decodes the assignment into a [`schedule::ScheduleResult`].
//! [`schedule::run`] chains the three.

pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod io;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod solve;

pub use config::SchedulerConfig;
pub use domain::{Course, CourseId, PreferenceSet, ScheduleInput, Student, StudentId, TimeBlock, TimeGrid};
pub use error::{ConfigurationError, InconsistentSolutionError, ScheduleError, SolverError};
pub use schedule::{AttendanceRecord, ScheduleResult, StudentSchedule, run};
pub use solve::{SolveStatus, Solver};
