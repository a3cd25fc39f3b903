//! Error types for building, solving and decoding a scheduling run.
use crate::domain::{CourseId, StudentId, TimeBlock};
use thiserror::Error;

/// Malformed input, detected before any model is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no students supplied")]
    NoStudents,

    #[error("no courses supplied")]
    NoCourses,

    #[error("time grid must have at least one block and one block per day")]
    EmptyTimeGrid,

    #[error("duplicate student id: {0}")]
    DuplicateStudent(StudentId),

    #[error("duplicate course id: {0}")]
    DuplicateCourse(CourseId),

    #[error("student {student} preference set {rank} references unknown course {course}")]
    UnknownCourse {
        student: StudentId,
        rank: usize,
        course: CourseId,
    },

    #[error("course {0} must offer at least one section")]
    ZeroSections(CourseId),

    #[error("course {0} must have a positive section capacity")]
    ZeroCapacity(CourseId),

    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("top-n weighting needs n >= 1")]
    ZeroTopN,
}

/// A solved assignment that breaks a model invariant. This points at a defect
/// in the formulation, not at the solver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InconsistentSolutionError {
    #[error("assignment has {actual} values but the model has {expected} variables")]
    AssignmentSize { expected: usize, actual: usize },

    #[error("student {student} was granted {count} preference sets")]
    MultipleSelections { student: StudentId, count: usize },

    #[error("student {0} was left unassigned under the exactly-one policy")]
    MissingSelection(StudentId),

    #[error("section {section} of course {course} is placed in {count} time blocks")]
    SectionMultiplyPlaced {
        course: CourseId,
        section: usize,
        count: usize,
    },

    #[error("course {course} has {count} sections placed at {block}")]
    SimultaneousSections {
        course: CourseId,
        block: TimeBlock,
        count: usize,
    },

    #[error("student {student} attends section {section} of {course} at {block}, where it is not placed")]
    AttendanceWithoutPlacement {
        student: StudentId,
        course: CourseId,
        section: usize,
        block: TimeBlock,
    },

    #[error("student {student} is double-booked at {block}")]
    DoubleBooked { student: StudentId, block: TimeBlock },

    #[error("student {student} attends {course}, which is outside the granted set")]
    CourseOutsideSelection { student: StudentId, course: CourseId },

    #[error("student {student} attends {course} {count} times, expected exactly once")]
    WrongCourseCount {
        student: StudentId,
        course: CourseId,
        count: usize,
    },

    #[error("section {section} of course {course} seats {enrolled} students, capacity {capacity}")]
    OverCapacity {
        course: CourseId,
        section: usize,
        enrolled: usize,
        capacity: u32,
    },
}

/// The `ERROR` outcome of a solver backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("solver rejected the model as invalid")]
    ModelInvalid,

    #[error("solver backend failed: {0}")]
    Backend(String),
}

/// Everything that can abort a scheduling run.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("inconsistent solution: {0}")]
    Inconsistent(#[from] InconsistentSolutionError),
}
