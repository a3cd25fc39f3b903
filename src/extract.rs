//! Decode a solved assignment into per-student schedules, re-checking the
//! model's invariants on the way.
use crate::config::AssignmentPolicy;
use crate::domain::TimeBlock;
use crate::error::InconsistentSolutionError;
use crate::model::{RawAssignment, ScheduleModel};
use crate::schedule::{AttendanceRecord, ScheduleResult, SectionPlacement, StudentSchedule};
use crate::solve::SolveOutcome;
use std::collections::BTreeMap;
use tracing::debug;

/// Decode `outcome` against the model it was solved from.
///
/// The granted set of every student is always cross-checked against their
/// attendance. With `verify`, placement, double-booking and capacity are
/// re-checked as well.
pub fn extract(
    model: &ScheduleModel,
    outcome: &SolveOutcome,
    verify: bool,
) -> Result<ScheduleResult, InconsistentSolutionError> {
    if !outcome.status.has_solution() {
        return Ok(ScheduleResult::empty(outcome.status));
    }
    let expected = model.linear().num_vars();
    let assignment = outcome
        .assignment
        .as_ref()
        .ok_or(InconsistentSolutionError::AssignmentSize { expected, actual: 0 })?;
    if assignment.len() != expected {
        return Err(InconsistentSolutionError::AssignmentSize {
            expected,
            actual: assignment.len(),
        });
    }

    let placements = decode_placements(model, assignment, verify)?;
    let mut schedules = BTreeMap::new();
    for i in 0..model.input.students.len() {
        let schedule = decode_student(model, assignment, i, verify)?;
        schedules.insert(model.input.students[i].id.clone(), schedule);
    }
    debug!(placements = placements.len(), "solution decoded");

    Ok(ScheduleResult {
        status: outcome.status,
        objective_value: outcome.objective_value,
        schedules,
        placements,
    })
}

fn decode_placements(
    model: &ScheduleModel,
    assignment: &RawAssignment,
    verify: bool,
) -> Result<Vec<SectionPlacement>, InconsistentSolutionError> {
    let grid = &model.grid;
    let vars = &model.vars;
    let courses = &model.input.courses;
    let mut placements = Vec::new();

    for c in 0..grid.num_courses() {
        let mut per_block = vec![0usize; grid.blocks()];
        for s in 0..grid.sections(c) {
            let blocks: Vec<usize> = (0..grid.blocks())
                .filter(|&t| assignment.value(vars.placement.get(c, s, t)))
                .collect();
            if verify && blocks.len() > 1 {
                return Err(InconsistentSolutionError::SectionMultiplyPlaced {
                    course: courses[c].id.clone(),
                    section: s,
                    count: blocks.len(),
                });
            }
            for t in blocks {
                per_block[t] += 1;
                if verify {
                    check_capacity(model, assignment, c, s, t)?;
                }
                placements.push(SectionPlacement {
                    course: courses[c].id.clone(),
                    section: s,
                    time_block: TimeBlock(t),
                });
            }
        }
        if verify {
            if let Some((t, &count)) = per_block.iter().enumerate().find(|(_, n)| **n > 1) {
                return Err(InconsistentSolutionError::SimultaneousSections {
                    course: courses[c].id.clone(),
                    block: TimeBlock(t),
                    count,
                });
            }
        }
    }
    placements.sort_by(|a, b| a.time_block.cmp(&b.time_block).then_with(|| a.course.cmp(&b.course)));
    Ok(placements)
}

fn check_capacity(
    model: &ScheduleModel,
    assignment: &RawAssignment,
    c: usize,
    s: usize,
    t: usize,
) -> Result<(), InconsistentSolutionError> {
    let enrolled = (0..model.input.students.len())
        .filter(|&i| assignment.value(model.vars.attendance.get(i, c, s, t)))
        .count();
    let capacity = model.input.courses[c].section_capacity;
    if enrolled > capacity as usize {
        return Err(InconsistentSolutionError::OverCapacity {
            course: model.input.courses[c].id.clone(),
            section: s,
            enrolled,
            capacity,
        });
    }
    Ok(())
}

fn decode_student(
    model: &ScheduleModel,
    assignment: &RawAssignment,
    i: usize,
    verify: bool,
) -> Result<StudentSchedule, InconsistentSolutionError> {
    let student = &model.input.students[i];
    let courses = &model.input.courses;
    let vars = &model.vars;

    let granted: Vec<usize> = vars
        .selection
        .of_student(i)
        .iter()
        .enumerate()
        .filter(|(_, v)| assignment.value(**v))
        .map(|(k, _)| k)
        .collect();
    if granted.len() > 1 {
        return Err(InconsistentSolutionError::MultipleSelections {
            student: student.id.clone(),
            count: granted.len(),
        });
    }
    let granted_rank = granted.first().copied();
    if granted_rank.is_none() && model.options.assignment == AssignmentPolicy::ExactlyOne {
        return Err(InconsistentSolutionError::MissingSelection(student.id.clone()));
    }

    // (block, course, section) so that sorting orders by time.
    let mut attended: Vec<(usize, usize, usize)> = model
        .grid
        .iter()
        .filter(|&(c, s, t)| assignment.value(vars.attendance.get(i, c, s, t)))
        .map(|(c, s, t)| (t, c, s))
        .collect();
    attended.sort_unstable();

    if verify {
        for &(t, c, s) in &attended {
            if !assignment.value(vars.placement.get(c, s, t)) {
                return Err(InconsistentSolutionError::AttendanceWithoutPlacement {
                    student: student.id.clone(),
                    course: courses[c].id.clone(),
                    section: s,
                    block: TimeBlock(t),
                });
            }
        }
        if let Some(w) = attended.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(InconsistentSolutionError::DoubleBooked {
                student: student.id.clone(),
                block: TimeBlock(w[0].0),
            });
        }
    }

    let wanted: &[usize] = match granted_rank {
        Some(k) => &model.preferences[i][k],
        None => &[],
    };
    if let Some(&(_, c, _)) = attended.iter().find(|(_, c, _)| !wanted.contains(c)) {
        return Err(InconsistentSolutionError::CourseOutsideSelection {
            student: student.id.clone(),
            course: courses[c].id.clone(),
        });
    }
    for &c in wanted {
        let count = attended.iter().filter(|(_, ac, _)| *ac == c).count();
        if count != 1 {
            return Err(InconsistentSolutionError::WrongCourseCount {
                student: student.id.clone(),
                course: courses[c].id.clone(),
                count,
            });
        }
    }

    let records = attended
        .into_iter()
        .map(|(t, c, s)| AttendanceRecord {
            course: courses[c].id.clone(),
            section: s,
            time_block: TimeBlock(t),
        })
        .collect();
    Ok(StudentSchedule { granted_rank, records })
}
