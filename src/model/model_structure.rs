//! Structural constraints that hold regardless of which preference set a
//! student is granted.
use super::linear::{ConstraintGroup, LinearExpr};
use super::model_context::ModelBuilderContext;
use crate::config::AssignmentPolicy;
use tracing::{debug, warn};

/// Add selection, placement, attendance and capacity constraints to the model.
pub fn add_structural_constraints(ctx: &mut ModelBuilderContext<'_>) {
    let num_students = ctx.num_students();
    let ModelBuilderContext {
        input,
        model,
        vars,
        grid,
        preferences,
        options,
    } = ctx;
    let blocks = grid.blocks();

    // --- Students: at most (or exactly) one granted set ---
    for i in 0..num_students {
        let selected = LinearExpr::sum(vars.selection.of_student(i).iter().copied());
        match options.assignment {
            AssignmentPolicy::AtMostOne => model.add_le(ConstraintGroup::OneSelection, selected, 1),
            AssignmentPolicy::ExactlyOne => {
                if preferences[i].is_empty() {
                    warn!(student = %input.students[i].id, "no preference sets under exactly-one policy");
                }
                model.add_eq(ConstraintGroup::OneSelection, selected, 1)
            }
        }
    }

    // --- Sections: one block at most, and sections of a course never share a block ---
    for c in 0..grid.num_courses() {
        let sections = grid.sections(c);
        for s in 0..sections {
            let placed = LinearExpr::sum((0..blocks).map(|t| vars.placement.get(c, s, t)));
            model.add_le(ConstraintGroup::SectionOnce, placed, 1);
        }
        if sections > 1 {
            for t in 0..blocks {
                let at_block = LinearExpr::sum((0..sections).map(|s| vars.placement.get(c, s, t)));
                model.add_le(ConstraintGroup::SectionsApart, at_block, 1);
            }
        }
    }

    // --- Attendance requires placement; capacity binds per placed section ---
    for (c, s, t) in grid.iter() {
        let placed = vars.placement.get(c, s, t);
        for i in 0..num_students {
            model.add_le(
                ConstraintGroup::AttendanceNeedsPlacement,
                vars.attendance.get(i, c, s, t),
                placed,
            );
        }
        let capacity = input.courses[c].section_capacity as i64;
        let seated = LinearExpr::sum((0..num_students).map(|i| vars.attendance.get(i, c, s, t)));
        model.add_le(
            ConstraintGroup::SectionCapacity,
            seated,
            LinearExpr::from(placed) * capacity,
        );
    }

    // --- Students: one class per block, and nothing beyond the granted set's size ---
    for i in 0..num_students {
        for t in 0..blocks {
            let busy = LinearExpr::sum(vars.attendance.at_block(i, t));
            model.add_le(ConstraintGroup::NoDoubleBooking, busy, 1);
        }
        let attended = LinearExpr::sum(vars.attendance.of_student(i).iter().copied());
        let granted_size: LinearExpr = preferences[i]
            .iter()
            .enumerate()
            .map(|(k, set)| (set.len() as i64, vars.selection.get(i, k)))
            .collect();
        model.add_le(ConstraintGroup::AttendanceCeiling, attended, granted_size);
    }

    debug!(constraints = model.constraints().len(), "structural constraints added");
}
