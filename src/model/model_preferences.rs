//! Conditional preference constraints: if a student is granted set `k`, they
//! attend every course in `k` exactly once and nothing else.
use super::linear::{Comparison, ConstraintGroup, LinearExpr, LinearModel, VarId};
use super::model_context::ModelBuilderContext;
use crate::config::EncodingStrategy;
use tracing::{debug, trace};

/// Add the selection-to-attendance linkage for every (student, set) pair.
pub fn add_preference_constraints(ctx: &mut ModelBuilderContext<'_>) {
    let student_ceiling = ctx.student_attendance_ceiling();
    let course_ceilings: Vec<i64> = (0..ctx.grid.num_courses())
        .map(|c| ctx.course_attendance_ceiling(c))
        .collect();
    let strategy = ctx.options.encoding;
    let ModelBuilderContext {
        input,
        model,
        vars,
        preferences,
        ..
    } = ctx;

    let mut unassignable = 0;
    for (i, sets) in preferences.iter().enumerate() {
        for (k, courses) in sets.iter().enumerate() {
            let selected = vars.selection.get(i, k);
            let size = courses.len() as i64;

            // Empty sets would score without seating anyone; oversized sets can never fit the grid.
            if courses.is_empty() || size > student_ceiling {
                debug!(student = %input.students[i].id, rank = k, size, "preference set cannot be granted");
                model.add_eq(ConstraintGroup::Unassignable, selected, 0);
                unassignable += 1;
                continue;
            }

            let attended = LinearExpr::sum(vars.attendance.of_student(i).iter().copied());
            let bounds = capped(&attended, student_ceiling);
            add_conditional_eq(
                model,
                strategy,
                ConstraintGroup::PreferenceTotal,
                selected,
                attended,
                size,
                bounds,
            );

            for &c in courses {
                let in_course = LinearExpr::sum(vars.attendance.of_course(i, c));
                let bounds = capped(&in_course, course_ceilings[c]);
                add_conditional_eq(
                    model,
                    strategy,
                    ConstraintGroup::PreferenceCourse,
                    selected,
                    in_course,
                    1,
                    bounds,
                );
            }
        }
    }
    debug!(?strategy, unassignable, "preference constraints added");
}

/// Range of `expr` over 0/1 assignments, with the top clipped to what the
/// structural constraints allow.
fn capped(expr: &LinearExpr, ceiling: i64) -> (i64, i64) {
    let (lo, hi) = expr.bounds();
    (lo, hi.min(ceiling))
}

/// Encode `literal => expr == target`, where `bounds` are the smallest and
/// largest values `expr` can take in any feasible model.
///
/// With big-M each side gets its own slack, sized from `bounds`:
/// `expr <= target + (hi - target)(1 - literal)` and
/// `expr >= target - (target - lo)(1 - literal)`. A side whose slack is zero
/// already holds unconditionally and is skipped.
pub fn add_conditional_eq(
    model: &mut LinearModel,
    strategy: EncodingStrategy,
    group: ConstraintGroup,
    literal: VarId,
    expr: LinearExpr,
    target: i64,
    bounds: (i64, i64),
) {
    match strategy {
        EncodingStrategy::Indicator => {
            model.add_enforced(group, literal, expr, Comparison::Eq, target);
        }
        EncodingStrategy::BigM | EncodingStrategy::Auto => {
            let (lo, hi) = bounds;
            let m_up = hi - target;
            let m_down = target - lo;
            trace!(%group, target, m_up, m_down, "big-M");
            if m_up > 0 {
                let slack = (LinearExpr::from(1) - literal) * m_up;
                model.add_le(group, expr.clone(), slack + target);
            }
            if m_down > 0 {
                let slack = (LinearExpr::from(1) - literal) * m_down;
                model.add_ge(group, expr, LinearExpr::from(target) - slack);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Course, PreferenceSet, ScheduleInput, Student, TimeGrid};
    use crate::model::linear::{RawAssignment, VarKey};
    use crate::model::model_context::BuildOptions;

    fn one_var_model() -> (LinearModel, VarId, Vec<VarId>) {
        let mut model = LinearModel::new();
        let lit = model.new_bool_var(VarKey::Selection { student: 0, rank: 0 });
        let xs = (0..3)
            .map(|t| {
                model.new_bool_var(VarKey::Attendance {
                    student: 0,
                    course: 0,
                    section: 0,
                    block: t,
                })
            })
            .collect();
        (model, lit, xs)
    }

    fn assignment(lit: bool, xs: &[bool]) -> RawAssignment {
        let mut values = vec![lit];
        values.extend_from_slice(xs);
        RawAssignment::new(values)
    }

    #[test]
    fn test_big_m_binds_only_when_selected() {
        let (mut model, lit, xs) = one_var_model();
        add_conditional_eq(
            &mut model,
            EncodingStrategy::BigM,
            ConstraintGroup::PreferenceCourse,
            lit,
            LinearExpr::sum(xs),
            1,
            (0, 3),
        );
        assert_eq!(model.constraints().len(), 2);
        assert!(model.check(&assignment(true, &[false, true, false])).is_ok());
        assert!(model.check(&assignment(true, &[false, false, false])).is_err());
        assert!(model.check(&assignment(true, &[true, true, false])).is_err());
        // Unselected: anything within bounds is allowed.
        assert!(model.check(&assignment(false, &[false, false, false])).is_ok());
        assert!(model.check(&assignment(false, &[true, true, true])).is_ok());
    }

    #[test]
    fn test_big_m_skips_slack_free_side() {
        let (mut model, lit, xs) = one_var_model();
        add_conditional_eq(
            &mut model,
            EncodingStrategy::BigM,
            ConstraintGroup::PreferenceCourse,
            lit,
            LinearExpr::sum(xs.into_iter().take(1)),
            1,
            (0, 1),
        );
        assert_eq!(model.constraints().len(), 1);
        assert_eq!(model.constraints()[0].cmp, Comparison::Ge);
    }

    #[test]
    fn test_indicator_emits_enforced_equality() {
        let (mut model, lit, xs) = one_var_model();
        add_conditional_eq(
            &mut model,
            EncodingStrategy::Indicator,
            ConstraintGroup::PreferenceTotal,
            lit,
            LinearExpr::sum(xs),
            2,
            (0, 3),
        );
        let c = &model.constraints()[0];
        assert_eq!(c.enforcement, Some(lit));
        assert_eq!(c.cmp, Comparison::Eq);
        assert_eq!(c.rhs, 2);
        assert!(model.check(&assignment(false, &[true, false, false])).is_ok());
        assert!(model.check(&assignment(true, &[true, false, false])).is_err());
        assert!(model.check(&assignment(true, &[true, false, true])).is_ok());
    }

    #[test]
    fn test_big_m_uses_structural_ceiling() {
        // Two sections over three blocks: a student can sit in at most two
        // of the six attendance cells, so the upper slack is 2 - 1 = 1.
        let input = ScheduleInput::new(
            vec![Student::new("a", vec![PreferenceSet::new(["x"])])],
            vec![Course::new("x", 2, 1)],
        )
        .with_time_grid(TimeGrid::with_blocks(3));
        let mut ctx = ModelBuilderContext::new(&input, BuildOptions::default()).unwrap();
        add_preference_constraints(&mut ctx);
        let selected = ctx.vars.selection.get(0, 0);
        let upper = ctx
            .model
            .constraints()
            .iter()
            .find(|c| c.group == ConstraintGroup::PreferenceCourse && c.cmp == Comparison::Le)
            .unwrap();
        assert_eq!(upper.rhs, 2);
        assert!(upper.terms.contains(&(1, selected)));
    }

    #[test]
    fn test_oversized_and_empty_sets_are_fixed_off() {
        let input = ScheduleInput::new(
            vec![Student::new(
                "a",
                vec![PreferenceSet::default(), PreferenceSet::new(["x", "y", "z"]), PreferenceSet::new(["x"])],
            )],
            vec![Course::new("x", 1, 1), Course::new("y", 1, 1), Course::new("z", 1, 1)],
        )
        .with_time_grid(TimeGrid::with_blocks(2));
        let mut ctx = ModelBuilderContext::new(&input, BuildOptions::default()).unwrap();
        add_preference_constraints(&mut ctx);
        let stats = ctx.model.stats();
        assert_eq!(stats.constraints[&ConstraintGroup::Unassignable], 2);
        assert_eq!(stats.constraints[&ConstraintGroup::PreferenceCourse], 1);
    }
}
