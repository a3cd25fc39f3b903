//! OR-Tools CP-SAT backend.
//!
//! The model is lowered straight to a `CpModelProto` so that enforced
//! constraints keep their enforcement literal instead of going through big-M.
use super::{SolveOutcome, SolveStatus, Solver};
use crate::config::SolverSettings;
use crate::error::SolverError;
use crate::model::{Comparison, LinearConstraint, LinearModel, RawAssignment};
use cp_sat::proto::{
    ConstraintProto, CpModelProto, CpObjectiveProto, CpSolverStatus, IntegerVariableProto, LinearConstraintProto,
    SatParameters, constraint_proto,
};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CpSatSolver;

impl CpSatSolver {
    pub fn new() -> Self {
        CpSatSolver
    }

    fn parameters(settings: &SolverSettings) -> SatParameters {
        let mut params = SatParameters::default();
        // Time limits
        params.max_time_in_seconds = settings.time_limit_secs;
        params.max_deterministic_time = settings.time_limit_secs;

        params.num_search_workers = settings.workers;
        params.random_seed = settings.random_seed;
        params.log_search_progress = Some(settings.log_search_progress);
        params
    }

    fn to_proto(model: &LinearModel) -> CpModelProto {
        let variables = model
            .vars()
            .map(|(_, key)| IntegerVariableProto {
                name: key.to_string(),
                domain: vec![0, 1],
                ..Default::default()
            })
            .collect();

        let constraints = model.constraints().iter().map(lower_constraint).collect();

        // CP-SAT minimizes `scaling_factor * (Σ coeffs·vars + offset)`; negate for maximization.
        let objective = model.objective();
        let objective = (!objective.terms().is_empty()).then(|| CpObjectiveProto {
            vars: objective.terms().iter().map(|(_, v)| v.index() as i32).collect(),
            coeffs: objective.terms().iter().map(|(c, _)| -c).collect(),
            offset: -(objective.constant() as f64),
            scaling_factor: -1.0,
            ..Default::default()
        });

        CpModelProto {
            name: "section_schedule".to_string(),
            variables,
            constraints,
            objective,
            ..Default::default()
        }
    }
}

fn lower_constraint(c: &LinearConstraint) -> ConstraintProto {
    let (lo, hi) = c
        .terms
        .iter()
        .fold((0i64, 0i64), |(lo, hi), &(coeff, _)| if coeff < 0 { (lo + coeff, hi) } else { (lo, hi + coeff) });
    // Domains stay within the reachable range so CP-SAT never sees an empty interval.
    let domain = match c.cmp {
        Comparison::Le => vec![lo.min(c.rhs), c.rhs],
        Comparison::Ge => vec![c.rhs, hi.max(c.rhs)],
        Comparison::Eq => vec![c.rhs, c.rhs],
    };
    ConstraintProto {
        name: c.group.to_string(),
        enforcement_literal: c.enforcement.iter().map(|v| v.index() as i32).collect(),
        constraint: Some(constraint_proto::Constraint::Linear(LinearConstraintProto {
            vars: c.terms.iter().map(|(_, v)| v.index() as i32).collect(),
            coeffs: c.terms.iter().map(|(coeff, _)| *coeff).collect(),
            domain,
            ..Default::default()
        })),
        ..Default::default()
    }
}

impl Solver for CpSatSolver {
    fn supports_indicators(&self) -> bool {
        true
    }

    fn solve(&self, model: &LinearModel, settings: &SolverSettings) -> Result<SolveOutcome, SolverError> {
        let proto = CpSatSolver::to_proto(model);
        let params = CpSatSolver::parameters(settings);
        let started = Instant::now();
        let response = cp_sat::ffi::solve_with_parameters(&proto, &params);
        let wall_time = started.elapsed();

        let status = match response.status() {
            CpSolverStatus::Optimal => SolveStatus::Optimal,
            CpSolverStatus::Feasible => SolveStatus::Feasible,
            CpSolverStatus::Infeasible => SolveStatus::Infeasible,
            CpSolverStatus::Unknown => SolveStatus::Unknown,
            CpSolverStatus::ModelInvalid => {
                warn!(validation = %response.solution_info, "CP-SAT rejected the model");
                return Err(SolverError::ModelInvalid);
            }
        };
        info!(%status, wall_ms = wall_time.as_millis() as u64, objective = response.objective_value, "CP-SAT finished");

        if !status.has_solution() {
            return Ok(SolveOutcome::without_solution(status, wall_time));
        }
        if response.solution.len() != model.num_vars() {
            return Err(SolverError::Backend(format!(
                "CP-SAT returned {} values for {} variables",
                response.solution.len(),
                model.num_vars()
            )));
        }
        let assignment = RawAssignment::new(response.solution.iter().map(|&v| v != 0).collect());
        let objective_value = (!model.objective().terms().is_empty()).then_some(response.objective_value);
        Ok(SolveOutcome {
            status,
            assignment: Some(assignment),
            objective_value,
            wall_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintGroup, LinearExpr, VarKey};

    #[test]
    fn test_proto_keeps_enforcement_literal() {
        let mut model = LinearModel::new();
        let a = model.new_bool_var(VarKey::Selection { student: 0, rank: 0 });
        let b = model.new_bool_var(VarKey::Selection { student: 0, rank: 1 });
        model.add_enforced(ConstraintGroup::PreferenceCourse, a, b, Comparison::Eq, 1);
        model.add_le(ConstraintGroup::OneSelection, LinearExpr::sum([a, b]), 1);
        model.maximize(LinearExpr::from(a));

        let proto = CpSatSolver::to_proto(&model);
        assert_eq!(proto.variables.len(), 2);
        assert_eq!(proto.constraints[0].enforcement_literal, vec![0]);
        assert!(proto.constraints[1].enforcement_literal.is_empty());
        let objective = proto.objective.unwrap();
        assert_eq!(objective.coeffs, vec![-1]);
        assert_eq!(objective.scaling_factor, -1.0);
    }

    #[test]
    fn test_le_domain_never_empty() {
        let mut model = LinearModel::new();
        let a = model.new_bool_var(VarKey::Selection { student: 0, rank: 0 });
        model.add_le(ConstraintGroup::Unassignable, a, -1);
        let proto = CpSatSolver::to_proto(&model);
        match &proto.constraints[0].constraint {
            Some(constraint_proto::Constraint::Linear(linear)) => assert_eq!(linear.domain, vec![-1, -1]),
            other => panic!("unexpected constraint {other:?}"),
        }
    }
}
