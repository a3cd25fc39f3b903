//! The timetabling formulation: variable families, constraint groups and the objective.

pub mod linear;
mod model_context;
mod model_objective;
mod model_preferences;
mod model_structure;
pub mod vars;

pub use linear::{
    Comparison, ConstraintGroup, LinearConstraint, LinearExpr, LinearModel, ModelStats, RawAssignment, VarId,
    VarKey, Violation,
};
pub use model_context::{BuildOptions, ModelBuilderContext, ModelVars, ScheduleModel, build, build_model_pipeline};
pub use model_objective::add_objective;
pub use model_preferences::{add_conditional_eq, add_preference_constraints};
pub use model_structure::add_structural_constraints;
