//! Model building context and the build pipeline.
use super::linear::LinearModel;
use super::vars::{AttendanceVars, PlacementVars, SectionGrid, SelectionVars};
use super::{add_objective, add_preference_constraints, add_structural_constraints};
use crate::config::{AssignmentPolicy, EncodingStrategy, RankWeighting, SchedulerConfig};
use crate::domain::{Course, ScheduleInput};
use crate::error::ConfigurationError;
use tracing::{debug, info, instrument};

/// Choices that shape the formulation.
///
/// `build` knows nothing about the solver, so an `Auto` encoding reaching it
/// is built as big-M. Use [`BuildOptions::from_config`] to pick indicator
/// constraints for a solver that has them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub assignment: AssignmentPolicy,
    pub encoding: EncodingStrategy,
    pub weighting: RankWeighting,
}

impl BuildOptions {
    /// Takes policy and weighting from the config and resolves the encoding
    /// against what the target solver supports.
    pub fn from_config(config: &SchedulerConfig, native_indicators: bool) -> Self {
        BuildOptions {
            assignment: config.assignment,
            encoding: config.encoding.resolve(native_indicators),
            weighting: config.weighting,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelVars {
    pub selection: SelectionVars,
    pub attendance: AttendanceVars,
    pub placement: PlacementVars,
}

/// Everything the constraint groups need while the model is being assembled.
pub struct ModelBuilderContext<'a> {
    pub input: &'a ScheduleInput,
    pub model: LinearModel,
    pub vars: ModelVars,
    pub grid: SectionGrid,
    /// `preferences[i][k]` = course indices of student `i`'s set `k`.
    pub preferences: Vec<Vec<Vec<usize>>>,
    pub options: BuildOptions,
}

impl<'a> ModelBuilderContext<'a> {
    pub fn new(input: &'a ScheduleInput, options: BuildOptions) -> Result<Self, ConfigurationError> {
        input.validate()?;
        if let RankWeighting::TopN { n: 0 } = options.weighting {
            return Err(ConfigurationError::ZeroTopN);
        }

        let preferences = resolve_preferences(input)?;
        let mut model = LinearModel::new();
        let grid = SectionGrid::new(input);
        let selection = SelectionVars::new(&mut model, input);
        let placement = PlacementVars::new(&mut model, &grid);
        let attendance = AttendanceVars::new(&mut model, &grid, input.students.len());

        Ok(ModelBuilderContext {
            input,
            model,
            vars: ModelVars {
                selection,
                attendance,
                placement,
            },
            grid,
            preferences,
            options: ModelBuilderContext::concrete(options),
        })
    }

    fn concrete(mut options: BuildOptions) -> BuildOptions {
        if options.encoding == EncodingStrategy::Auto {
            debug!("auto encoding without a target solver, using big-M");
            options.encoding = EncodingStrategy::BigM;
        }
        options
    }

    pub fn num_students(&self) -> usize {
        self.input.students.len()
    }

    /// Most attendance a student can have for one course: one per section and
    /// one per block, whichever runs out first.
    pub fn course_attendance_ceiling(&self, course: usize) -> i64 {
        self.grid.sections(course).min(self.grid.blocks()) as i64
    }

    /// Most attendance a student can have overall: one per block, and never
    /// more than the sections on offer.
    pub fn student_attendance_ceiling(&self) -> i64 {
        self.grid.total_sections().min(self.grid.blocks()) as i64
    }

    pub fn finish(self) -> ScheduleModel {
        ScheduleModel {
            input: self.input.clone(),
            model: self.model,
            vars: self.vars,
            grid: self.grid,
            preferences: self.preferences,
            options: self.options,
        }
    }
}

fn resolve_preferences(input: &ScheduleInput) -> Result<Vec<Vec<Vec<usize>>>, ConfigurationError> {
    input
        .students
        .iter()
        .map(|student| {
            student
                .preferences
                .iter()
                .enumerate()
                .map(|(rank, set)| {
                    set.iter()
                        .map(|id| {
                            input.course_index(id).ok_or_else(|| ConfigurationError::UnknownCourse {
                                student: student.id.clone(),
                                rank,
                                course: id.clone(),
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// A fully built formulation, ready to hand to a solver.
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    pub input: ScheduleInput,
    pub model: LinearModel,
    pub vars: ModelVars,
    pub grid: SectionGrid,
    pub preferences: Vec<Vec<Vec<usize>>>,
    pub options: BuildOptions,
}

impl ScheduleModel {
    pub fn linear(&self) -> &LinearModel {
        &self.model
    }
}

/// Run every constraint group and the objective against the context.
pub fn build_model_pipeline(ctx: &mut ModelBuilderContext<'_>) {
    add_structural_constraints(ctx);
    add_preference_constraints(ctx);
    add_objective(ctx);
}

/// Validates `input` and builds the complete model for one scheduling run.
#[instrument(skip(input), fields(students = input.students.len(), courses = input.courses.len()))]
pub fn build(input: &ScheduleInput, options: BuildOptions) -> Result<ScheduleModel, ConfigurationError> {
    let mut ctx = ModelBuilderContext::new(input, options)?;
    let seats: u64 = input.courses.iter().map(Course::total_capacity).sum();
    let first_choice_demand: usize = input.students.iter().filter_map(|s| s.preferences.first()).map(|p| p.len()).sum();
    debug!(seats, first_choice_demand, "capacity overview");
    debug!(encoding = ?ctx.options.encoding, assignment = ?ctx.options.assignment, "building model");
    build_model_pipeline(&mut ctx);
    info!("model built: {}", ctx.model.stats());
    Ok(ctx.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PreferenceSet, Student};

    fn input() -> ScheduleInput {
        ScheduleInput::new(
            vec![Student::new("a", vec![PreferenceSet::new(["x"])])],
            vec![Course::new("x", 1, 1)],
        )
    }

    #[test]
    fn test_direct_build_resolves_auto_to_big_m() {
        let model = build(&input(), BuildOptions::default()).unwrap();
        assert_eq!(model.options.encoding, EncodingStrategy::BigM);
        assert_eq!(model.linear().stats().enforced_constraints, 0);
    }

    #[test]
    fn test_from_config_picks_indicators_when_supported() {
        let config = SchedulerConfig::default();
        let native = BuildOptions::from_config(&config, true);
        assert_eq!(native.encoding, EncodingStrategy::Indicator);
        let model = build(&input(), native).unwrap();
        assert!(model.linear().stats().enforced_constraints > 0);
        assert_eq!(BuildOptions::from_config(&config, false).encoding, EncodingStrategy::BigM);
    }
}
