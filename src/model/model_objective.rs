//! Objective: maximize the weighted count of granted preference sets.
use super::linear::LinearExpr;
use super::model_context::ModelBuilderContext;
use tracing::debug;

pub fn add_objective(ctx: &mut ModelBuilderContext<'_>) {
    let weighting = ctx.options.weighting;
    let objective: LinearExpr = ctx
        .preferences
        .iter()
        .enumerate()
        .flat_map(|(i, sets)| {
            let selection = &ctx.vars.selection;
            (0..sets.len()).map(move |k| (weighting.weight(k, sets.len()), selection.get(i, k)))
        })
        .filter(|(w, _)| *w > 0)
        .collect();
    debug!(terms = objective.terms().len(), ?weighting, "objective set");
    ctx.model.maximize(objective);
}
