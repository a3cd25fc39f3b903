mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use enroll_core::io::{json, xlsx};
use enroll_core::solve::CpSatSolver;
use enroll_core::{ScheduleInput, SchedulerConfig, TimeGrid, logging, run};
use tracing::info;

fn load_input(args: &Args) -> Result<ScheduleInput> {
    let mut input = if let Some(path) = &args.input {
        json::read_input(path).with_context(|| format!("reading {}", path.display()))?
    } else if let (Some(students), Some(courses)) = (&args.legacy_students, &args.legacy_courses) {
        json::read_legacy(students, courses, args.term.as_deref())
            .with_context(|| format!("reading {} and {}", students.display(), courses.display()))?
    } else if let Some(path) = &args.xlsx_input {
        xlsx::read_input(path, TimeGrid::default()).with_context(|| format!("reading {}", path.display()))?
    } else {
        anyhow::bail!("no input given");
    };

    if let Some(blocks) = args.blocks {
        input.time_grid.blocks = blocks;
    }
    if let Some(per_day) = args.blocks_per_day {
        input.time_grid.blocks_per_day = per_day;
    }
    Ok(input)
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let input = load_input(&args)?;
    let config = match &args.config {
        Some(path) => SchedulerConfig::from_path(path)?,
        None => SchedulerConfig::default(),
    };
    info!(
        students = input.students.len(),
        courses = input.courses.len(),
        blocks = input.time_grid.blocks,
        "input loaded"
    );

    let result = run(&input, &config, &CpSatSolver::new())?;

    match &args.output {
        Some(path) => {
            json::write_result(path, &result).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    if let Some(path) = &args.xlsx_output {
        xlsx::write_schedule(path, &result, &input.time_grid).with_context(|| format!("writing {}", path.display()))?;
    }

    eprintln!(
        "{}: {} of {} students assigned",
        result.status,
        result.assigned_count(),
        input.students.len()
    );
    Ok(())
}
