use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Assign students to course sections and sections to time blocks.
#[derive(Parser, Debug)]
#[command(name = "enroll", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "legacy_students", "xlsx_input"])))]
pub struct Args {
    /// Input in the native JSON layout
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Student preferences in the two-file JSON layout
    #[arg(long, requires = "legacy_courses")]
    pub legacy_students: Option<PathBuf>,

    /// Courses in the two-file JSON layout
    #[arg(long, requires = "legacy_students")]
    pub legacy_courses: Option<PathBuf>,

    /// Term to read preferences from (two-file layout); defaults to each student's first term
    #[arg(long, requires = "legacy_students")]
    pub term: Option<String>,

    /// Workbook with `Courses` and `Preferences` sheets
    #[arg(long)]
    pub xlsx_input: Option<PathBuf>,

    /// Override the number of time blocks
    #[arg(long)]
    pub blocks: Option<usize>,

    /// Override the number of blocks per day (labels only)
    #[arg(long)]
    pub blocks_per_day: Option<usize>,

    /// Scheduler configuration (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the result as JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the schedule as a workbook
    #[arg(long)]
    pub xlsx_output: Option<PathBuf>,
}
