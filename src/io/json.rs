//! JSON input and output.
//!
//! Two input layouts are accepted: the native [`ScheduleInput`] shape, and the
//! older two-file layout (`student-preferences.json` + `courses.json`) where
//! each student lists preferences per term.
use super::IoError;
use crate::domain::{Course, PreferenceSet, ScheduleInput, Student, TimeGrid};
use crate::schedule::ScheduleResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub fn read_input(path: impl AsRef<Path>) -> Result<ScheduleInput, IoError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn write_result(path: impl AsRef<Path>, result: &ScheduleResult) -> Result<(), IoError> {
    let text = serde_json::to_string_pretty(result)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Ids in the two-file layout may be numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum LegacyId {
    Number(i64),
    Text(String),
}

impl fmt::Display for LegacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyId::Number(n) => write!(f, "{n}"),
            LegacyId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyStudent {
    student_id: LegacyId,
    #[serde(default)]
    terms: Vec<LegacyTerm>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTerm {
    term_id: LegacyId,
    #[serde(default)]
    courses_preferences: Vec<Vec<LegacyId>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCourse {
    id: LegacyId,
    #[serde(default)]
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    code: Option<String>,
    /// Seats per section.
    max_seats: u32,
    max_sections: usize,
}

/// Parse the two-file layout. Preferences come from the term named `term`, or
/// from each student's first term when `term` is `None`.
pub fn parse_legacy(students_json: &str, courses_json: &str, term: Option<&str>) -> Result<ScheduleInput, IoError> {
    let students: Vec<LegacyStudent> = serde_json::from_str(students_json)?;
    let courses: Vec<LegacyCourse> = serde_json::from_str(courses_json)?;

    let courses = courses
        .into_iter()
        .map(|c| Course::new(c.id.to_string(), c.max_sections, c.max_seats))
        .collect();

    let students = students
        .into_iter()
        .map(|s| {
            let chosen = match term {
                Some(term) => s.terms.iter().find(|t| t.term_id.to_string() == term),
                None => s.terms.first(),
            };
            let preferences = match chosen {
                Some(t) => t
                    .courses_preferences
                    .iter()
                    .map(|set| PreferenceSet::new(set.iter().map(|c| c.to_string())))
                    .collect(),
                None => {
                    warn!(student = %s.student_id, ?term, "no matching term, student has no preferences");
                    Vec::new()
                }
            };
            Student::new(s.student_id.to_string(), preferences)
        })
        .collect::<Vec<_>>();
    debug!(students = students.len(), "parsed two-file input");

    Ok(ScheduleInput {
        students,
        courses,
        time_grid: TimeGrid::default(),
    })
}

pub fn read_legacy(
    students_path: impl AsRef<Path>,
    courses_path: impl AsRef<Path>,
    term: Option<&str>,
) -> Result<ScheduleInput, IoError> {
    let students = std::fs::read_to_string(students_path)?;
    let courses = std::fs::read_to_string(courses_path)?;
    parse_legacy(&students, &courses, term)
}
