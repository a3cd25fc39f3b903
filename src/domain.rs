//! Domain data: students, courses, sections, time blocks and preference sets.
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Default grid: 5 days × 4 blocks/day.
pub const DEFAULT_TIME_BLOCKS: usize = 20;
pub const DEFAULT_BLOCKS_PER_DAY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(s: &str) -> Self {
        StudentId(s.to_string())
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        CourseId(s.to_string())
    }
}

impl From<String> for StudentId {
    fn from(s: String) -> Self {
        StudentId(s)
    }
}

impl From<String> for CourseId {
    fn from(s: String) -> Self {
        CourseId(s)
    }
}

/// A bundle of courses a student wants to take concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceSet(pub BTreeSet<CourseId>);

impl PreferenceSet {
    pub fn new<I, C>(courses: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CourseId>,
    {
        PreferenceSet(courses.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, course: &CourseId) -> bool {
        self.0.contains(course)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseId> {
        self.0.iter()
    }
}

/// A student and their ranked preference sets (index 0 is the first choice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(default)]
    pub preferences: Vec<PreferenceSet>,
}

impl Student {
    pub fn new(id: impl Into<String>, preferences: Vec<PreferenceSet>) -> Self {
        Student {
            id: StudentId(id.into()),
            preferences,
        }
    }
}

/// A course offered in `sections` sections of `section_capacity` seats each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub sections: usize,
    pub section_capacity: u32,
}

impl Course {
    pub fn new(id: impl Into<String>, sections: usize, section_capacity: u32) -> Self {
        Course {
            id: CourseId(id.into()),
            sections,
            section_capacity,
        }
    }

    /// Seats across every section of the course.
    pub fn total_capacity(&self) -> u64 {
        self.sections as u64 * self.section_capacity as u64
    }
}

/// A slot in the scheduling grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeBlock(pub usize);

impl TimeBlock {
    pub fn day(self, grid: &TimeGrid) -> usize {
        self.0 / grid.blocks_per_day
    }

    pub fn slot(self, grid: &TimeGrid) -> usize {
        self.0 % grid.blocks_per_day
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeGrid {
    pub blocks: usize,
    /// Only used to label blocks as (day, slot) when presenting a schedule.
    pub blocks_per_day: usize,
}

impl Default for TimeGrid {
    fn default() -> Self {
        TimeGrid {
            blocks: DEFAULT_TIME_BLOCKS,
            blocks_per_day: DEFAULT_BLOCKS_PER_DAY,
        }
    }
}

impl TimeGrid {
    pub fn with_blocks(blocks: usize) -> Self {
        TimeGrid {
            blocks,
            ..TimeGrid::default()
        }
    }
}

/// Immutable snapshot of one scheduling run's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    #[serde(default)]
    pub time_grid: TimeGrid,
}

impl ScheduleInput {
    pub fn new(students: Vec<Student>, courses: Vec<Course>) -> Self {
        ScheduleInput {
            students,
            courses,
            time_grid: TimeGrid::default(),
        }
    }

    pub fn with_time_grid(mut self, grid: TimeGrid) -> Self {
        self.time_grid = grid;
        self
    }

    /// Builds an input from parallel arrays: `preferences[i]` belongs to
    /// `students[i]`, and `sections[j]`/`capacities[j]` describe `courses[j]`.
    pub fn from_parallel(
        students: Vec<String>,
        preferences: Vec<Vec<Vec<String>>>,
        courses: Vec<String>,
        sections: Vec<usize>,
        capacities: Vec<u32>,
        blocks: usize,
    ) -> Result<Self, ConfigurationError> {
        check_len("preferences", students.len(), preferences.len())?;
        check_len("sections", courses.len(), sections.len())?;
        check_len("capacities", courses.len(), capacities.len())?;

        let students = students
            .into_iter()
            .zip(preferences)
            .map(|(id, sets)| Student::new(id, sets.into_iter().map(PreferenceSet::new).collect()))
            .collect();
        let courses = courses
            .into_iter()
            .zip(sections.into_iter().zip(capacities))
            .map(|(id, (sections, capacity))| Course::new(id, sections, capacity))
            .collect();

        let input = ScheduleInput::new(students, courses).with_time_grid(TimeGrid::with_blocks(blocks));
        input.validate()?;
        Ok(input)
    }

    /// Checks references, positivity and uniqueness. Fails on the first problem found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.students.is_empty() {
            return Err(ConfigurationError::NoStudents);
        }
        if self.courses.is_empty() {
            return Err(ConfigurationError::NoCourses);
        }
        if self.time_grid.blocks == 0 || self.time_grid.blocks_per_day == 0 {
            return Err(ConfigurationError::EmptyTimeGrid);
        }

        let mut course_ids = HashSet::new();
        for course in &self.courses {
            if !course_ids.insert(&course.id) {
                return Err(ConfigurationError::DuplicateCourse(course.id.clone()));
            }
            if course.sections == 0 {
                return Err(ConfigurationError::ZeroSections(course.id.clone()));
            }
            if course.section_capacity == 0 {
                return Err(ConfigurationError::ZeroCapacity(course.id.clone()));
            }
        }

        let mut student_ids = HashSet::new();
        for student in &self.students {
            if !student_ids.insert(&student.id) {
                return Err(ConfigurationError::DuplicateStudent(student.id.clone()));
            }
            for (rank, set) in student.preferences.iter().enumerate() {
                if let Some(course) = set.iter().find(|c| !course_ids.contains(c)) {
                    return Err(ConfigurationError::UnknownCourse {
                        student: student.id.clone(),
                        rank,
                        course: course.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn course_index(&self, id: &CourseId) -> Option<usize> {
        self.courses.iter().position(|c| &c.id == id)
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ConfigurationError> {
    if expected != actual {
        return Err(ConfigurationError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_parallel_builds_input() {
        let input = ScheduleInput::from_parallel(
            strings(&["Alice", "Bob"]),
            vec![
                vec![strings(&["1"]), strings(&["2"])],
                vec![strings(&["2"]), strings(&["1"])],
            ],
            strings(&["1", "2"]),
            vec![1, 1],
            vec![2, 2],
            20,
        )
        .unwrap();
        assert_eq!(input.students.len(), 2);
        assert_eq!(input.students[1].preferences[0], PreferenceSet::new(["2"]));
        assert_eq!(input.time_grid.blocks, 20);
        assert_eq!(input.courses[1].id, CourseId::from("2"));
        assert_eq!(input.courses[1].total_capacity(), 2);
    }

    #[test]
    fn test_from_parallel_rejects_length_mismatch() {
        let err = ScheduleInput::from_parallel(
            strings(&["Alice"]),
            vec![vec![strings(&["1"])]],
            strings(&["1", "2"]),
            vec![1],
            vec![2, 2],
            20,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::LengthMismatch {
                what: "sections",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_validate_unknown_course() {
        let input = ScheduleInput::new(
            vec![Student::new("s", vec![PreferenceSet::new(["a", "zz"])])],
            vec![Course::new("a", 1, 1)],
        );
        assert!(matches!(
            input.validate(),
            Err(ConfigurationError::UnknownCourse { rank: 0, .. })
        ));
    }

    #[test]
    fn test_validate_non_positive_values() {
        let student = Student::new("s", vec![PreferenceSet::new(["a"])]);
        let zero_cap = ScheduleInput::new(vec![student.clone()], vec![Course::new("a", 1, 0)]);
        assert!(matches!(zero_cap.validate(), Err(ConfigurationError::ZeroCapacity(_))));

        let zero_sec = ScheduleInput::new(vec![student.clone()], vec![Course::new("a", 0, 3)]);
        assert!(matches!(zero_sec.validate(), Err(ConfigurationError::ZeroSections(_))));

        let no_grid = ScheduleInput::new(vec![student], vec![Course::new("a", 1, 3)])
            .with_time_grid(TimeGrid::with_blocks(0));
        assert_eq!(no_grid.validate(), Err(ConfigurationError::EmptyTimeGrid));
    }

    #[test]
    fn test_validate_duplicates() {
        let input = ScheduleInput::new(
            vec![Student::new("s", vec![]), Student::new("s", vec![])],
            vec![Course::new("a", 1, 1)],
        );
        assert!(matches!(input.validate(), Err(ConfigurationError::DuplicateStudent(_))));
    }

    #[test]
    fn test_time_block_labels() {
        let grid = TimeGrid::default();
        assert_eq!(TimeBlock(0).day(&grid), 0);
        assert_eq!(TimeBlock(7).day(&grid), 1);
        assert_eq!(TimeBlock(7).slot(&grid), 3);
    }

    #[test]
    fn test_preference_set_from_owned_ids() {
        let owned = vec!["b".to_string(), "a".to_string()];
        let set = PreferenceSet::new(owned);
        assert!(set.contains(&CourseId::from("a")));
        assert_eq!(StudentId::from("s".to_string()), StudentId::from("s"));
    }

    #[test]
    fn test_preference_set_deduplicates() {
        let set = PreferenceSet::new(["a", "b", "a"]);
        assert_eq!(set.len(), 2);
    }
}
