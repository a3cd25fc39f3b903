//! Spreadsheet input and output.
//!
//! Input workbook:
//! - `Courses`: `id | sections | capacity` (header in row 1)
//! - `Preferences`: `student | rank | courses` where `rank` starts at 1 and
//!   `courses` is a comma-separated list of course ids (header in row 1)
use super::IoError;
use crate::domain::{Course, PreferenceSet, ScheduleInput, Student, TimeGrid};
use crate::schedule::ScheduleResult;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

const COURSES: &str = "Courses";
const PREFERENCES: &str = "Preferences";

pub fn read_input(path: impl AsRef<Path>, time_grid: TimeGrid) -> Result<ScheduleInput, IoError> {
    let book = umya_spreadsheet::reader::xlsx::read(path.as_ref()).map_err(|e| IoError::SheetRead(format!("{e:?}")))?;
    let courses = read_courses(find_sheet(&book, COURSES)?)?;
    let students = read_preferences(find_sheet(&book, PREFERENCES)?)?;
    Ok(ScheduleInput {
        students,
        courses,
        time_grid,
    })
}

fn find_sheet<'a>(book: &'a Spreadsheet, name: &'static str) -> Result<&'a Worksheet, IoError> {
    book.get_sheet_collection()
        .iter()
        .find(|s| s.get_name() == name)
        .ok_or(IoError::MissingSheet(name))
}

fn read_courses(sheet: &Worksheet) -> Result<Vec<Course>, IoError> {
    let mut courses = Vec::new();
    for row in 2..=sheet.get_highest_row() {
        let id = sheet.get_value((1, row)).trim().to_string();
        if id.is_empty() {
            continue;
        }
        let sections = parse_cell(sheet, COURSES, 2, row)?;
        let capacity = parse_cell(sheet, COURSES, 3, row)?;
        courses.push(Course::new(id, sections as usize, capacity));
    }
    Ok(courses)
}

fn read_preferences(sheet: &Worksheet) -> Result<Vec<Student>, IoError> {
    // (student, [(rank, set)]) in order of first appearance
    let mut rows: Vec<(String, Vec<(u32, PreferenceSet)>)> = Vec::new();
    for row in 2..=sheet.get_highest_row() {
        let student = sheet.get_value((1, row)).trim().to_string();
        if student.is_empty() {
            continue;
        }
        let rank = parse_cell(sheet, PREFERENCES, 2, row)?;
        if rank == 0 {
            return Err(IoError::BadRow {
                sheet: PREFERENCES,
                row,
                message: "rank starts at 1".to_string(),
            });
        }
        let set = PreferenceSet::new(
            sheet
                .get_value((3, row))
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        );
        match rows.iter_mut().find(|(id, _)| *id == student) {
            Some((_, sets)) => sets.push((rank, set)),
            None => rows.push((student, vec![(rank, set)])),
        }
    }

    Ok(rows
        .into_iter()
        .map(|(id, mut sets)| {
            sets.sort_by_key(|(rank, _)| *rank);
            Student::new(id, sets.into_iter().map(|(_, set)| set).collect())
        })
        .collect())
}

fn parse_cell(sheet: &Worksheet, name: &'static str, col: u32, row: u32) -> Result<u32, IoError> {
    let raw = sheet.get_value((col, row));
    let raw = raw.trim();
    // Numeric cells may come back as "3.0".
    raw.parse::<u32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u32))
        .ok_or_else(|| IoError::BadRow {
            sheet: name,
            row,
            message: format!("expected a non-negative integer in column {col}, got {raw:?}"),
        })
}

/// Write one row per attendance record plus a sheet of section placements.
pub fn write_schedule(path: impl AsRef<Path>, result: &ScheduleResult, grid: &TimeGrid) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Schedule")?;
    for (col, title) in ["student", "granted rank", "course", "section", "day", "slot", "block"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    let mut row = 1;
    for (student, schedule) in &result.schedules {
        if schedule.records.is_empty() {
            sheet.write_string(row, 0, student.0.as_str())?;
            sheet.write_string(row, 1, "unassigned")?;
            row += 1;
            continue;
        }
        for record in &schedule.records {
            sheet.write_string(row, 0, student.0.as_str())?;
            if let Some(rank) = schedule.granted_rank {
                sheet.write_number(row, 1, (rank + 1) as f64)?;
            }
            sheet.write_string(row, 2, record.course.0.as_str())?;
            sheet.write_number(row, 3, (record.section + 1) as f64)?;
            sheet.write_number(row, 4, (record.time_block.day(grid) + 1) as f64)?;
            sheet.write_number(row, 5, (record.time_block.slot(grid) + 1) as f64)?;
            sheet.write_number(row, 6, record.time_block.0 as f64)?;
            row += 1;
        }
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Placements")?;
    for (col, title) in ["course", "section", "day", "slot", "block"].iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (i, placement) in result.placements.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, placement.course.0.as_str())?;
        sheet.write_number(row, 1, (placement.section + 1) as f64)?;
        sheet.write_number(row, 2, (placement.time_block.day(grid) + 1) as f64)?;
        sheet.write_number(row, 3, (placement.time_block.slot(grid) + 1) as f64)?;
        sheet.write_number(row, 4, placement.time_block.0 as f64)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;
    sheet.write_string_with_format(0, 0, "status", &bold)?;
    sheet.write_string(0, 1, result.status.as_str())?;
    sheet.write_string_with_format(1, 0, "assigned", &bold)?;
    sheet.write_number(1, 1, result.assigned_count() as f64)?;
    sheet.write_string_with_format(2, 0, "students", &bold)?;
    sheet.write_number(2, 1, result.schedules.len() as f64)?;

    workbook.save(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourseId, StudentId, TimeBlock};
    use crate::schedule::{AttendanceRecord, SectionPlacement, StudentSchedule};
    use crate::solve::SolveStatus;

    #[test]
    fn test_write_schedule_creates_workbook() {
        let mut result = ScheduleResult::empty(SolveStatus::Optimal);
        result.schedules.insert(
            StudentId::from("a"),
            StudentSchedule {
                granted_rank: Some(0),
                records: vec![AttendanceRecord {
                    course: CourseId::from("x"),
                    section: 0,
                    time_block: TimeBlock(5),
                }],
            },
        );
        result.schedules.insert(StudentId::from("b"), StudentSchedule::default());
        result.placements.push(SectionPlacement {
            course: CourseId::from("x"),
            section: 0,
            time_block: TimeBlock(5),
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.xlsx");
        write_schedule(&path, &result, &TimeGrid::default()).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_read_input_from_written_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(COURSES).unwrap();
        for (col, v) in ["id", "sections", "capacity"].iter().enumerate() {
            sheet.write_string(0, col as u16, *v).unwrap();
        }
        sheet.write_string(1, 0, "math").unwrap();
        sheet.write_number(1, 1, 2.0).unwrap();
        sheet.write_number(1, 2, 30.0).unwrap();
        sheet.write_string(2, 0, "bio").unwrap();
        sheet.write_number(2, 1, 1.0).unwrap();
        sheet.write_number(2, 2, 25.0).unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name(PREFERENCES).unwrap();
        for (col, v) in ["student", "rank", "courses"].iter().enumerate() {
            sheet.write_string(0, col as u16, *v).unwrap();
        }
        sheet.write_string(1, 0, "alice").unwrap();
        sheet.write_number(1, 1, 2.0).unwrap();
        sheet.write_string(1, 2, "bio").unwrap();
        sheet.write_string(2, 0, "alice").unwrap();
        sheet.write_number(2, 1, 1.0).unwrap();
        sheet.write_string(2, 2, "math, bio").unwrap();
        workbook.save(&path).unwrap();

        let input = read_input(&path, TimeGrid::default()).unwrap();
        assert_eq!(input.courses, vec![Course::new("math", 2, 30), Course::new("bio", 1, 25)]);
        assert_eq!(input.students.len(), 1);
        assert_eq!(input.students[0].preferences[0], PreferenceSet::new(["math", "bio"]));
        assert_eq!(input.students[0].preferences[1], PreferenceSet::new(["bio"]));
    }
}
