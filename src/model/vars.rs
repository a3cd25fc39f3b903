//! Typed variable families. Each family is a dense table with its shape fixed
//! at construction; indexing outside the shape panics instead of minting a new
//! variable.
use super::linear::{LinearModel, VarId, VarKey};
use crate::domain::ScheduleInput;

/// One Selection variable per (student, preference rank).
#[derive(Debug, Clone)]
pub struct SelectionVars {
    /// `offsets[i]..offsets[i + 1]` are student `i`'s variables.
    offsets: Vec<usize>,
    vars: Vec<VarId>,
}

impl SelectionVars {
    pub fn new(model: &mut LinearModel, input: &ScheduleInput) -> Self {
        let mut offsets = Vec::with_capacity(input.students.len() + 1);
        let mut vars = Vec::new();
        for (student, s) in input.students.iter().enumerate() {
            offsets.push(vars.len());
            for rank in 0..s.preferences.len() {
                vars.push(model.new_bool_var(VarKey::Selection { student, rank }));
            }
        }
        offsets.push(vars.len());
        SelectionVars { offsets, vars }
    }

    pub fn get(&self, student: usize, rank: usize) -> VarId {
        self.of_student(student)[rank]
    }

    pub fn of_student(&self, student: usize) -> &[VarId] {
        &self.vars[self.offsets[student]..self.offsets[student + 1]]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Shape shared by the attendance and placement tables: courses with a
/// varying number of sections, crossed with the time grid.
#[derive(Debug, Clone)]
pub struct SectionGrid {
    section_offsets: Vec<usize>,
    blocks: usize,
}

impl SectionGrid {
    pub fn new(input: &ScheduleInput) -> Self {
        let mut section_offsets = Vec::with_capacity(input.courses.len() + 1);
        let mut total = 0;
        for course in &input.courses {
            section_offsets.push(total);
            total += course.sections;
        }
        section_offsets.push(total);
        SectionGrid {
            section_offsets,
            blocks: input.time_grid.blocks,
        }
    }

    pub fn num_courses(&self) -> usize {
        self.section_offsets.len() - 1
    }

    pub fn sections(&self, course: usize) -> usize {
        self.section_offsets[course + 1] - self.section_offsets[course]
    }

    pub fn total_sections(&self) -> usize {
        self.section_offsets[self.num_courses()]
    }

    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Number of (section, block) cells across all courses.
    pub fn cells(&self) -> usize {
        self.total_sections() * self.blocks
    }

    fn cell(&self, course: usize, section: usize, block: usize) -> usize {
        assert!(
            section < self.sections(course) && block < self.blocks,
            "section {section} / block {block} out of range for course {course}"
        );
        (self.section_offsets[course] + section) * self.blocks + block
    }

    /// Every (course, section, block) in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.num_courses()).flat_map(move |c| {
            (0..self.sections(c)).flat_map(move |s| (0..self.blocks).map(move |t| (c, s, t)))
        })
    }
}

/// One Placement variable per (course, section, block).
#[derive(Debug, Clone)]
pub struct PlacementVars {
    grid: SectionGrid,
    vars: Vec<VarId>,
}

impl PlacementVars {
    pub fn new(model: &mut LinearModel, grid: &SectionGrid) -> Self {
        let vars = grid
            .iter()
            .map(|(course, section, block)| model.new_bool_var(VarKey::Placement { course, section, block }))
            .collect();
        PlacementVars { grid: grid.clone(), vars }
    }

    pub fn get(&self, course: usize, section: usize, block: usize) -> VarId {
        self.vars[self.grid.cell(course, section, block)]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// One Attendance variable per (student, course, section, block).
#[derive(Debug, Clone)]
pub struct AttendanceVars {
    grid: SectionGrid,
    students: usize,
    vars: Vec<VarId>,
}

impl AttendanceVars {
    pub fn new(model: &mut LinearModel, grid: &SectionGrid, students: usize) -> Self {
        let mut vars = Vec::with_capacity(students * grid.cells());
        for student in 0..students {
            for (course, section, block) in grid.iter() {
                vars.push(model.new_bool_var(VarKey::Attendance {
                    student,
                    course,
                    section,
                    block,
                }));
            }
        }
        AttendanceVars {
            grid: grid.clone(),
            students,
            vars,
        }
    }

    pub fn get(&self, student: usize, course: usize, section: usize, block: usize) -> VarId {
        assert!(student < self.students, "student {student} out of range");
        self.vars[student * self.grid.cells() + self.grid.cell(course, section, block)]
    }

    /// All of a student's variables for one course, across sections and blocks.
    pub fn of_course(&self, student: usize, course: usize) -> impl Iterator<Item = VarId> + '_ {
        (0..self.grid.sections(course))
            .flat_map(move |s| (0..self.grid.blocks).map(move |t| self.get(student, course, s, t)))
    }

    /// All of a student's variables at one block.
    pub fn at_block(&self, student: usize, block: usize) -> impl Iterator<Item = VarId> + '_ {
        (0..self.grid.num_courses())
            .flat_map(move |c| (0..self.grid.sections(c)).map(move |s| self.get(student, c, s, block)))
    }

    pub fn of_student(&self, student: usize) -> &[VarId] {
        let cells = self.grid.cells();
        &self.vars[student * cells..(student + 1) * cells]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
