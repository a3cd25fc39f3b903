//! Solver-agnostic model registry: boolean variables, linear constraints
//! (optionally enforced by a literal) and a maximization objective.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a variable stands for. Indices are dense positions in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKey {
    Selection { student: usize, rank: usize },
    Attendance { student: usize, course: usize, section: usize, block: usize },
    Placement { course: usize, section: usize, block: usize },
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            VarKey::Selection { student, rank } => write!(f, "x[{student},{rank}]"),
            VarKey::Attendance { student, course, section, block } => {
                write!(f, "y[{student},{course},{section},{block}]")
            }
            VarKey::Placement { course, section, block } => write!(f, "z[{course},{section},{block}]"),
        }
    }
}

/// Which rule a constraint encodes. Used for stats and violation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintGroup {
    OneSelection,
    SectionOnce,
    SectionsApart,
    AttendanceNeedsPlacement,
    NoDoubleBooking,
    SectionCapacity,
    AttendanceCeiling,
    PreferenceTotal,
    PreferenceCourse,
    Unassignable,
}

impl fmt::Display for ConstraintGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintGroup::OneSelection => "one-selection",
            ConstraintGroup::SectionOnce => "section-once",
            ConstraintGroup::SectionsApart => "sections-apart",
            ConstraintGroup::AttendanceNeedsPlacement => "attendance-needs-placement",
            ConstraintGroup::NoDoubleBooking => "no-double-booking",
            ConstraintGroup::SectionCapacity => "section-capacity",
            ConstraintGroup::AttendanceCeiling => "attendance-ceiling",
            ConstraintGroup::PreferenceTotal => "preference-total",
            ConstraintGroup::PreferenceCourse => "preference-course",
            ConstraintGroup::Unassignable => "unassignable",
        };
        f.write_str(name)
    }
}

/// `Σ coeff·var + constant` over boolean variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(i64, VarId)>,
    constant: i64,
}

impl LinearExpr {
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        vars.into_iter().map(|v| (1, v)).collect()
    }

    pub fn terms(&self) -> &[(i64, VarId)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Smallest and largest value over all 0/1 assignments.
    pub fn bounds(&self) -> (i64, i64) {
        self.merged().fold((self.constant, self.constant), |(lo, hi), (c, _)| {
            if c < 0 { (lo + c, hi) } else { (lo, hi + c) }
        })
    }

    pub fn value(&self, assignment: &RawAssignment) -> i64 {
        self.terms
            .iter()
            .filter(|(_, v)| assignment.value(*v))
            .map(|(c, _)| c)
            .sum::<i64>()
            + self.constant
    }

    /// Terms with repeated variables combined and zero coefficients dropped.
    fn merged(&self) -> impl Iterator<Item = (i64, VarId)> {
        let mut acc: BTreeMap<VarId, i64> = BTreeMap::new();
        for &(c, v) in &self.terms {
            *acc.entry(v).or_insert(0) += c;
        }
        acc.into_iter().filter(|(_, c)| *c != 0).map(|(v, c)| (c, v))
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr { terms: vec![(1, var)], constant: 0 }
    }
}

impl From<i64> for LinearExpr {
    fn from(constant: i64) -> Self {
        LinearExpr { terms: Vec::new(), constant }
    }
}

impl From<i32> for LinearExpr {
    fn from(constant: i32) -> Self {
        LinearExpr::from(constant as i64)
    }
}

impl FromIterator<(i64, VarId)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (i64, VarId)>>(iter: I) -> Self {
        LinearExpr { terms: iter.into_iter().collect(), constant: 0 }
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;
    fn add(mut self, rhs: T) -> LinearExpr {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;
    fn sub(self, rhs: T) -> LinearExpr {
        self + (-rhs.into())
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;
    fn neg(self) -> LinearExpr {
        self * -1i64
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;
    fn mul(mut self, k: i64) -> LinearExpr {
        for term in &mut self.terms {
            term.0 *= k;
        }
        self.constant *= k;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

impl Comparison {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Le => lhs <= rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Eq => lhs == rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
        })
    }
}

/// `Σ terms cmp rhs`, active only when `enforcement` is true (if set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub group: ConstraintGroup,
    pub terms: Vec<(i64, VarId)>,
    pub cmp: Comparison,
    pub rhs: i64,
    pub enforcement: Option<VarId>,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, assignment: &RawAssignment) -> bool {
        if let Some(lit) = self.enforcement {
            if !assignment.value(lit) {
                return true;
            }
        }
        self.cmp.holds(self.lhs_value(assignment), self.rhs)
    }

    pub fn lhs_value(&self, assignment: &RawAssignment) -> i64 {
        self.terms
            .iter()
            .filter(|(_, v)| assignment.value(*v))
            .map(|(c, _)| c)
            .sum()
    }
}

/// A solved value for every variable, indexed by `VarId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAssignment(Vec<bool>);

impl RawAssignment {
    pub fn new(values: Vec<bool>) -> Self {
        RawAssignment(values)
    }

    /// All-false assignment of the given size.
    pub fn zeros(len: usize) -> Self {
        RawAssignment(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn value(&self, var: VarId) -> bool {
        self.0.get(var.index()).copied().unwrap_or(false)
    }

    pub fn set(&mut self, var: VarId, value: bool) {
        self.0[var.index()] = value;
    }
}

/// A constraint that a given assignment breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub group: ConstraintGroup,
    pub lhs: i64,
    pub cmp: Comparison,
    pub rhs: i64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "constraint #{} ({}) violated: {} {} {}",
            self.index, self.group, self.lhs, self.cmp, self.rhs
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub selection_vars: usize,
    pub attendance_vars: usize,
    pub placement_vars: usize,
    pub constraints: BTreeMap<ConstraintGroup, usize>,
    pub enforced_constraints: usize,
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vars: selection={} attendance={} placement={}; constraints:",
            self.selection_vars, self.attendance_vars, self.placement_vars
        )?;
        for (group, count) in &self.constraints {
            write!(f, " {group}={count}")?;
        }
        write!(f, "; enforced={}", self.enforced_constraints)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    vars: Vec<VarKey>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl LinearModel {
    pub fn new() -> Self {
        LinearModel::default()
    }

    pub fn new_bool_var(&mut self, key: VarKey) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(key);
        id
    }

    pub fn key(&self, var: VarId) -> VarKey {
        self.vars[var.index()]
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn vars(&self) -> impl Iterator<Item = (VarId, VarKey)> + '_ {
        self.vars.iter().enumerate().map(|(i, k)| (VarId(i as u32), *k))
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn add_le(&mut self, group: ConstraintGroup, lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) {
        self.push(group, None, lhs.into() - rhs, Comparison::Le);
    }

    pub fn add_ge(&mut self, group: ConstraintGroup, lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) {
        self.push(group, None, lhs.into() - rhs, Comparison::Ge);
    }

    pub fn add_eq(&mut self, group: ConstraintGroup, lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) {
        self.push(group, None, lhs.into() - rhs, Comparison::Eq);
    }

    /// `literal => lhs cmp rhs`, left to the solver to enforce natively.
    pub fn add_enforced(
        &mut self,
        group: ConstraintGroup,
        literal: VarId,
        lhs: impl Into<LinearExpr>,
        cmp: Comparison,
        rhs: impl Into<LinearExpr>,
    ) {
        self.push(group, Some(literal), lhs.into() - rhs, cmp);
    }

    pub fn maximize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = expr.into();
    }

    fn push(&mut self, group: ConstraintGroup, enforcement: Option<VarId>, expr: LinearExpr, cmp: Comparison) {
        let rhs = -expr.constant;
        let terms = expr.merged().collect();
        self.constraints.push(LinearConstraint {
            group,
            terms,
            cmp,
            rhs,
            enforcement,
        });
    }

    /// Returns the first constraint the assignment breaks, if any.
    pub fn check(&self, assignment: &RawAssignment) -> Result<(), Violation> {
        for (index, c) in self.constraints.iter().enumerate() {
            if !c.is_satisfied(assignment) {
                return Err(Violation {
                    index,
                    group: c.group,
                    lhs: c.lhs_value(assignment),
                    cmp: c.cmp,
                    rhs: c.rhs,
                });
            }
        }
        Ok(())
    }

    pub fn objective_value(&self, assignment: &RawAssignment) -> i64 {
        self.objective.value(assignment)
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats::default();
        for key in &self.vars {
            match key {
                VarKey::Selection { .. } => stats.selection_vars += 1,
                VarKey::Attendance { .. } => stats.attendance_vars += 1,
                VarKey::Placement { .. } => stats.placement_vars += 1,
            }
        }
        for c in &self.constraints {
            *stats.constraints.entry(c.group).or_insert(0) += 1;
            if c.enforcement.is_some() {
                stats.enforced_constraints += 1;
            }
        }
        stats
    }
}
