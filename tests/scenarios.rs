//! End-to-end runs against CP-SAT.
#![cfg(feature = "cp-sat")]

use enroll_core::config::{AssignmentPolicy, EncodingStrategy, RankWeighting, SolverSettings};
use enroll_core::solve::CpSatSolver;
use enroll_core::{
    Course, PreferenceSet, ScheduleInput, ScheduleResult, SchedulerConfig, SolveStatus, Student, StudentId, run,
};
use std::collections::BTreeMap;

fn config(assignment: AssignmentPolicy) -> SchedulerConfig {
    SchedulerConfig {
        assignment,
        solver: SolverSettings {
            time_limit_secs: Some(60.0),
            workers: Some(4),
            random_seed: Some(7),
            ..SolverSettings::default()
        },
        ..SchedulerConfig::default()
    }
}

fn solve(input: &ScheduleInput, config: &SchedulerConfig) -> ScheduleResult {
    enroll_core::logging::init_test();
    run(input, config, &CpSatSolver::new()).unwrap()
}

/// Every student wants two of three courses, in rotating order.
fn rotating_input(students: usize, sections: usize, capacity: u32) -> ScheduleInput {
    let students = (0..students)
        .map(|i| {
            Student::new(
                format!("Student {i}"),
                vec![
                    PreferenceSet::new(["1", "2"]),
                    PreferenceSet::new(["2", "3"]),
                    PreferenceSet::new(["3", "1"]),
                ],
            )
        })
        .collect();
    let courses = ["1", "2", "3"]
        .into_iter()
        .map(|id| Course::new(id, sections, capacity))
        .collect();
    ScheduleInput::new(students, courses)
}

/// The invariants every returned schedule must satisfy, checked on the decoded result.
fn assert_schedule_invariants(input: &ScheduleInput, result: &ScheduleResult) {
    let mut seats: BTreeMap<(String, usize), usize> = BTreeMap::new();
    let mut placed_at: BTreeMap<(String, usize), usize> = BTreeMap::new();
    for placement in &result.placements {
        let previous = placed_at.insert((placement.course.0.clone(), placement.section), placement.time_block.0);
        assert!(previous.is_none(), "section placed twice: {placement:?}");
    }

    for student in &input.students {
        let schedule = result.schedule(&student.id).expect("every student has a schedule");
        let mut blocks: Vec<usize> = schedule.records.iter().map(|r| r.time_block.0).collect();
        blocks.dedup();
        assert_eq!(blocks.len(), schedule.records.len(), "double booked: {}", student.id);

        match schedule.granted_rank {
            Some(k) => {
                let granted = &student.preferences[k];
                assert_eq!(schedule.records.len(), granted.len());
                for record in &schedule.records {
                    assert!(granted.contains(&record.course));
                    assert_eq!(
                        placed_at.get(&(record.course.0.clone(), record.section)),
                        Some(&record.time_block.0)
                    );
                    *seats.entry((record.course.0.clone(), record.section)).or_insert(0) += 1;
                }
            }
            None => assert!(schedule.records.is_empty()),
        }
    }

    for ((course, _), taken) in seats {
        let capacity = input.courses.iter().find(|c| c.id.0 == course).unwrap().section_capacity;
        assert!(taken <= capacity as usize);
    }
}

#[test]
fn test_mirrored_preferences_both_satisfied() {
    let input = ScheduleInput::new(
        vec![
            Student::new("Alice", vec![PreferenceSet::new(["1"]), PreferenceSet::new(["2"])]),
            Student::new("Bob", vec![PreferenceSet::new(["2"]), PreferenceSet::new(["1"])]),
        ],
        vec![Course::new("1", 1, 2), Course::new("2", 1, 2)],
    );
    let result = solve(&input, &config(AssignmentPolicy::AtMostOne));
    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.objective_value, Some(2.0));
    for id in ["Alice", "Bob"] {
        assert_eq!(result.schedule(&StudentId::from(id)).unwrap().granted_rank, Some(0));
    }
    assert_schedule_invariants(&input, &result);
}

#[test]
fn test_single_seat_contested() {
    let input = ScheduleInput::new(
        vec![
            Student::new("Alice", vec![PreferenceSet::new(["1"])]),
            Student::new("Bob", vec![PreferenceSet::new(["1"])]),
        ],
        vec![Course::new("1", 1, 1)],
    );

    let result = solve(&input, &config(AssignmentPolicy::AtMostOne));
    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.assigned_count(), 1);
    assert_eq!(result.unassigned().len(), 1);
    assert_schedule_invariants(&input, &result);

    let result = solve(&input, &config(AssignmentPolicy::ExactlyOne));
    assert_eq!(result.status, SolveStatus::Infeasible);
    assert!(result.schedules.is_empty());
}

#[test]
fn test_demand_beyond_capacity_infeasible() {
    // 100 students need 200 seats; three courses offer 150.
    let input = rotating_input(100, 5, 10);
    let result = solve(&input, &config(AssignmentPolicy::ExactlyOne));
    assert_ne!(result.status, SolveStatus::Optimal);
    assert!(result.schedules.is_empty());
}

#[test]
fn test_demand_within_capacity_optimal() {
    let input = rotating_input(100, 5, 20);
    let result = solve(&input, &config(AssignmentPolicy::ExactlyOne));
    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.schedules.len(), 100);
    assert_eq!(result.assigned_count(), 100);
    assert_schedule_invariants(&input, &result);
}

#[test]
fn test_objective_monotone_in_capacity() {
    let mut previous = 0.0;
    for capacity in [1, 2, 4] {
        let input = rotating_input(8, 2, capacity);
        let result = solve(&input, &config(AssignmentPolicy::AtMostOne));
        assert_eq!(result.status, SolveStatus::Optimal);
        let objective = result.objective_value.unwrap();
        assert!(objective >= previous, "capacity {capacity}: {objective} < {previous}");
        assert_schedule_invariants(&input, &result);
        previous = objective;
    }
    assert_eq!(previous, 8.0);
}

#[test]
fn test_objective_monotone_in_single_course_capacity() {
    let mut previous = 0.0;
    for capacity in [1, 2, 4] {
        let mut input = rotating_input(8, 2, 2);
        input.courses[0].section_capacity = capacity;
        let result = solve(&input, &config(AssignmentPolicy::AtMostOne));
        assert_eq!(result.status, SolveStatus::Optimal);
        let objective = result.objective_value.unwrap();
        assert!(objective >= previous, "course 1 capacity {capacity}: {objective} < {previous}");
        assert_schedule_invariants(&input, &result);
        previous = objective;
    }
    // Course 2 offers only four seats, so at most four first choices fit.
    assert_eq!(previous, 4.0);
}

#[test]
fn test_encodings_agree() {
    let input = rotating_input(6, 2, 2);
    let mut objectives = Vec::new();
    for encoding in [EncodingStrategy::BigM, EncodingStrategy::Indicator] {
        let config = SchedulerConfig {
            encoding,
            weighting: RankWeighting::Ranked,
            ..config(AssignmentPolicy::AtMostOne)
        };
        let result = solve(&input, &config);
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_schedule_invariants(&input, &result);
        objectives.push(result.objective_value);
    }
    assert_eq!(objectives[0], objectives[1]);
}
