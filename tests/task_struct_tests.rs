use schedule_forecast::{DependencySpec, Task, TaskError, TaskId, Variant};
use std::collections::BTreeSet;

#[test]
fn new_task_is_unscheduled_with_nominal_variant_only() {
    let task = Task::new("7", " 1, 3 ,", 2.5).unwrap();
    assert_eq!(task.id(), &TaskId::from("7"));
    assert_eq!(task.raw_dependencies(), " 1, 3 ,");
    assert_eq!(
        task.dependencies(),
        &DependencySpec::Explicit(BTreeSet::from([TaskId::from("1"), TaskId::from("3")]))
    );
    assert!(task.has_dependencies());
    assert_eq!(task.duration(), 2.5);
    assert_eq!(task.range(), None);
    assert_eq!(task.variants().collect::<Vec<_>>(), vec![Variant::Nominal]);
    assert!(!task.is_scheduled());
    assert_eq!(task.start(), None);
    assert_eq!(task.end(), None);
}

#[test]
fn range_adds_min_and_max_variants() {
    let task = Task::from_parts("1", "", 2.0, Some(1.0), Some(3.0)).unwrap();
    assert_eq!(task.min_duration(), Some(1.0));
    assert_eq!(task.max_duration(), Some(3.0));
    assert_eq!(task.effort(Variant::Max), Some(3.0));
    assert_eq!(
        task.variants().collect::<Vec<_>>(),
        vec![Variant::Nominal, Variant::Min, Variant::Max]
    );
}

#[test]
fn one_sided_range_is_rejected() {
    assert_eq!(
        Task::from_parts("1", "", 2.0, None, Some(3.0)),
        Err(TaskError::InconsistentDurationVariant {
            task: TaskId::from("1"),
            min: None,
            max: Some(3.0),
        })
    );
}

#[test]
fn negative_durations_are_rejected() {
    assert_eq!(
        Task::new("1", "", -1.0),
        Err(TaskError::InvalidDuration {
            task: TaskId::from("1"),
            variant: Variant::Nominal,
            value: -1.0,
        })
    );
    assert!(matches!(
        Task::from_parts("1", "", 1.0, Some(f64::NAN), Some(2.0)),
        Err(TaskError::InvalidDuration {
            variant: Variant::Min,
            ..
        })
    ));
}

#[test]
fn empty_and_blank_dependency_lists_mean_root() {
    for raw in ["", "  ", ",", " , "] {
        let task = Task::new("1", raw, 1.0).unwrap();
        assert!(!task.has_dependencies(), "{raw:?}");
    }
}

#[test]
fn all_token_parses_on_its_own_only() {
    assert_eq!("all".parse::<DependencySpec>(), Ok(DependencySpec::AllOthers));
    assert_eq!(" all ".parse::<DependencySpec>(), Ok(DependencySpec::AllOthers));
    assert!(matches!(
        Task::new("3", "all,1", 1.0),
        Err(TaskError::MalformedDependencies { .. })
    ));
}

#[test]
fn task_ids_order_numerically_then_textually() {
    let mut ids: Vec<TaskId> = ["b", "10", "9", "a", "010"]
        .into_iter()
        .map(TaskId::from)
        .collect();
    ids.sort();
    let sorted: Vec<&str> = ids.iter().map(TaskId::as_str).collect();
    assert_eq!(sorted, vec!["9", "010", "10", "a", "b"]);
}
