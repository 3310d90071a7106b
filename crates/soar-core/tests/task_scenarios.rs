//! End-to-end flights through ordered tasks.

use soar_core::{
    AircraftState, GeoPoint, GlidePolar, LegalPointType, OrderedTask, OrderedTaskBehaviour,
    TaskBehaviour, TaskEditError, TaskEvent, TaskFactory, TaskFactoryKind, Waypoint,
};

fn waypoint(name: &str, lat: f64, lon: f64) -> Waypoint {
    Waypoint::new(name, GeoPoint::new(lat, lon), 0.0)
}

/// Start 1 km cylinder, 500 m turnpoint cylinder, 1 km finish cylinder along the equator.
fn racing_task() -> OrderedTask {
    let behaviour = TaskBehaviour::default();
    let factory = TaskFactory::new(TaskFactoryKind::Racing);
    let defaults = behaviour.sector_defaults.clone();
    let mut task = OrderedTask::new(behaviour);
    task.set_name("three cylinders");
    task.append(factory.create_point(LegalPointType::StartCylinder, waypoint("start", 0.0, 0.0), &defaults))
        .unwrap();
    task.append(factory.create_point(LegalPointType::AstCylinder, waypoint("tp", 0.0, 0.1), &defaults))
        .unwrap();
    task.append(factory.create_point(LegalPointType::FinishCylinder, waypoint("finish", 0.0, 0.2), &defaults))
        .unwrap();
    task
}

fn aat_task() -> OrderedTask {
    aat_task_with_area(0.0)
}

fn aat_task_with_area(area_lat: f64) -> OrderedTask {
    let behaviour = TaskBehaviour::default();
    let factory = TaskFactory::new(TaskFactoryKind::Aat);
    let defaults = behaviour.sector_defaults.clone();
    let mut task = OrderedTask::with_factory(TaskFactoryKind::Aat, behaviour);
    task.append(factory.create_point(LegalPointType::StartCylinder, waypoint("start", 0.0, 0.0), &defaults))
        .unwrap();
    task.append(factory.create_point(LegalPointType::AatCylinder, waypoint("area", area_lat, 0.2), &defaults))
        .unwrap();
    task.append(factory.create_point(LegalPointType::FinishCylinder, waypoint("finish", 0.0, 0.4), &defaults))
        .unwrap();
    task
}

/// Fixes along the equator every 0.001 degrees (about 111 m), 5 s apart.
fn track(from_milli: i32, to_milli: i32, t0: f64) -> Vec<AircraftState> {
    let step = if to_milli >= from_milli { 1 } else { -1 };
    let mut fixes = Vec::new();
    let mut i = from_milli;
    let mut time = t0;
    loop {
        fixes.push(AircraftState::at(GeoPoint::new(0.0, i as f64 / 1_000.0), 1_500.0, time));
        if i == to_milli {
            break;
        }
        i += step;
        time += 5.0;
    }
    fixes
}

fn fly(task: &mut OrderedTask, fixes: &[AircraftState], polar: &GlidePolar) -> (Vec<TaskEvent>, Vec<usize>) {
    let mut events = Vec::new();
    let mut actives = Vec::new();
    let mut last = fixes[0];
    for now in fixes {
        task.update(now, &last, polar);
        events.extend(task.drain_events());
        actives.push(task.active_index());
        last = *now;
    }
    (events, actives)
}

fn count(events: &[TaskEvent], event: TaskEvent) -> usize {
    events.iter().filter(|e| **e == event).count()
}

#[test]
fn test_three_cylinder_flight() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    let (events, actives) = fly(&mut task, &track(-20, 210, 36_000.0), &polar);

    assert_eq!(count(&events, TaskEvent::TaskStart), 1);
    assert_eq!(count(&events, TaskEvent::TaskFinish), 1);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 1);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(2)), 1);
    assert_eq!(count(&events, TaskEvent::Restart), 0);
    assert!(actives.windows(2).all(|w| w[0] <= w[1]));

    assert!(task.task_started(false));
    assert!(task.task_finished());
    assert_eq!(task.active_index(), 2);
    assert!(task.stats().task_finished);
    assert!(task.start_state().time < task.finish_state().time);
}

#[test]
fn test_start_is_scored_at_last_fix_inside() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    fly(&mut task, &track(-20, 20, 0.0), &polar);
    let start = task.start_state();
    assert!(task.points()[0].observation_zone().is_in_sector(&start.location));
    assert!((start.location.longitude - 0.008).abs() < 1e-9);
}

#[test]
fn test_repeated_tick_changes_nothing() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    let fixes = track(-20, 9, 0.0);
    fly(&mut task, &fixes, &polar);
    assert_eq!(task.active_index(), 1);

    let (now, last) = (fixes[fixes.len() - 1], fixes[fixes.len() - 2]);
    task.update(&now, &last, &polar);
    assert!(task.drain_events().is_empty());
    assert_eq!(task.active_index(), 1);
    assert!(task.task_started(false));
    assert!(!task.task_finished());
}

#[test]
fn test_restart_after_reentering_start() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    let mut fixes = track(-20, 20, 0.0);
    let t = fixes[fixes.len() - 1].time + 5.0;
    fixes.extend(track(19, 0, t));
    let t = fixes[fixes.len() - 1].time + 5.0;
    fixes.extend(track(1, 30, t));

    let (events, _) = fly(&mut task, &fixes, &polar);
    assert_eq!(count(&events, TaskEvent::Restart), 1);
    assert_eq!(count(&events, TaskEvent::TaskStart), 2);
    assert_eq!(task.active_index(), 1);
    // the later exit is the one that counts
    assert!(task.start_state().time > 200.0);
}

#[test]
fn test_ground_fixes_are_ignored() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    let fixes: Vec<AircraftState> = track(-20, 20, 0.0).into_iter().map(|s| s.on_ground()).collect();
    let (events, _) = fly(&mut task, &fixes, &polar);
    assert!(events.is_empty());
    assert!(!task.task_started(false));
}

#[test]
fn test_min_max_without_areas_equal_nominal() {
    let task = racing_task();
    let nominal = task.scan_distance_nominal();
    let expected = GeoPoint::new(0.0, 0.0).distance(&GeoPoint::new(0.0, 0.2));
    assert!((nominal - expected).abs() < 1.0);
    assert!((task.stats().distance_min - nominal).abs() < 1e-6);
    assert!((task.stats().distance_max - nominal).abs() < 1e-6);
}

#[test]
fn test_area_max_exceeds_min() {
    let task = aat_task_with_area(0.1);
    let stats = task.stats();
    assert!(stats.distance_max > stats.distance_nominal);
    assert!(stats.distance_min < stats.distance_nominal);
    assert!(stats.distance_max - stats.distance_min > 10_000.0);
}

#[test]
fn test_remaining_distance_shrinks_in_flight() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    let fixes = track(-20, 150, 0.0);
    let mut last = fixes[0];
    let mut previous = f64::MAX;
    for (i, now) in fixes.iter().enumerate() {
        task.update(now, &last, &polar);
        let remaining = task.stats().total.remaining.distance();
        // after the start every fix gets closer
        if i > 30 {
            assert!(remaining <= previous + 1.0);
        }
        previous = remaining;
        last = *now;
    }
    assert!(task.stats().total.travelled.distance() > 0.0);
    assert!(task.stats().distance_scored > 0.0);
}

#[test]
fn test_best_mc_depends_on_height() {
    let task = racing_task();
    let polar = GlidePolar::default();
    let high = AircraftState::at(GeoPoint::new(0.0, 0.01), 3_000.0, 0.0);
    let low = AircraftState::at(GeoPoint::new(0.0, 0.01), 400.0, 0.0);
    let best = task.calc_best_mc(&high, &polar);
    assert!(best.is_some_and(|mc| mc > 0.0));
    assert_eq!(task.calc_best_mc(&low, &polar), None);
    // more height to spare allows a steeper glide
    assert!(task.calc_required_glide(&high, &polar) > task.calc_required_glide(&low, &polar));
}

#[test]
fn test_min_target_grows_with_minimum_time() {
    let task = aat_task();
    let polar = GlidePolar::default();
    let aircraft = AircraftState::at(GeoPoint::new(0.0, 0.0), 1_500.0, 0.0);
    let ranges: Vec<f64> = [1.0, 3_600.0, 7_200.0, 10_800.0, 1.0e7]
        .iter()
        .map(|t| task.calc_min_target(&aircraft, &polar, *t))
        .collect();
    assert_eq!(ranges[0], 0.0);
    assert_eq!(ranges[4], 1.0);
    assert!(ranges.windows(2).all(|w| w[0] <= w[1] + 1e-6));
}

#[test]
fn test_update_idle_moves_area_target() {
    let mut task = aat_task();
    let polar = GlidePolar::default();
    let aircraft = AircraftState::at(GeoPoint::new(0.0, 0.0), 1_500.0, 0.0);
    let reference = task.points()[1].location();
    task.update_idle(&aircraft, &polar);
    let target = task.points()[1].location_remaining();
    // three hours at the reference targets is not enough task
    assert!(target.distance(&reference) > 100.0);
    assert!(target.distance(&reference) < 10_001.0);
}

#[test]
fn test_clone_and_commit() {
    let mut task = racing_task();
    let behaviour = TaskBehaviour::default();
    let mut edited = task.clone_with_behaviour(&behaviour);
    assert!(!task.commit(&edited));

    edited
        .relocate(1, waypoint("moved", 0.02, 0.1))
        .unwrap();
    assert!(task.commit(&edited));
    assert_eq!(task.points()[1].name(), "moved");
    assert!(!task.commit(&edited));
}

#[test]
fn test_clone_keeps_factory_and_zones() {
    let mut task = aat_task_with_area(0.1);
    let polar = GlidePolar::default();
    fly(&mut task, &track(-20, 30, 0.0), &polar);

    let copy = task.clone_with_behaviour(&TaskBehaviour::default());
    assert_eq!(copy.factory_kind(), TaskFactoryKind::Aat);
    assert_eq!(copy.factory_kind(), task.factory_kind());
    assert_eq!(copy.ordered_behaviour(), task.ordered_behaviour());
    assert_eq!(copy.len(), task.len());
    for (a, b) in copy.points().iter().zip(task.points()) {
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.name(), b.name());
        assert_eq!(a.observation_zone(), b.observation_zone());
        assert_eq!(a.observation_zone().shape(), b.observation_zone().shape());
    }
    // the copy carries no flight state
    assert!(task.task_started(false));
    assert!(!copy.task_started(false));
}

#[test]
fn test_insert_past_end_appends() {
    let mut task = racing_task();
    let factory = TaskFactory::new(TaskFactoryKind::Racing);
    let defaults = TaskBehaviour::default().sector_defaults;
    let tp = factory.create_point(LegalPointType::AstCylinder, waypoint("late", 0.0, 0.15), &defaults);
    // appending after the finish is refused, same as append
    assert_eq!(task.insert(tp.clone(), 10), Err(TaskEditError::FinishNotLast));
    task.insert(tp, 2).unwrap();
    assert_eq!(task.len(), 4);
    assert_eq!(task.points()[3].name(), "finish");
}

#[test]
fn test_rejected_insert_leaves_points_unchanged() {
    let mut task = racing_task();
    let factory = TaskFactory::new(TaskFactoryKind::Racing);
    let defaults = TaskBehaviour::default().sector_defaults;
    let before = task.points().to_vec();

    let start = factory.create_point(LegalPointType::StartLine, waypoint("second start", 0.0, 0.05), &defaults);
    assert_eq!(task.insert(start, 1), Err(TaskEditError::StartNotFirst));
    let area = factory.create_point(LegalPointType::AatCylinder, waypoint("area", 0.0, 0.05), &defaults);
    assert!(task.insert(area, 1).is_err());

    assert_eq!(task.len(), before.len());
    for (after, before) in task.points().iter().zip(&before) {
        assert!(after.equals(before));
        assert_eq!(after.name(), before.name());
        assert_eq!(after.observation_zone(), before.observation_zone());
    }
}

#[test]
fn test_visitor_walks_in_order() {
    let task = racing_task();
    let mut names = Vec::new();
    task.accept_task_point_visitor(&mut |p: &soar_core::OrderedTaskPoint| names.push(p.name().to_string()), false);
    assert_eq!(names, ["start", "tp", "finish"]);

    let mut reversed = Vec::new();
    task.accept_task_point_visitor(&mut |p: &soar_core::OrderedTaskPoint| reversed.push(p.name().to_string()), true);
    assert_eq!(reversed, ["finish", "tp", "start"]);
}

#[test]
fn test_summary_tracks_progress() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    fly(&mut task, &track(-20, 50, 0.0), &polar);
    let summary = task.summary();
    assert_eq!(summary.active, 1);
    assert!(summary.points[0].achieved);
    assert!(!summary.points[1].achieved);
    assert!(summary.p_remaining > 0.0 && summary.p_remaining < 1.0);
}

#[test]
fn test_manual_rewind_waits_for_new_start() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    fly(&mut task, &track(-20, 30, 0.0), &polar);
    assert_eq!(task.active_index(), 1);

    task.set_active_task_point(0);
    let (events, _) = fly(&mut task, &track(31, 32, 255.0), &polar);
    assert_eq!(task.active_index(), 0);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 0);

    // flying back through the start advances again
    let mut fixes = track(31, 0, 265.0);
    let t = fixes[fixes.len() - 1].time + 5.0;
    fixes.extend(track(1, 30, t));
    let (events, _) = fly(&mut task, &fixes, &polar);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 1);
    assert_eq!(task.active_index(), 1);
}

#[test]
fn test_armed_start_needs_exit_after_arming() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    task.set_ordered_behaviour(OrderedTaskBehaviour {
        start_requires_arm: true,
        ..task.ordered_behaviour().clone()
    });

    let (events, _) = fly(&mut task, &track(-20, 30, 0.0), &polar);
    assert_eq!(count(&events, TaskEvent::RequestArm(0)), 1);
    assert_eq!(task.active_index(), 0);

    task.advance_mut().set_armed(true);
    let (events, _) = fly(&mut task, &track(31, 40, 255.0), &polar);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 0);
    assert_eq!(task.active_index(), 0);

    let mut fixes = track(39, 0, 305.0);
    let t = fixes[fixes.len() - 1].time + 5.0;
    fixes.extend(track(1, 30, t));
    let (events, _) = fly(&mut task, &fixes, &polar);
    assert_eq!(count(&events, TaskEvent::RequestArm(0)), 0);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 1);
    assert_eq!(task.active_index(), 1);
    assert!(!task.advance().is_armed());
}

#[test]
fn test_area_requests_arm_once() {
    let mut task = aat_task();
    let polar = GlidePolar::default();
    let (events, _) = fly(&mut task, &track(-20, 320, 0.0), &polar);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 1);
    assert_eq!(count(&events, TaskEvent::RequestArm(1)), 1);
    assert_eq!(task.active_index(), 1);

    task.advance_mut().set_armed(true);
    let (events, _) = fly(&mut task, &track(321, 325, 1_705.0), &polar);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(2)), 1);
    assert_eq!(count(&events, TaskEvent::RequestArm(1)), 0);
    assert_eq!(task.active_index(), 2);
}

#[test]
fn test_last_optional_start_flown_through_wins() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    let factory = TaskFactory::new(TaskFactoryKind::Racing);
    let defaults = TaskBehaviour::default().sector_defaults;
    task.append_optional_start(factory.create_point(
        LegalPointType::StartCylinder,
        waypoint("alt", 0.0, 0.03),
        &defaults,
    ))
    .unwrap();

    let (events, _) = fly(&mut task, &track(-20, 50, 0.0), &polar);
    assert_eq!(task.points()[0].name(), "alt");
    assert_eq!(task.optional_starts()[0].name(), "start");
    assert_eq!(task.active_index(), 1);
    assert_eq!(count(&events, TaskEvent::ActiveAdvanced(1)), 1);
    // scored at the last fix inside the alternative start
    assert!((task.start_state().location.longitude - 0.038).abs() < 1e-9);
}

#[test]
fn test_incremental_rates_in_flight() {
    let mut task = racing_task();
    let polar = GlidePolar::default();
    fly(&mut task, &track(-20, 150, 0.0), &polar);

    let total = &task.stats().total;
    // about 111 m every 5 s
    let speed = total.remaining.speed_incremental();
    assert!(speed > 18.0 && speed < 26.0, "incremental speed {}", speed);
    assert!(total.travelled.speed_incremental() > 0.0);
    // arrival height improves while flying level toward the finish
    assert!(total.vario > 0.0);
}
