use chrono::NaiveDate;
use gymstats::plotting::{ChartStyle, FixedAdvance, TransformDelta};
use gymstats::utils::SeriesPoint;
use gymstats::{ChartLayout, NamedSeries, Selector, Session, Store, ViewSnapshot, ViewState};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn points(series: &NamedSeries) -> Vec<(NaiveDate, i64)> {
    series.points.iter().map(|p| (p.date, p.value)).collect()
}

fn january_session(store: Store) -> Session {
    Session::new(store, ViewState::new(date("2024-01-15")))
}

async fn squat_session() -> Session {
    let session = january_session(Store::memory().unwrap());
    session
        .create_exercise("Squat", &names(&["Weight", "Reps"]))
        .await
        .unwrap();
    session
        .log_workout(date("2024-01-01"), &fields(&[("Weight", "100"), ("Reps", "5")]))
        .await
        .unwrap()
        .unwrap();
    session
}

fn series(session: &Session) -> Vec<NamedSeries> {
    session.update_state(|state| state.series()).unwrap()
}

#[tokio::test]
async fn test_by_tracker_scenario() {
    let session = squat_session().await;
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.selected_exercise.as_deref(), Some("Squat"));
    assert_eq!(snapshot.selected_series, Some(Selector::ByTracker));

    assert_eq!(
        series(&session),
        vec![
            NamedSeries {
                name: "Weight".to_string(),
                points: vec![SeriesPoint { date: date("2024-01-01"), value: 100 }],
            },
            NamedSeries {
                name: "Reps".to_string(),
                points: vec![SeriesPoint { date: date("2024-01-01"), value: 5 }],
            },
        ]
    );
}

#[tokio::test]
async fn test_sum_scenario() {
    let session = squat_session().await;
    session.select_series(Selector::Sum).unwrap();

    let result = series(&session);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Additive");
    assert_eq!(points(&result[0]), vec![(date("2024-01-01"), 105)]);

    session.select_series(Selector::Product).unwrap();
    assert_eq!(points(&series(&session)[0]), vec![(date("2024-01-01"), 500)]);
}

#[tokio::test]
async fn test_delete_exercise_scenario() {
    let session = squat_session().await;
    session.delete_exercise("Squat").await.unwrap();

    let store = session.store();
    assert!(!store
        .get_all_exercise_names()
        .await
        .unwrap()
        .contains(&"Squat".to_string()));
    assert!(store
        .get_workouts_in_range("Squat", date("2024-01-01"), date("2024-02-01"))
        .await
        .unwrap()
        .is_empty());
    assert!(session.snapshot().unwrap().workouts.is_empty());
    assert!(series(&session).is_empty());
}

#[tokio::test]
async fn test_same_day_workouts_stay_separate() {
    let store = Store::memory().unwrap();
    let exercise = store.insert_exercise("Row").await.unwrap();
    store.insert_tracker(exercise, "X").await.unwrap();
    store.insert_tracker(exercise, "Y").await.unwrap();

    let first = store.insert_workout(exercise, date("2024-01-05")).await.unwrap();
    store.insert_workout_value(first, "X", 10, 1).await.unwrap();
    store.insert_workout_value(first, "Y", 20, 1).await.unwrap();
    let second = store.insert_workout(exercise, date("2024-01-05")).await.unwrap();
    store.insert_workout_value(second, "X", 30, 2).await.unwrap();

    let session = january_session(store);
    session.select_exercise("Row").await.unwrap();

    let result = series(&session);
    let x = result.iter().find(|s| s.name == "X").unwrap();
    // same date, newer workout first
    assert_eq!(
        points(x),
        vec![(date("2024-01-05"), 30), (date("2024-01-05"), 10)]
    );
    let y = result.iter().find(|s| s.name == "Y").unwrap();
    assert_eq!(points(y), vec![(date("2024-01-05"), 20)]);
}

#[tokio::test]
async fn test_stale_fetch_is_ignored() {
    let session = squat_session().await;
    session.create_exercise("Row", &names(&["Reps"])).await.unwrap();
    session
        .log_workout(date("2024-01-03"), &fields(&[("Reps", "12")]))
        .await
        .unwrap();

    // a fetch for Squat is issued, then the user switches to Row before it lands
    session.update_state(|state| state.select_exercise("Squat")).unwrap();
    let squat_ticket = session.begin_fetch().unwrap();
    assert!(session.select_exercise("Row").await.unwrap());

    let squat_result = session.fetch(&squat_ticket).await.unwrap();
    assert!(!squat_result.entries.is_empty());
    assert!(!session.apply(&squat_ticket, squat_result).unwrap());

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.selected_exercise.as_deref(), Some("Row"));
    assert_eq!(snapshot.tracker_names, vec!["Reps"]);
    assert_eq!(points(&series(&session)[0]), vec![(date("2024-01-03"), 12)]);
}

#[tokio::test]
async fn test_month_navigation() {
    let session = squat_session().await;
    session
        .log_workout(date("2024-02-10"), &fields(&[("Weight", "110"), ("Reps", "3")]))
        .await
        .unwrap();
    assert_eq!(series(&session)[0].points.len(), 1);

    session.shift_month(1).await.unwrap();
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.date, date("2024-02-01"));
    assert_eq!(points(&series(&session)[0]), vec![(date("2024-02-10"), 110)]);

    session.shift_month(-2).await.unwrap();
    assert!(series(&session).is_empty());
}

#[tokio::test]
async fn test_rejected_workout_writes_nothing() {
    let session = squat_session().await;
    let err = session
        .log_workout(date("2024-01-02"), &fields(&[("Weight", "100"), ("Reps", "")]))
        .await
        .unwrap_err();
    assert!(matches!(err, gymstats::Error::Validation(_)));
    assert_eq!(session.snapshot().unwrap().workouts.len(), 1);
}

#[tokio::test]
async fn test_edit_and_delete_workout() {
    let session = squat_session().await;
    let mut values = session.snapshot().unwrap().workout_values_per_workout.remove(0);
    values[0].value = gymstats::analysis::edited_value("120", values[0].value);
    values[1].value = gymstats::analysis::edited_value("oops", values[1].value);
    assert_eq!(session.update_values(&values).await.unwrap(), 2);

    assert_eq!(points(&series(&session)[0]), vec![(date("2024-01-01"), 120)]);
    assert_eq!(points(&series(&session)[1]), vec![(date("2024-01-01"), 5)]);

    let workout_id = session.snapshot().unwrap().workouts[0].id;
    session.delete_workout(workout_id).await.unwrap();
    assert!(session.snapshot().unwrap().workouts.is_empty());
}

#[tokio::test]
async fn test_background_refresh_and_subscribers() {
    let store = Store::memory().unwrap();
    let exercise = store.insert_exercise("Curl").await.unwrap();
    store.insert_tracker(exercise, "Reps").await.unwrap();

    let session = january_session(store);
    let mut rx = session.subscribe().unwrap();
    assert!(session.spawn_refresh().await.unwrap());

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.exercise_names, vec!["Curl"]);
    assert_eq!(seen.selected_exercise.as_deref(), Some("Curl"));
    assert_eq!(seen.tracker_names, vec!["Reps"]);

    session.clear_all_data().await.unwrap();
    assert!(session.snapshot().unwrap().exercise_names.is_empty());
}

#[tokio::test]
async fn test_gestures_and_chart() {
    let session = squat_session().await;
    let layout = ChartLayout::new(500.0, 200.0, 20.0);
    let measure = FixedAdvance(8.0);

    let before = session.chart(&layout, &measure).unwrap().unwrap();
    assert_eq!(before.series[0].points[0].x, 20.0);

    session.on_transform(TransformDelta::new(30.0, 2.0)).unwrap();
    let after = session.chart(&layout, &measure).unwrap().unwrap();
    assert_eq!(after.series[0].points[0].x, 50.0);
    assert_eq!(session.snapshot().unwrap().zoom_scale, 2.0);

    session.reset_view().unwrap();
    assert_eq!(session.chart(&layout, &measure).unwrap().unwrap(), before);

    session.delete_exercise("Squat").await.unwrap();
    assert_eq!(session.chart(&layout, &measure).unwrap(), None);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("workouts.db");
    let state_path = temp_dir.path().join("view.json");

    let expected = {
        let session = january_session(Store::open(&db_path).unwrap());
        session
            .create_exercise("Squat", &names(&["Weight"]))
            .await
            .unwrap();
        session
            .log_workout(date("2024-01-09"), &fields(&[("Weight", "80")]))
            .await
            .unwrap();
        session.on_transform(TransformDelta::new(-7.25, 1.3)).unwrap();
        session.snapshot().unwrap().save(&state_path).unwrap();
        series(&session)
    };

    let restored = ViewSnapshot::load(&state_path).unwrap();
    assert_eq!(restored.zoom_center_x, -7.25);
    let session = Session::new(Store::open(&db_path).unwrap(), ViewState::restore(restored));
    assert_eq!(series(&session), expected);

    assert!(session.refresh().await.unwrap());
    assert_eq!(series(&session), expected);
}

#[tokio::test]
async fn test_failed_refresh_keeps_the_view() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("workouts.db");
    let session = january_session(Store::open(&db_path).unwrap());
    session.create_exercise("Row", &names(&["Reps"])).await.unwrap();
    session
        .create_exercise("Squat", &names(&["Weight"]))
        .await
        .unwrap();
    session
        .log_workout(date("2024-01-09"), &fields(&[("Weight", "80")]))
        .await
        .unwrap();
    let before = session.snapshot().unwrap();
    assert_eq!(before.workouts.len(), 1);

    // break the range query from outside the store
    let side = rusqlite::Connection::open(&db_path).unwrap();
    side.execute_batch("DROP TABLE workout_values;").unwrap();

    assert!(session.refresh().await.is_err());
    assert_eq!(session.snapshot().unwrap(), before);

    // the delete lands even though the view cannot reload afterwards
    session.delete_workout(before.workouts[0].id).await.unwrap();
    assert_eq!(session.snapshot().unwrap(), before);
    assert!(session
        .store()
        .get_exercise_id_by_name("Squat")
        .await
        .unwrap()
        .is_some());

    // switching exercise must not leave Squat's workouts on screen
    assert!(session.select_exercise("Row").await.is_err());
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.selected_exercise.as_deref(), Some("Row"));
    assert!(snapshot.workouts.is_empty());
    assert!(snapshot.tracker_names.is_empty());
    assert!(series(&session).is_empty());
}

#[tokio::test]
async fn test_svg_render_is_cached() {
    let session = squat_session().await.with_render_cache(4);
    let layout = ChartLayout::new(500.0, 200.0, 20.0);
    let measure = FixedAdvance(8.0);
    let style = ChartStyle::default();

    let first = session
        .render_svg(&layout, &measure, false, style)
        .await
        .unwrap()
        .unwrap();
    assert!(first.contains("<svg"));
    let again = session
        .render_svg(&layout, &measure, false, style)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, again);
    assert_eq!(session.render_cache().len().await, 1);

    session.on_transform(TransformDelta::pan(40.0)).unwrap();
    session
        .render_svg(&layout, &measure, true, style)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.render_cache().len().await, 2);

    session.delete_exercise("Squat").await.unwrap();
    let empty = session.render_svg(&layout, &measure, false, style).await.unwrap();
    assert_eq!(empty, None);
}
