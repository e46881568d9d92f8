//! End-to-end study sessions through [`StudySession`].

use chrono::{DateTime, Duration, Utc};
use studyroom_core::session::day_for;
use studyroom_core::{
    Config, Database, Event, SessionOutcome, StatsStore, StudySession, TimerMode, TimerState, TimerTarget, View,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-19T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn session() -> StudySession {
    StudySession::open(Database::open_memory().unwrap(), Config::default()).unwrap()
}

#[test]
fn count_up_session_credits_task_history_and_breaks() {
    let mut s = session();
    let maths = s.create_task("Maths").unwrap();
    let target = TimerTarget::task(maths.clone());

    s.start_timer(target, t0()).unwrap().unwrap();
    assert_eq!(s.view(), View::Timer);

    s.pause(t0() + Duration::seconds(600)).unwrap().unwrap();
    s.resume(t0() + Duration::seconds(900)).unwrap().unwrap();
    let report = s
        .finish(SessionOutcome::Success, t0() + Duration::seconds(1500))
        .unwrap()
        .unwrap();

    // 600s before the break, 600s after it.
    assert_eq!(report.completion.elapsed_secs, 1200);
    assert_eq!(report.completion.breaks_taken, 1);
    assert_eq!(report.target_name.as_deref(), Some("Maths"));
    assert!(report.export_error.is_none());

    assert_eq!(s.tasks().get(&maths).unwrap().time, 1200);
    assert_eq!(s.history().get(&day_for(t0()), "Maths"), 1200);
    assert_eq!(s.breaks_taken(), 1);
    assert_eq!(s.view(), View::Home);
    assert_eq!(s.engine().state(), TimerState::Idle);

    let stats = s.stats();
    assert_eq!(stats.total_time_studied, 1200);
    assert_eq!(stats.breaks_taken, 1);
}

#[test]
fn countdown_completes_on_tick_with_full_length() {
    let mut s = session();
    let essay = s.create_task("Essay").unwrap();
    s.start_timer_with(TimerTarget::task(essay.clone()), TimerMode::CountDown, Some(300), t0())
        .unwrap()
        .unwrap();

    assert!(s.tick(t0() + Duration::seconds(299)).unwrap().is_none());
    let report = s.tick(t0() + Duration::seconds(320)).unwrap().unwrap();
    assert_eq!(report.completion.elapsed_secs, 300);
    assert_eq!(report.completion.outcome, SessionOutcome::Success);
    assert_eq!(s.tasks().get(&essay).unwrap().time, 300);

    // Nothing left to complete.
    assert!(s.tick(t0() + Duration::seconds(400)).unwrap().is_none());
}

#[test]
fn deferred_session_is_still_credited() {
    let mut s = session();
    let reading = s.create_task("Reading").unwrap();
    s.start_timer(TimerTarget::task(reading.clone()), t0()).unwrap();
    let report = s
        .finish(SessionOutcome::Deferred, t0() + Duration::seconds(90))
        .unwrap()
        .unwrap();
    assert_eq!(report.completion.outcome, SessionOutcome::Deferred);
    assert_eq!(s.tasks().get(&reading).unwrap().time, 90);
}

#[test]
fn subtask_session_credits_subtask_only() {
    let mut s = session();
    let maths = s.create_task("Maths").unwrap();
    let algebra = s.create_subtask(&maths, "Algebra").unwrap().unwrap();

    s.start_timer(TimerTarget::subtask(maths.clone(), algebra.clone()), t0())
        .unwrap()
        .unwrap();
    let report = s
        .finish(SessionOutcome::Success, t0() + Duration::seconds(60))
        .unwrap()
        .unwrap();

    assert_eq!(report.target_name.as_deref(), Some("Algebra"));
    let task = s.tasks().get(&maths).unwrap();
    assert_eq!(task.time, 0);
    assert_eq!(task.subtasks[0].time, 60);
    assert_eq!(task.total_time(), 60);
    assert_eq!(s.history().get(&day_for(t0()), "Algebra"), 60);
}

#[test]
fn deleting_the_timed_task_cancels_the_session() {
    let mut s = session();
    let maths = s.create_task("Maths").unwrap();
    s.start_timer(TimerTarget::task(maths.clone()), t0()).unwrap();

    assert!(s.delete_task(&maths, t0() + Duration::seconds(30)).unwrap());
    assert_eq!(s.engine().state(), TimerState::Idle);
    assert!(s.history().is_empty());
    assert!(s.database().list_sessions(10).unwrap().is_empty());
}

#[test]
fn navigating_away_discards_active_session() {
    let mut s = session();
    let maths = s.create_task("Maths").unwrap();
    s.start_timer(TimerTarget::task(maths.clone()), t0()).unwrap();

    let cancelled = s.navigate(View::Statistics, t0() + Duration::seconds(45)).unwrap();
    assert!(matches!(cancelled, Some(Event::TimerCancelled { elapsed_secs: 45, .. })));
    assert_eq!(s.view(), View::Statistics);
    assert_eq!(s.tasks().get(&maths).unwrap().time, 0);

    // Moving to the timer page itself never cancels.
    s.start_timer(TimerTarget::task(maths), t0() + Duration::seconds(60)).unwrap();
    assert!(s.navigate(View::Timer, t0() + Duration::seconds(61)).unwrap().is_none());
    assert!(s.engine().is_active());
}

#[test]
fn follow_up_fires_once_after_dialog_closes() {
    let mut s = session();
    assert_eq!(s.modal_closed().unwrap(), None);

    s.request_follow_up().unwrap();
    assert!(s.pending_follow_up());
    assert_eq!(s.modal_closed().unwrap(), Some(View::Motivation));
    assert_eq!(s.view(), View::Motivation);
    assert_eq!(s.modal_closed().unwrap(), None);
}

#[test]
fn manual_adjustment_moves_task_and_history() {
    let mut s = session();
    let maths = s.create_task("Maths").unwrap();
    let target = TimerTarget::task(maths.clone());

    assert_eq!(s.adjust_task_time(&target, 300, t0()).unwrap(), Some(300));
    assert_eq!(s.adjust_task_time(&target, -500, t0()).unwrap(), Some(0));
    assert_eq!(s.history().get(&day_for(t0()), "Maths"), 0);

    let gone = TimerTarget::task("missing");
    assert_eq!(s.adjust_task_time(&gone, 60, t0()).unwrap(), None);
}

#[test]
fn completion_exports_to_local_statistics() {
    let mut config = Config::default();
    config.analytics.user_id = "alice".to_string();
    let mut s = StudySession::open(Database::open_memory().unwrap(), config).unwrap();
    let maths = s.create_task("Maths").unwrap();

    s.start_timer(TimerTarget::task(maths.clone()), t0()).unwrap();
    s.finish(SessionOutcome::Success, t0() + Duration::seconds(3600)).unwrap();
    s.start_timer(TimerTarget::task(maths), t0() + Duration::seconds(4000)).unwrap();
    let report = s
        .finish(SessionOutcome::Success, t0() + Duration::seconds(4600))
        .unwrap()
        .unwrap();

    assert_eq!(report.record.total_time_studied, "01:10:00");
    let db = s.database();
    assert_eq!(db.fetch("alice").unwrap().unwrap().secs(), 4200);
    assert_eq!(db.fetch("default").unwrap().unwrap().secs(), 4200);
    assert_eq!(db.list_sessions(10).unwrap().len(), 2);
}
