//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once a
//! second while a session is running. Every command takes the current time
//! explicitly so the host (or a test) decides what "now" is.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> (Finished) -> Idle
//! ```
//!
//! `Finished` is never observable: the completion event is returned from
//! `tick()` / `finish_*()` and the engine is already back in `Idle`.
//!
//! Elapsed time is always `accumulated + (now - started_at)`. Ticks only
//! observe it, so a host that could not tick for a while (suspended laptop,
//! backgrounded process) still reports the right value.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::default();
//! engine.start(target, TimerMode::CountUp, None, Utc::now());
//! // Once a second:
//! if let Some(event) = engine.tick(Utc::now()) { /* countdown expired */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::messages;
use crate::events::{Event, SessionCompletion};
use crate::task::{apply_delta, TimerTarget};

/// Countdown length used until the user picks one (10 minutes).
pub const DEFAULT_COUNTDOWN_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Open-ended stopwatch.
    #[default]
    CountUp,
    /// Fixed duration that completes on its own.
    CountDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    /// Task finished (or countdown ran out).
    Success,
    /// "I'll come back to this later": time is still credited.
    Deferred,
}

/// The single in-flight timing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActiveSession {
    target: TimerTarget,
    /// Time folded in by pauses and adjustments, in milliseconds.
    accumulated_ms: u64,
    /// Set while running; cleared on pause.
    started_at: Option<DateTime<Utc>>,
    /// Countdown length for this session in milliseconds (count-down only).
    duration_ms: u64,
    breaks_taken: u64,
    break_message: Option<String>,
}

impl ActiveSession {
    fn running_ms(&self, now: DateTime<Utc>) -> u64 {
        self.started_at
            .map(|start| (now - start).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }

    fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        self.accumulated_ms.saturating_add(self.running_ms(now))
    }

    /// Fold the running delta into `accumulated_ms` and stop the clock.
    fn fold(&mut self, now: DateTime<Utc>) {
        self.accumulated_ms = self.elapsed_ms(now);
        self.started_at = None;
    }
}

/// Core timer engine.
///
/// Holds at most one session, so at most one session can be running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    mode: TimerMode,
    /// Configured countdown length, editable while idle.
    countdown_secs: u64,
    state: TimerState,
    #[serde(default)]
    session: Option<ActiveSession>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerMode::CountUp, DEFAULT_COUNTDOWN_SECS)
    }
}

impl TimerEngine {
    pub fn new(mode: TimerMode, countdown_secs: u64) -> Self {
        Self {
            mode,
            countdown_secs,
            state: TimerState::Idle,
            session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn countdown_secs(&self) -> u64 {
        self.countdown_secs
    }

    pub fn target(&self) -> Option<&TimerTarget> {
        self.session.as_ref().map(|s| &s.target)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn breaks_taken(&self) -> u64 {
        self.session.as_ref().map(|s| s.breaks_taken).unwrap_or(0)
    }

    pub fn break_message(&self) -> Option<&str> {
        self.session.as_ref()?.break_message.as_deref()
    }

    /// Elapsed whole seconds of the current session (capped at the
    /// countdown length in count-down mode).
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match &self.session {
            Some(session) => {
                let mut elapsed = session.elapsed_ms(now);
                if self.mode == TimerMode::CountDown {
                    elapsed = elapsed.min(session.duration_ms);
                }
                elapsed / 1000
            }
            None => 0,
        }
    }

    /// Remaining whole seconds, count-down mode only.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        if self.mode != TimerMode::CountDown {
            return None;
        }
        Some(match &self.session {
            Some(session) => {
                let remaining_ms = session.duration_ms.saturating_sub(session.elapsed_ms(now));
                remaining_ms.div_ceil(1000)
            }
            None => self.countdown_secs,
        })
    }

    /// The value a clock face shows: elapsed (count-up) or remaining
    /// (count-down).
    pub fn display_secs(&self, now: DateTime<Utc>) -> u64 {
        self.remaining_secs(now)
            .unwrap_or_else(|| self.elapsed_secs(now))
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            state: self.state,
            mode: self.mode,
            target: self.target().cloned(),
            elapsed_secs: self.elapsed_secs(now),
            remaining_secs: self.remaining_secs(now),
            countdown_secs: self.countdown_secs,
            breaks_taken: self.breaks_taken(),
            break_message: if self.state == TimerState::Paused {
                self.break_message().map(str::to_string)
            } else {
                None
            },
            at: now,
        }
    }

    // ── Configuration (idle only) ────────────────────────────────────

    pub fn set_mode(&mut self, mode: TimerMode) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn set_countdown_minutes(&mut self, minutes: u64) -> bool {
        if self.state != TimerState::Idle {
            return false;
        }
        self.countdown_secs = minutes.saturating_mul(60);
        true
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. Only valid from `Idle`.
    pub fn start(
        &mut self,
        target: TimerTarget,
        mode: TimerMode,
        countdown_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if self.state != TimerState::Idle {
            return None;
        }
        self.mode = mode;
        if let Some(secs) = countdown_secs {
            self.countdown_secs = secs;
        }
        self.session = Some(ActiveSession {
            target: target.clone(),
            accumulated_ms: 0,
            started_at: Some(now),
            duration_ms: self.countdown_secs.saturating_mul(1000),
            breaks_taken: 0,
            break_message: None,
        });
        self.state = TimerState::Running;
        tracing::debug!(timer_target = %target, ?mode, "timer started");
        Some(Event::TimerStarted {
            target,
            mode,
            countdown_secs: (mode == TimerMode::CountDown).then_some(self.countdown_secs),
            at: now,
        })
    }

    /// Take a break. Only valid from `Running`.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_mut()?;
        session.fold(now);
        session.breaks_taken += 1;
        let message = messages::random_break_message().to_string();
        session.break_message = Some(message.clone());
        let breaks_taken = session.breaks_taken;
        self.state = TimerState::Paused;
        tracing::debug!(breaks_taken, "timer paused");
        Some(Event::TimerPaused {
            elapsed_secs: self.elapsed_secs(now),
            breaks_taken,
            break_message: message,
            at: now,
        })
    }

    /// Only valid from `Paused`.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        let session = self.session.as_mut()?;
        session.started_at = Some(now);
        self.state = TimerState::Running;
        tracing::debug!("timer resumed");
        Some(Event::TimerResumed {
            elapsed_secs: self.elapsed_secs(now),
            at: now,
        })
    }

    /// Call once a second while running. Returns the completion event when a
    /// countdown runs out; count-up sessions never complete on their own.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != TimerState::Running || self.mode != TimerMode::CountDown {
            return None;
        }
        let session = self.session.as_ref()?;
        if session.elapsed_ms(now) < session.duration_ms {
            return None;
        }
        let elapsed_secs = session.duration_ms / 1000;
        self.complete(SessionOutcome::Success, elapsed_secs, now)
    }

    /// Manual ± adjustment of the displayed quantity, clamped at 0.
    ///
    /// A running session is folded into `Paused` first so a tick cannot
    /// overwrite the adjustment. In count-down mode the displayed quantity is
    /// the remaining time; raising it past the session length extends the
    /// session. While idle, only the countdown length can be adjusted.
    pub fn adjust(&mut self, delta_secs: i64, now: DateTime<Utc>) -> Option<Event> {
        if delta_secs == 0 {
            return None;
        }
        match self.state {
            TimerState::Idle => {
                if self.mode != TimerMode::CountDown {
                    return None;
                }
                self.countdown_secs = apply_delta(self.countdown_secs, delta_secs);
            }
            TimerState::Running | TimerState::Paused => {
                let session = self.session.as_mut()?;
                if self.state == TimerState::Running {
                    session.fold(now);
                    self.state = TimerState::Paused;
                }
                let delta_ms = delta_secs.saturating_mul(1000);
                match self.mode {
                    TimerMode::CountUp => {
                        session.accumulated_ms = apply_delta(session.accumulated_ms, delta_ms);
                    }
                    TimerMode::CountDown => {
                        let remaining = session.duration_ms.saturating_sub(session.accumulated_ms);
                        let remaining = apply_delta(remaining, delta_ms);
                        if remaining > session.duration_ms {
                            session.duration_ms = remaining;
                            session.accumulated_ms = 0;
                        } else {
                            session.accumulated_ms = session.duration_ms - remaining;
                        }
                    }
                }
            }
            TimerState::Finished => return None,
        }
        tracing::debug!(delta_secs, "timer adjusted");
        Some(Event::TimerAdjusted {
            delta_secs,
            display_secs: self.display_secs(now),
            at: now,
        })
    }

    pub fn finish_success(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.finish(SessionOutcome::Success, now)
    }

    pub fn finish_defer(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.finish(SessionOutcome::Deferred, now)
    }

    /// End the session from `Running` or `Paused` and report it.
    pub fn finish(&mut self, outcome: SessionOutcome, now: DateTime<Utc>) -> Option<Event> {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return None;
        }
        let elapsed_secs = self.elapsed_secs(now);
        self.complete(outcome, elapsed_secs, now)
    }

    /// Discard the session without crediting time.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let elapsed_secs = self.elapsed_secs(now);
        let session = self.session.take()?;
        self.state = TimerState::Idle;
        tracing::debug!(timer_target = %session.target, elapsed_secs, "timer cancelled");
        Some(Event::TimerCancelled {
            target: session.target,
            elapsed_secs,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, outcome: SessionOutcome, elapsed_secs: u64, now: DateTime<Utc>) -> Option<Event> {
        let session = self.session.take()?;
        // Finished is reported upward through the event; the engine is
        // immediately ready for the next session.
        self.state = TimerState::Idle;
        tracing::debug!(timer_target = %session.target, elapsed_secs, ?outcome, "timer finished");
        Some(Event::SessionCompleted(SessionCompletion {
            target: session.target,
            elapsed_secs,
            breaks_taken: session.breaks_taken,
            outcome,
            at: now,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn secs(n: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(n)
    }

    fn target() -> TimerTarget {
        TimerTarget::task("maths")
    }

    fn completion(event: Option<Event>) -> SessionCompletion {
        match event {
            Some(Event::SessionCompleted(c)) => c,
            other => panic!("Expected SessionCompleted, got {other:?}"),
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::default();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start(target(), TimerMode::CountUp, None, t0()).is_some());
        assert_eq!(engine.state(), TimerState::Running);

        assert!(engine.pause(secs(5)).is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(engine.break_message().is_some());

        assert!(engine.resume(secs(8)).is_some());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut engine = TimerEngine::default();
        assert!(engine.pause(t0()).is_none());
        assert!(engine.resume(t0()).is_none());
        assert!(engine.finish_success(t0()).is_none());
        assert!(engine.tick(t0()).is_none());
        assert!(engine.cancel(t0()).is_none());

        engine.start(target(), TimerMode::CountUp, None, t0());
        assert!(engine.start(TimerTarget::task("other"), TimerMode::CountUp, None, t0()).is_none());
        assert_eq!(engine.target(), Some(&target()));
        assert!(engine.resume(t0()).is_none());
    }

    #[test]
    fn pause_resume_accumulates_across_gaps() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        engine.pause(secs(10));
        // Long gap while paused is not counted.
        engine.resume(secs(500));
        let done = completion(engine.finish_success(secs(505)));
        assert_eq!(done.elapsed_secs, 15);
        assert_eq!(done.breaks_taken, 1);
        assert_eq!(done.outcome, SessionOutcome::Success);
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(!engine.is_active());
    }

    #[test]
    fn elapsed_ignores_missed_ticks() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        assert!(engine.tick(secs(1)).is_none());
        // No ticks for an hour.
        assert_eq!(engine.elapsed_secs(secs(3601)), 3601);
    }

    #[test]
    fn finish_from_paused_uses_accumulated_only() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        engine.pause(secs(42));
        let done = completion(engine.finish_defer(secs(900)));
        assert_eq!(done.elapsed_secs, 42);
        assert_eq!(done.outcome, SessionOutcome::Deferred);
    }

    #[test]
    fn countdown_auto_finishes_at_duration() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountDown, Some(60), t0());
        assert_eq!(engine.remaining_secs(secs(0)), Some(60));
        assert!(engine.tick(secs(59)).is_none());
        assert_eq!(engine.remaining_secs(secs(59)), Some(1));
        let done = completion(engine.tick(secs(60)));
        assert_eq!(done.elapsed_secs, 60);
        assert_eq!(done.outcome, SessionOutcome::Success);
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn late_countdown_tick_still_reports_full_duration() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountDown, Some(60), t0());
        let done = completion(engine.tick(secs(400)));
        assert_eq!(done.elapsed_secs, 60);
    }

    #[test]
    fn adjust_forces_pause_without_counting_a_break() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        let event = engine.adjust(60, secs(10)).unwrap();
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.breaks_taken(), 0);
        match event {
            Event::TimerAdjusted { display_secs, .. } => assert_eq!(display_secs, 70),
            other => panic!("Expected TimerAdjusted, got {other:?}"),
        }
        // Paused: time does not move.
        assert_eq!(engine.elapsed_secs(secs(1000)), 70);
    }

    #[test]
    fn adjust_clamps_elapsed_at_zero() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        engine.pause(secs(30));
        engine.adjust(-100, secs(31));
        assert_eq!(engine.elapsed_secs(secs(31)), 0);
        let done = completion(engine.finish_success(secs(40)));
        assert_eq!(done.elapsed_secs, 0);
    }

    #[test]
    fn countdown_adjust_moves_remaining_time() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountDown, Some(120), t0());
        engine.pause(secs(60));
        assert_eq!(engine.remaining_secs(secs(60)), Some(60));

        engine.adjust(-30, secs(61));
        assert_eq!(engine.remaining_secs(secs(61)), Some(30));
        assert_eq!(engine.elapsed_secs(secs(61)), 90);

        // Raising remaining past the session length extends it.
        engine.adjust(200, secs(62));
        assert_eq!(engine.remaining_secs(secs(62)), Some(230));
        assert_eq!(engine.elapsed_secs(secs(62)), 0);

        engine.resume(secs(100));
        let done = completion(engine.tick(secs(330)));
        assert_eq!(done.elapsed_secs, 230);
    }

    #[test]
    fn countdown_adjust_to_zero_completes_on_next_tick() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountDown, Some(60), t0());
        engine.adjust(-600, secs(5));
        assert_eq!(engine.remaining_secs(secs(5)), Some(0));
        engine.resume(secs(6));
        let done = completion(engine.tick(secs(6)));
        assert_eq!(done.elapsed_secs, 60);
    }

    #[test]
    fn idle_adjust_changes_countdown_length_only() {
        let mut engine = TimerEngine::new(TimerMode::CountDown, 600);
        assert!(engine.adjust(60, t0()).is_some());
        assert_eq!(engine.countdown_secs(), 660);
        assert!(engine.adjust(-1000, t0()).is_some());
        assert_eq!(engine.countdown_secs(), 0);

        let mut stopwatch = TimerEngine::default();
        assert!(stopwatch.adjust(60, t0()).is_none());
    }

    #[test]
    fn mode_and_length_locked_while_active() {
        let mut engine = TimerEngine::default();
        assert!(engine.set_countdown_minutes(25));
        assert_eq!(engine.countdown_secs(), 1500);
        engine.start(target(), TimerMode::CountUp, None, t0());
        assert!(!engine.set_mode(TimerMode::CountDown));
        assert!(!engine.set_countdown_minutes(5));
    }

    #[test]
    fn cancel_discards_session() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        match engine.cancel(secs(30)) {
            Some(Event::TimerCancelled { elapsed_secs, .. }) => assert_eq!(elapsed_secs, 30),
            other => panic!("Expected TimerCancelled, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(engine.finish_success(secs(40)).is_none());
    }

    #[test]
    fn engine_survives_serialization_mid_session() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        engine.pause(secs(10));
        engine.resume(secs(20));

        let json = serde_json::to_string(&engine).unwrap();
        let mut restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), TimerState::Running);
        let done = completion(restored.finish_success(secs(25)));
        assert_eq!(done.elapsed_secs, 15);
    }

    #[test]
    fn snapshot_reports_paused_message() {
        let mut engine = TimerEngine::default();
        engine.start(target(), TimerMode::CountUp, None, t0());
        engine.pause(secs(3));
        match engine.snapshot(secs(4)) {
            Event::StateSnapshot {
                state,
                elapsed_secs,
                break_message,
                remaining_secs,
                ..
            } => {
                assert_eq!(state, TimerState::Paused);
                assert_eq!(elapsed_secs, 3);
                assert!(break_message.is_some());
                assert_eq!(remaining_secs, None);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
