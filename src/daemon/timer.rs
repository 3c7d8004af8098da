//! Timer engine for the Pomodoro Timer.
//!
//! This module provides the core timer functionality:
//! - Run-state transitions (Idle → Running ⇄ Paused, reset, skip)
//! - The engine-owned countdown slot and its one-second re-arming
//! - Session sequencing (work → short/long break → work) by cadence
//! - Synchronous, ordered tick and completion notifications
//!
//! The engine never sleeps itself. While running it publishes the deadline
//! of the next tick on a watch channel; whoever drives it (see
//! [`super::countdown`]) waits for that deadline and calls
//! [`TimerEngine::fire`]. Tests drive it directly through [`TimerEngine::tick`].

use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use crate::config::ConfigSource;
use crate::types::{ConfigError, EngineConfig, RunState, SessionType, TimerSnapshot};

/// Period of the countdown.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Callback invoked with the current snapshot on every state change.
pub type TickCallback = Box<dyn FnMut(&TimerSnapshot) + Send>;

/// Callback invoked with the session type that just completed.
pub type CompletionCallback = Box<dyn FnMut(SessionType) + Send>;

// ============================================================================
// Countdown
// ============================================================================

/// Handle of the armed countdown.
///
/// Every arm gets a new generation, so a handle that was cancelled and
/// re-armed never compares equal to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    generation: u64,
    deadline: Instant,
}

impl Countdown {
    fn arm(generation: u64, now: Instant) -> Self {
        Self {
            generation,
            deadline: now + TICK_INTERVAL,
        }
    }

    /// Instant at which the next tick is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Arm generation this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Next one-second deadline; missed ticks are skipped, not replayed.
    fn next(self, now: Instant) -> Self {
        let mut deadline = self.deadline + TICK_INTERVAL;
        if deadline <= now {
            deadline = now + TICK_INTERVAL;
        }
        Self { deadline, ..self }
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the session state machine.
pub struct TimerEngine {
    /// Observable state
    snapshot: TimerSnapshot,
    /// Live configuration, read at every session boundary
    config: Box<dyn ConfigSource>,
    /// The single countdown slot; `Some` exactly while running
    countdown: Option<Countdown>,
    /// Generation of the most recent arm
    generation: u64,
    /// Publishes the countdown slot to the driver; dropped on destroy
    countdown_tx: Option<watch::Sender<Option<Countdown>>>,
    tick_subscribers: Vec<TickCallback>,
    completion_subscribers: Vec<CompletionCallback>,
    destroyed: bool,
}

impl TimerEngine {
    /// Creates an idle engine at the start of a work session.
    ///
    /// # Errors
    ///
    /// Returns an error if the source's current configuration is invalid.
    pub fn new(config: impl ConfigSource + 'static) -> Result<Self, ConfigError> {
        let initial = config.current();
        initial.validate()?;

        let (countdown_tx, _) = watch::channel(None);

        Ok(Self {
            snapshot: TimerSnapshot::initial(initial.session_seconds(SessionType::Work)),
            config: Box::new(config),
            countdown: None,
            generation: 0,
            countdown_tx: Some(countdown_tx),
            tick_subscribers: Vec::new(),
            completion_subscribers: Vec::new(),
            destroyed: false,
        })
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot
    }

    /// Returns the armed countdown, if the timer is running.
    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    /// Subscribes to countdown changes.
    ///
    /// The receiver sees `Some` while running and `None` otherwise. Once the
    /// engine is destroyed the sender is gone and `changed()` returns an
    /// error.
    pub fn watch_countdown(&self) -> watch::Receiver<Option<Countdown>> {
        match &self.countdown_tx {
            Some(tx) => tx.subscribe(),
            None => watch::channel(None).1,
        }
    }

    /// Returns true once [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Registers a tick subscriber.
    pub fn subscribe_tick<F>(&mut self, callback: F)
    where
        F: FnMut(&TimerSnapshot) + Send + 'static,
    {
        if self.destroyed {
            tracing::debug!("ignoring tick subscription on destroyed engine");
            return;
        }
        self.tick_subscribers.push(Box::new(callback));
    }

    /// Registers a completion subscriber.
    pub fn subscribe_completion<F>(&mut self, callback: F)
    where
        F: FnMut(SessionType) + Send + 'static,
    {
        if self.destroyed {
            tracing::debug!("ignoring completion subscription on destroyed engine");
            return;
        }
        self.completion_subscribers.push(Box::new(callback));
    }

    /// Starts or resumes the countdown from the current remaining time.
    ///
    /// No-op while already running.
    pub fn start(&mut self) {
        if self.destroyed || self.snapshot.run_state == RunState::Running {
            return;
        }

        self.snapshot.run_state = RunState::Running;
        self.arm_countdown();
        tracing::debug!(
            session = self.snapshot.session_type.as_str(),
            remaining = self.snapshot.seconds_remaining,
            "timer started"
        );
        self.notify_tick();
    }

    /// Suspends a running countdown, keeping the remaining time.
    ///
    /// No-op unless running.
    pub fn pause(&mut self) {
        if self.destroyed || self.snapshot.run_state != RunState::Running {
            return;
        }

        self.cancel_countdown();
        self.snapshot.run_state = RunState::Paused;
        tracing::debug!(remaining = self.snapshot.seconds_remaining, "timer paused");
        self.notify_tick();
    }

    /// Stops the countdown and rewinds the current session to its full length.
    pub fn reset(&mut self) {
        if self.destroyed {
            return;
        }

        self.cancel_countdown();
        self.snapshot.seconds_remaining = self.snapshot.seconds_total;
        self.snapshot.run_state = RunState::Idle;
        tracing::debug!(
            session = self.snapshot.session_type.as_str(),
            "timer reset"
        );
        self.notify_tick();
    }

    /// Completes the current session immediately, whatever the run state.
    pub fn skip(&mut self) {
        if self.destroyed {
            return;
        }

        self.cancel_countdown();
        self.snapshot.run_state = RunState::Idle;
        tracing::debug!(
            session = self.snapshot.session_type.as_str(),
            "session skipped"
        );
        self.complete_session();
        self.notify_tick();
    }

    /// Advances the countdown by one second.
    ///
    /// Does nothing unless a countdown is armed. When the remaining time
    /// reaches zero the session completes.
    pub fn tick(&mut self) {
        let Some(countdown) = self.countdown else {
            return;
        };

        self.snapshot.seconds_remaining = self.snapshot.seconds_remaining.saturating_sub(1);

        if self.snapshot.seconds_remaining == 0 {
            self.cancel_countdown();
            self.snapshot.run_state = RunState::Idle;
            self.complete_session();
        } else {
            self.countdown = Some(countdown.next(Instant::now()));
            self.publish_countdown();
        }

        self.notify_tick();
    }

    /// Ticks if `due` is still the armed countdown.
    ///
    /// Returns false for a stale handle (cancelled, re-armed, or already
    /// fired), so a driver that woke up late can never double-tick.
    pub fn fire(&mut self, due: Countdown) -> bool {
        if self.countdown != Some(due) {
            return false;
        }
        self.tick();
        true
    }

    /// Stops all scheduling and drops every subscriber.
    ///
    /// After this call every operation is a no-op and the countdown watch
    /// channel is closed.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.cancel_countdown();
        self.countdown_tx = None;
        self.tick_subscribers.clear();
        self.completion_subscribers.clear();
        self.destroyed = true;
        tracing::info!(
            completed = self.snapshot.completed_work_sessions,
            "timer engine destroyed"
        );
    }

    /// Runs the session-completion procedure.
    fn complete_session(&mut self) {
        let completed = self.snapshot.session_type;
        tracing::info!(session = completed.as_str(), "session completed");

        // Subscribers see the finished session before the next one loads.
        self.notify_completion(completed);

        let config = self.load_config();
        let next = match completed {
            SessionType::Work => {
                self.snapshot.completed_work_sessions =
                    self.snapshot.completed_work_sessions.saturating_add(1);
                config.break_after(self.snapshot.completed_work_sessions)
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
        };

        let total = config.session_seconds(next);
        self.snapshot.session_type = next;
        self.snapshot.seconds_total = total;
        self.snapshot.seconds_remaining = total;

        if config.auto_starts(next) {
            self.snapshot.run_state = RunState::Running;
            self.arm_countdown();
        } else {
            self.snapshot.run_state = RunState::Idle;
        }

        tracing::debug!(
            next = next.as_str(),
            total,
            running = self.snapshot.is_running(),
            "next session loaded"
        );
    }

    /// Reads the live configuration, clamping values a source should never
    /// have handed out.
    fn load_config(&self) -> EngineConfig {
        let config = self.config.current();
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("invalid live configuration, clamping: {}", e);
                config.clamped()
            }
        }
    }

    fn arm_countdown(&mut self) {
        self.generation += 1;
        self.countdown = Some(Countdown::arm(self.generation, Instant::now()));
        self.publish_countdown();
    }

    fn cancel_countdown(&mut self) {
        if self.countdown.take().is_some() {
            self.publish_countdown();
        }
    }

    fn publish_countdown(&self) {
        if let Some(tx) = &self.countdown_tx {
            tx.send_replace(self.countdown);
        }
    }

    fn notify_tick(&mut self) {
        let snapshot = self.snapshot;
        for callback in &mut self.tick_subscribers {
            callback(&snapshot);
        }
    }

    fn notify_completion(&mut self, completed: SessionType) {
        for callback in &mut self.completion_subscribers {
            callback(completed);
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("snapshot", &self.snapshot)
            .field("countdown", &self.countdown)
            .field("tick_subscribers", &self.tick_subscribers.len())
            .field("completion_subscribers", &self.completion_subscribers.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::config::SharedConfig;

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_engine() -> TimerEngine {
        TimerEngine::new(EngineConfig::default()).unwrap()
    }

    fn create_engine_with_config(config: EngineConfig) -> TimerEngine {
        TimerEngine::new(config).unwrap()
    }

    /// Config with one-minute sessions so natural expiry takes 60 ticks.
    fn fast_config() -> EngineConfig {
        EngineConfig::default()
            .with_work_minutes(1)
            .with_short_break_minutes(1)
            .with_long_break_minutes(2)
    }

    fn record_ticks(engine: &mut TimerEngine) -> Arc<Mutex<Vec<TimerSnapshot>>> {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = ticks.clone();
        engine.subscribe_tick(move |snapshot| sink.lock().unwrap().push(*snapshot));
        ticks
    }

    fn record_completions(engine: &mut TimerEngine) -> Arc<Mutex<Vec<SessionType>>> {
        let completions = Arc::new(Mutex::new(Vec::new()));
        let sink = completions.clone();
        engine.subscribe_completion(move |session| sink.lock().unwrap().push(session));
        completions
    }

    fn run_to_expiry(engine: &mut TimerEngine) {
        let remaining = engine.snapshot().seconds_remaining;
        for _ in 0..remaining {
            engine.tick();
        }
    }

    // ------------------------------------------------------------------------
    // Construction Tests
    // ------------------------------------------------------------------------

    mod construction_tests {
        use super::*;

        #[test]
        fn test_new_engine() {
            let engine = create_engine();
            let snapshot = engine.snapshot();

            assert_eq!(snapshot.run_state, RunState::Idle);
            assert_eq!(snapshot.session_type, SessionType::Work);
            assert_eq!(snapshot.seconds_remaining, 25 * 60);
            assert_eq!(snapshot.seconds_total, 25 * 60);
            assert_eq!(snapshot.completed_work_sessions, 0);
            assert!(engine.countdown().is_none());
            assert!(!engine.is_destroyed());
        }

        #[test]
        fn test_new_rejects_zero_duration() {
            let result = TimerEngine::new(EngineConfig::default().with_work_minutes(0));
            assert!(matches!(
                result,
                Err(ConfigError::InvalidDuration {
                    session: SessionType::Work,
                    ..
                })
            ));
        }

        #[test]
        fn test_new_rejects_zero_cadence() {
            let result = TimerEngine::new(EngineConfig::default().with_sessions_per_long_break(0));
            assert!(matches!(result, Err(ConfigError::InvalidCadence)));
        }

        #[test]
        fn test_snapshot_is_a_copy() {
            let engine = create_engine();
            let mut copy = engine.snapshot();
            copy.seconds_remaining = 1;
            copy.run_state = RunState::Running;

            assert_eq!(engine.snapshot().seconds_remaining, 25 * 60);
            assert_eq!(engine.snapshot().run_state, RunState::Idle);
        }
    }

    // ------------------------------------------------------------------------
    // State Machine Tests
    // ------------------------------------------------------------------------

    mod state_machine_tests {
        use super::*;

        #[test]
        fn test_start() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.start();

            assert_eq!(engine.snapshot().run_state, RunState::Running);
            assert!(engine.countdown().is_some());
            assert_eq!(ticks.lock().unwrap().len(), 1);
            assert_eq!(ticks.lock().unwrap()[0].run_state, RunState::Running);
        }

        #[test]
        fn test_start_while_running_is_noop() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.start();
            let armed = engine.countdown();
            engine.start();

            assert_eq!(engine.countdown(), armed);
            assert_eq!(ticks.lock().unwrap().len(), 1);
        }

        #[test]
        fn test_pause() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.start();
            engine.tick();
            engine.pause();

            let snapshot = engine.snapshot();
            assert_eq!(snapshot.run_state, RunState::Paused);
            assert_eq!(snapshot.seconds_remaining, 25 * 60 - 1);
            assert!(engine.countdown().is_none());
            assert_eq!(ticks.lock().unwrap().len(), 3);
        }

        #[test]
        fn test_pause_when_not_running_is_noop() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.pause();
            assert_eq!(engine.snapshot().run_state, RunState::Idle);

            engine.start();
            engine.pause();
            engine.pause();
            assert_eq!(engine.snapshot().run_state, RunState::Paused);

            // start + one pause
            assert_eq!(ticks.lock().unwrap().len(), 2);
        }

        #[test]
        fn test_pause_then_start_preserves_remaining_time() {
            let mut engine = create_engine();

            engine.start();
            for _ in 0..42 {
                engine.tick();
            }
            engine.pause();
            let at_pause = engine.snapshot().seconds_remaining;

            // Ticks while paused must not move the clock
            engine.tick();
            engine.tick();

            engine.start();
            assert_eq!(engine.snapshot().run_state, RunState::Running);
            assert_eq!(engine.snapshot().seconds_remaining, at_pause);
            assert_eq!(at_pause, 25 * 60 - 42);
        }

        #[test]
        fn test_restart_arms_new_generation() {
            let mut engine = create_engine();

            engine.start();
            let first = engine.countdown().unwrap();
            engine.pause();
            engine.start();
            let second = engine.countdown().unwrap();

            assert!(second.generation() > first.generation());
            assert_ne!(first, second);
        }

        #[test]
        fn test_reset_from_every_state() {
            for setup in 0..3 {
                let mut engine = create_engine();
                match setup {
                    0 => {}
                    1 => {
                        engine.start();
                        engine.tick();
                    }
                    _ => {
                        engine.start();
                        engine.tick();
                        engine.pause();
                    }
                }
                let session = engine.snapshot().session_type;

                engine.reset();

                let snapshot = engine.snapshot();
                assert_eq!(snapshot.run_state, RunState::Idle);
                assert_eq!(snapshot.session_type, session);
                assert_eq!(snapshot.seconds_remaining, snapshot.seconds_total);
                assert!(engine.countdown().is_none());
            }
        }

        #[test]
        fn test_reset_keeps_session_and_count() {
            let mut engine = create_engine();
            engine.skip();
            engine.start();
            engine.tick();

            engine.reset();

            let snapshot = engine.snapshot();
            assert_eq!(snapshot.session_type, SessionType::ShortBreak);
            assert_eq!(snapshot.completed_work_sessions, 1);
            assert_eq!(snapshot.seconds_remaining, 5 * 60);
        }

        #[test]
        fn test_reset_emits_tick() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.reset();

            let ticks = ticks.lock().unwrap();
            assert_eq!(ticks.len(), 1);
            assert_eq!(ticks[0].run_state, RunState::Idle);
        }

        #[test]
        fn test_tick_while_idle_is_ignored() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.tick();

            assert_eq!(engine.snapshot().seconds_remaining, 25 * 60);
            assert!(ticks.lock().unwrap().is_empty());
        }

        #[test]
        fn test_every_running_second_emits_tick() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);

            engine.start();
            engine.tick();
            engine.tick();
            engine.tick();

            let remaining: Vec<u32> = ticks
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.seconds_remaining)
                .collect();
            assert_eq!(remaining, vec![1500, 1499, 1498, 1497]);
        }
    }

    // ------------------------------------------------------------------------
    // Session Completion Tests
    // ------------------------------------------------------------------------

    mod completion_tests {
        use super::*;

        #[test]
        fn test_natural_expiry_completes_work() {
            let mut engine = create_engine_with_config(fast_config());
            let completions = record_completions(&mut engine);

            engine.start();
            run_to_expiry(&mut engine);

            assert_eq!(*completions.lock().unwrap(), vec![SessionType::Work]);
            let snapshot = engine.snapshot();
            assert_eq!(snapshot.session_type, SessionType::ShortBreak);
            assert_eq!(snapshot.run_state, RunState::Idle);
            assert_eq!(snapshot.seconds_total, 60);
            assert_eq!(snapshot.seconds_remaining, 60);
            assert_eq!(snapshot.completed_work_sessions, 1);
            assert!(engine.countdown().is_none());
        }

        #[test]
        fn test_completion_fires_before_next_session_loads() {
            let mut engine = create_engine_with_config(fast_config());
            let seen_by_tick = Arc::new(Mutex::new(Vec::new()));
            let completions = record_completions(&mut engine);

            // The tick log captures the snapshot at each notification; a
            // completion subscriber cannot read the engine, so compare the
            // order of events instead.
            let order = Arc::new(Mutex::new(Vec::new()));
            let order_tick = order.clone();
            let seen = seen_by_tick.clone();
            engine.subscribe_tick(move |snapshot| {
                seen.lock().unwrap().push(*snapshot);
                order_tick
                    .lock()
                    .unwrap()
                    .push(format!("tick:{}", snapshot.session_type.as_str()));
            });
            let order_done = order.clone();
            engine.subscribe_completion(move |session| {
                order_done
                    .lock()
                    .unwrap()
                    .push(format!("done:{}", session.as_str()));
            });

            engine.start();
            run_to_expiry(&mut engine);

            let order = order.lock().unwrap();
            let done_at = order.iter().position(|e| e == "done:work").unwrap();
            let first_break_tick = order.iter().position(|e| e == "tick:short-break").unwrap();
            assert!(done_at < first_break_tick);
            assert_eq!(completions.lock().unwrap().len(), 1);

            // Every tick before the completion still shows the work total
            let seen = seen_by_tick.lock().unwrap();
            assert!(seen[..seen.len() - 1]
                .iter()
                .all(|s| s.session_type == SessionType::Work && s.seconds_total == 60));
        }

        #[test]
        fn test_expiry_emits_single_post_completion_tick() {
            let mut engine = create_engine_with_config(fast_config());
            let ticks = record_ticks(&mut engine);

            engine.start();
            run_to_expiry(&mut engine);

            let ticks = ticks.lock().unwrap();
            // start + 59 countdown ticks + 1 post-completion tick
            assert_eq!(ticks.len(), 61);
            let last = ticks.last().unwrap();
            assert_eq!(last.session_type, SessionType::ShortBreak);
            assert_eq!(last.seconds_remaining, 60);
        }

        #[test]
        fn test_skip_sequence_with_cadence_four() {
            let mut engine = create_engine();
            let expected = [
                (SessionType::ShortBreak, 1),
                (SessionType::Work, 1),
                (SessionType::ShortBreak, 2),
                (SessionType::Work, 2),
                (SessionType::ShortBreak, 3),
                (SessionType::Work, 3),
                (SessionType::LongBreak, 4),
                (SessionType::Work, 4),
                (SessionType::ShortBreak, 5),
            ];

            for (session, completed) in expected {
                engine.skip();
                let snapshot = engine.snapshot();
                assert_eq!(snapshot.session_type, session);
                assert_eq!(snapshot.completed_work_sessions, completed);
            }
        }

        #[test]
        fn test_cadence_of_one() {
            let mut engine =
                create_engine_with_config(EngineConfig::default().with_sessions_per_long_break(1));

            for _ in 0..3 {
                engine.skip();
                assert_eq!(engine.snapshot().session_type, SessionType::LongBreak);
                engine.skip();
                assert_eq!(engine.snapshot().session_type, SessionType::Work);
            }
            assert_eq!(engine.snapshot().completed_work_sessions, 3);
        }

        #[test]
        fn test_break_completion_does_not_count() {
            let mut engine = create_engine();
            engine.skip();
            assert_eq!(engine.snapshot().completed_work_sessions, 1);

            engine.skip();
            assert_eq!(engine.snapshot().session_type, SessionType::Work);
            assert_eq!(engine.snapshot().completed_work_sessions, 1);
        }

        #[test]
        fn test_skip_from_idle_and_paused_notifies_once() {
            let mut engine = create_engine();
            let completions = record_completions(&mut engine);

            engine.skip();
            assert_eq!(*completions.lock().unwrap(), vec![SessionType::Work]);

            engine.start();
            engine.tick();
            engine.pause();
            engine.skip();
            assert_eq!(
                *completions.lock().unwrap(),
                vec![SessionType::Work, SessionType::ShortBreak]
            );
            assert_eq!(engine.snapshot().session_type, SessionType::Work);
            assert_eq!(engine.snapshot().run_state, RunState::Idle);
        }

        #[test]
        fn test_skip_matches_natural_expiry() {
            let mut skipped = create_engine_with_config(fast_config());
            let mut expired = create_engine_with_config(fast_config());

            skipped.skip();
            expired.start();
            run_to_expiry(&mut expired);

            assert_eq!(skipped.snapshot(), expired.snapshot());
        }

        #[test]
        fn test_skip_while_running_cancels_countdown() {
            let mut engine = create_engine();
            engine.start();
            let armed = engine.countdown().unwrap();

            engine.skip();

            assert!(engine.countdown().is_none());
            assert!(!engine.fire(armed));
            assert_eq!(engine.snapshot().seconds_remaining, 5 * 60);
        }
    }

    // ------------------------------------------------------------------------
    // Auto-start Tests
    // ------------------------------------------------------------------------

    mod auto_start_tests {
        use super::*;

        #[test]
        fn test_auto_start_breaks_gates_break() {
            let mut engine = create_engine_with_config(fast_config().with_auto_start(true, false));

            engine.skip();
            assert_eq!(engine.snapshot().session_type, SessionType::ShortBreak);
            assert_eq!(engine.snapshot().run_state, RunState::Running);
            assert!(engine.countdown().is_some());

            engine.skip();
            assert_eq!(engine.snapshot().session_type, SessionType::Work);
            assert_eq!(engine.snapshot().run_state, RunState::Idle);
        }

        #[test]
        fn test_auto_start_work_gates_work() {
            let mut engine = create_engine_with_config(fast_config().with_auto_start(false, true));

            engine.skip();
            assert_eq!(engine.snapshot().run_state, RunState::Idle);

            engine.skip();
            let snapshot = engine.snapshot();
            assert_eq!(snapshot.session_type, SessionType::Work);
            assert_eq!(snapshot.run_state, RunState::Running);
            assert_eq!(snapshot.seconds_remaining, 60);
        }

        #[test]
        fn test_break_expiry_without_auto_start_work() {
            let mut engine = create_engine_with_config(fast_config());
            engine.skip();
            engine.start();
            run_to_expiry(&mut engine);

            let snapshot = engine.snapshot();
            assert_eq!(snapshot.run_state, RunState::Idle);
            assert_eq!(snapshot.session_type, SessionType::Work);
            assert_eq!(snapshot.seconds_remaining, 60);
        }

        #[test]
        fn test_full_auto_cycle_keeps_running() {
            let mut engine = create_engine_with_config(fast_config().with_auto_start(true, true));
            let completions = record_completions(&mut engine);

            engine.start();
            for _ in 0..(60 + 60 + 60) {
                engine.tick();
            }

            assert_eq!(
                *completions.lock().unwrap(),
                vec![SessionType::Work, SessionType::ShortBreak, SessionType::Work]
            );
            assert_eq!(engine.snapshot().run_state, RunState::Running);
            assert_eq!(engine.snapshot().completed_work_sessions, 2);
        }
    }

    // ------------------------------------------------------------------------
    // Live Configuration Tests
    // ------------------------------------------------------------------------

    mod live_config_tests {
        use super::*;

        #[test]
        fn test_changes_apply_from_next_session() {
            let config = SharedConfig::new(fast_config()).unwrap();
            let mut engine = TimerEngine::new(config.clone()).unwrap();

            engine.start();
            engine.tick();
            config
                .update(|c| {
                    c.work_minutes = 3;
                    c.short_break_minutes = 2;
                })
                .unwrap();

            // Current session is untouched
            assert_eq!(engine.snapshot().seconds_total, 60);
            assert_eq!(engine.snapshot().seconds_remaining, 59);

            engine.skip();
            assert_eq!(engine.snapshot().seconds_total, 120);

            engine.skip();
            assert_eq!(engine.snapshot().seconds_total, 180);
        }

        #[test]
        fn test_reset_does_not_reread_config() {
            let config = SharedConfig::new(fast_config()).unwrap();
            let mut engine = TimerEngine::new(config.clone()).unwrap();

            config.update(|c| c.work_minutes = 10).unwrap();
            engine.reset();

            assert_eq!(engine.snapshot().seconds_total, 60);
        }

        #[test]
        fn test_cadence_change_applies_at_boundary() {
            let config = SharedConfig::new(EngineConfig::default()).unwrap();
            let mut engine = TimerEngine::new(config.clone()).unwrap();

            engine.skip();
            assert_eq!(engine.snapshot().session_type, SessionType::ShortBreak);
            engine.skip();

            config.update(|c| c.sessions_per_long_break = 2).unwrap();
            engine.skip();
            assert_eq!(engine.snapshot().session_type, SessionType::LongBreak);
        }

        struct Flaky(Mutex<Vec<EngineConfig>>);

        impl ConfigSource for Flaky {
            fn current(&self) -> EngineConfig {
                let mut values = self.0.lock().unwrap();
                if values.len() > 1 {
                    values.remove(0)
                } else {
                    values[0].clone()
                }
            }
        }

        #[test]
        fn test_invalid_live_values_are_clamped() {
            let source = Flaky(Mutex::new(vec![
                EngineConfig::default(),
                EngineConfig {
                    short_break_minutes: 0,
                    sessions_per_long_break: 0,
                    ..EngineConfig::default()
                },
            ]));
            let mut engine = TimerEngine::new(source).unwrap();

            engine.skip();

            let snapshot = engine.snapshot();
            assert_eq!(snapshot.session_type, SessionType::LongBreak);
            assert_eq!(snapshot.seconds_total, 15 * 60);
            assert!(snapshot.seconds_total > 0);
        }
    }

    // ------------------------------------------------------------------------
    // Subscription Tests
    // ------------------------------------------------------------------------

    mod subscription_tests {
        use super::*;

        #[test]
        fn test_subscribers_run_in_registration_order() {
            let mut engine = create_engine();
            let calls = Arc::new(Mutex::new(Vec::new()));

            for id in 0..3 {
                let calls = calls.clone();
                engine.subscribe_tick(move |_| calls.lock().unwrap().push(id));
            }

            engine.start();
            engine.pause();

            assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
        }

        #[test]
        fn test_completion_and_tick_lists_are_independent() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);
            let completions = record_completions(&mut engine);

            engine.start();
            engine.pause();
            assert!(completions.lock().unwrap().is_empty());

            engine.skip();
            assert_eq!(completions.lock().unwrap().len(), 1);
            assert_eq!(ticks.lock().unwrap().len(), 3);
        }
    }

    // ------------------------------------------------------------------------
    // Countdown / Destroy Tests
    // ------------------------------------------------------------------------

    mod countdown_tests {
        use super::*;

        #[test]
        fn test_watch_tracks_countdown_slot() {
            let mut engine = create_engine();
            let rx = engine.watch_countdown();
            assert!(rx.borrow().is_none());

            engine.start();
            assert_eq!(*rx.borrow(), engine.countdown());

            engine.tick();
            let after_tick = *rx.borrow();
            assert_eq!(after_tick, engine.countdown());
            assert!(after_tick.is_some());

            engine.pause();
            assert!(rx.borrow().is_none());
        }

        #[test]
        fn test_tick_advances_deadline_by_one_second() {
            let mut engine = create_engine();
            engine.start();
            let first = engine.countdown().unwrap();

            engine.tick();
            let second = engine.countdown().unwrap();

            assert_eq!(second.generation(), first.generation());
            assert!(second.deadline() >= first.deadline() + TICK_INTERVAL);
        }

        #[test]
        fn test_fire_rejects_stale_handle() {
            let mut engine = create_engine();
            engine.start();
            let due = engine.countdown().unwrap();

            assert!(engine.fire(due));
            assert_eq!(engine.snapshot().seconds_remaining, 1499);

            // Already fired: the slot now holds the next deadline
            assert!(!engine.fire(due));
            assert_eq!(engine.snapshot().seconds_remaining, 1499);
        }

        #[test]
        fn test_destroy_while_running_stops_ticks() {
            let mut engine = create_engine();
            let ticks = record_ticks(&mut engine);
            let rx = engine.watch_countdown();

            engine.start();
            let due = engine.countdown().unwrap();
            engine.destroy();

            assert!(engine.is_destroyed());
            assert!(engine.countdown().is_none());
            assert!(!engine.fire(due));
            engine.tick();
            engine.start();
            engine.skip();
            engine.reset();

            assert_eq!(ticks.lock().unwrap().len(), 1);
            assert!(rx.has_changed().is_err());
        }

        #[test]
        fn test_destroy_twice_is_harmless() {
            let mut engine = create_engine();
            engine.destroy();
            engine.destroy();
            assert!(engine.is_destroyed());
        }

        #[test]
        fn test_subscriptions_after_destroy_are_ignored() {
            let mut engine = create_engine();
            engine.destroy();

            let ticks = record_ticks(&mut engine);
            engine.start();
            assert!(ticks.lock().unwrap().is_empty());
            assert!(engine.watch_countdown().has_changed().is_err());
        }
    }
}
