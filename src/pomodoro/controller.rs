use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use tokio::{sync::broadcast, sync::Mutex, time};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::notify::Notification;

use super::{config::PomodoroDurations, PomodoroState};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A finished interval, kept in memory for the lifetime of the controller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedInterval {
    pub id: Uuid,
    pub mode: super::PomodoroMode,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSnapshot {
    pub state: PomodoroState,
    pub session_label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PomodoroEvent {
    Tick {
        mode: super::PomodoroMode,
        time_left: u32,
    },
    StateChanged {
        snapshot: PomodoroSnapshot,
    },
    IntervalCompleted {
        interval: CompletedInterval,
        notification: Notification,
    },
}

/// Owns the countdown and the work/break cycle. The one-second tick is a
/// spawned task whose lifetime is tied to a cancellation token held here;
/// every path that stops the timer cancels the token, so no ticker outlives
/// the state it drives.
#[derive(Clone)]
pub struct PomodoroController {
    state: Arc<Mutex<PomodoroState>>,
    history: Arc<Mutex<Vec<CompletedInterval>>>,
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    events: broadcast::Sender<PomodoroEvent>,
    tick_interval: Duration,
}

impl Default for PomodoroController {
    fn default() -> Self {
        Self::new()
    }
}

impl PomodoroController {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(PomodoroState::new())),
            history: Arc::new(Mutex::new(Vec::new())),
            ticker: Arc::new(Mutex::new(None)),
            events,
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PomodoroEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> PomodoroSnapshot {
        let state = self.state.lock().await;
        PomodoroSnapshot {
            session_label: state.session_label(),
            state: state.clone(),
        }
    }

    pub async fn history(&self) -> Vec<CompletedInterval> {
        self.history.lock().await.clone()
    }

    /// Starts the countdown. No-op while already running.
    pub async fn start(&self) {
        {
            let mut state = self.state.lock().await;
            if state.is_running {
                return;
            }
            state.is_running = true;
            if state.interval_started_at.is_none() {
                state.interval_started_at = Some(Utc::now());
            }
        }
        self.spawn_ticker().await;
        self.emit_state_changed().await;
    }

    /// Stops the countdown where it is. Idempotent.
    pub async fn pause(&self) {
        {
            let mut state = self.state.lock().await;
            if !state.is_running {
                return;
            }
            state.is_running = false;
        }
        self.cancel_ticker().await;
        self.emit_state_changed().await;
    }

    /// Restores the full duration of the current mode. Mode and session
    /// count are untouched.
    pub async fn reset(&self) {
        {
            let mut state = self.state.lock().await;
            state.reset();
        }
        self.cancel_ticker().await;
        self.emit_state_changed().await;
    }

    /// Applies new durations (clamped to their allowed ranges) and leaves
    /// the timer idle on the current mode's new full duration.
    pub async fn apply_durations(&self, durations: PomodoroDurations) -> Notification {
        {
            let mut state = self.state.lock().await;
            state.apply_durations(durations);
        }
        self.cancel_ticker().await;
        self.emit_state_changed().await;
        Notification::success("Settings Applied", "Timer durations have been updated.")
    }

    /// Cancels any live ticker. Call on teardown of the hosting surface.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(token) = ticker_guard.take() {
            token.cancel();
        }

        let token = CancellationToken::new();
        *ticker_guard = Some(token.clone());

        let state = self.state.clone();
        let history = self.history.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // The first tick of a fresh interval completes immediately;
            // consume it so the countdown starts a full period out.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let completed = {
                    let mut guard = state.lock().await;
                    if !guard.is_running {
                        break;
                    }
                    let started_at = guard.interval_started_at;
                    let mode_before = guard.mode;
                    match guard.tick() {
                        None => {
                            let _ = events.send(PomodoroEvent::Tick {
                                mode: guard.mode,
                                time_left: guard.time_left,
                            });
                            None
                        }
                        Some(transition) => {
                            let interval_record = CompletedInterval {
                                id: Uuid::new_v4(),
                                mode: mode_before,
                                started_at,
                                completed_at: Utc::now(),
                            };
                            let notification = transition.notification(&guard.durations);
                            let snapshot = PomodoroSnapshot {
                                session_label: guard.session_label(),
                                state: guard.clone(),
                            };
                            Some((interval_record, notification, snapshot))
                        }
                    }
                };

                if let Some((interval_record, notification, snapshot)) = completed {
                    info!(
                        "interval complete: {:?} -> {:?}",
                        interval_record.mode, snapshot.state.mode
                    );
                    history.lock().await.push(interval_record.clone());
                    let _ = events.send(PomodoroEvent::IntervalCompleted {
                        interval: interval_record,
                        notification,
                    });
                    let _ = events.send(PomodoroEvent::StateChanged { snapshot });
                    break;
                }
            }
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(token) = self.ticker.lock().await.take() {
            token.cancel();
        }
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(PomodoroEvent::StateChanged { snapshot });
    }
}
