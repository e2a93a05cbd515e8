use super::clock::Clock;
use super::config::SessionConfig;
use super::event::SessionEvent;
use super::status::{SessionState, SessionStatus, StatusSnapshot};
use super::timer::TimerService;
use crate::bus::{Broadcaster, SurfaceRegistry};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of feeding one event to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub event: SessionEvent,
    pub from: SessionState,
    pub to: SessionState,

    /// False when the guard rejected the event and nothing changed
    pub changed: bool,

    pub status: StatusSnapshot,
}

struct Inner {
    status: SessionStatus,
    timer: TimerService,
}

/// The recording session state machine.
///
/// Single writer of the status store. Every transition runs under one lock:
/// the status is mutated, the timer started or cancelled, the new status
/// published and the matching control action forwarded before the next
/// event gets in. Events whose guard fails are no-ops.
pub struct SessionController {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
    broadcaster: Broadcaster,
    surfaces: Arc<SurfaceRegistry>,
}

impl SessionController {
    pub fn new(
        config: &SessionConfig,
        clock: Arc<dyn Clock>,
        broadcaster: Broadcaster,
        surfaces: Arc<SurfaceRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                status: SessionStatus::default(),
                timer: TimerService::new(config.tick_interval),
            })),
            clock,
            broadcaster,
            surfaces,
        }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn surfaces(&self) -> &Arc<SurfaceRegistry> {
        &self.surfaces
    }

    pub async fn start(&self) -> Transition {
        self.apply(SessionEvent::Start).await
    }

    pub async fn pause(&self) -> Transition {
        self.apply(SessionEvent::Pause).await
    }

    pub async fn resume(&self) -> Transition {
        self.apply(SessionEvent::Resume).await
    }

    pub async fn stop(&self) -> Transition {
        self.apply(SessionEvent::Stop).await
    }

    /// The recording surface closed; behaves like `stop` without forwarding
    pub async fn surface_closed(&self) -> Transition {
        self.apply(SessionEvent::SurfaceClosed).await
    }

    /// Current status with elapsed time brought up to date
    pub async fn status(&self) -> StatusSnapshot {
        let mut inner = self.inner.lock().await;
        inner.status.refresh(self.clock.now_ms());
        inner.status.snapshot()
    }

    /// Raw clock fields, as last written
    pub async fn raw_status(&self) -> SessionStatus {
        self.inner.lock().await.status
    }

    pub async fn timer_running(&self) -> bool {
        self.inner.lock().await.timer.is_running()
    }

    pub async fn apply(&self, event: SessionEvent) -> Transition {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now_ms();
        let from = inner.status.state;

        let changed = match (from, event) {
            (SessionState::Idle, SessionEvent::Start) => {
                inner.status = SessionStatus {
                    state: SessionState::Recording,
                    start_time: now,
                    paused_time: 0,
                    elapsed_seconds: 0,
                };
                true
            }
            (SessionState::Recording, SessionEvent::Pause) => {
                inner.status.refresh(now);
                inner.status.paused_time = now;
                inner.status.state = SessionState::Paused;
                true
            }
            (SessionState::Paused, SessionEvent::Resume) => {
                let paused_for = now.saturating_sub(inner.status.paused_time);
                inner.status.start_time += paused_for;
                inner.status.paused_time = 0;
                inner.status.state = SessionState::Recording;
                true
            }
            (
                SessionState::Recording | SessionState::Paused,
                SessionEvent::Stop | SessionEvent::SurfaceClosed,
            ) => {
                inner.status.reset();
                true
            }
            _ => false,
        };

        if !changed {
            debug!("Ignoring {:?} while {:?}", event, from);
            return Transition {
                event,
                from,
                to: from,
                changed: false,
                status: inner.status.snapshot(),
            };
        }

        let to = inner.status.state;
        info!("Session {:?} -> {:?} on {:?}", from, to, event);

        if to == SessionState::Recording {
            self.start_timer(&mut inner);
        } else {
            inner.timer.cancel();
        }

        let status = inner.status.snapshot();
        self.broadcaster.publish_status(status.clone());

        if let Some(action) = event.control_action() {
            self.surfaces.broadcast_control(action).await;
        }

        Transition {
            event,
            from,
            to,
            changed: true,
            status,
        }
    }

    fn start_timer(&self, inner: &mut Inner) {
        let shared: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let clock = Arc::clone(&self.clock);
        let broadcaster = self.broadcaster.clone();

        inner.timer.restart(move || {
            let shared = shared.clone();
            let clock = Arc::clone(&clock);
            let broadcaster = broadcaster.clone();

            async move {
                let Some(shared) = shared.upgrade() else {
                    return false;
                };

                let status = {
                    let mut inner = shared.lock().await;
                    // A pause or stop may have landed while this tick waited
                    if inner.status.state != SessionState::Recording {
                        return false;
                    }
                    inner.status.refresh(clock.now_ms());
                    inner.status.snapshot()
                };

                broadcaster.publish_status(status);
                true
            }
        });
    }
}
