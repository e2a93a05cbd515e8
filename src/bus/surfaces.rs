use super::messages::ControlAction;
use crate::error::RecorderError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Control actions queued per surface before new ones are dropped
const CONTROL_QUEUE_DEPTH: usize = 16;

/// A surface that can receive control actions
struct Surface {
    token: u64,
    location: String,
    tx: mpsc::Sender<ControlAction>,
}

/// Handle returned to a surface when it registers
#[derive(Debug)]
pub struct Registration {
    pub id: String,

    /// Distinguishes this registration from a later one reusing the same id
    pub token: u64,

    pub control: mpsc::Receiver<ControlAction>,
}

/// Open surfaces, keyed by surface (tab) id.
///
/// Only surfaces whose location starts with the recording-page prefix get
/// control actions; everything else just listens to the status broadcast.
pub struct SurfaceRegistry {
    recording_page: String,
    next_token: AtomicU64,
    surfaces: Mutex<HashMap<String, Surface>>,
}

impl SurfaceRegistry {
    pub fn new(recording_page: impl Into<String>) -> Self {
        Self {
            recording_page: recording_page.into(),
            next_token: AtomicU64::new(1),
            surfaces: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_recording_page(&self, location: &str) -> bool {
        location.starts_with(&self.recording_page)
    }

    /// Register a surface, replacing any earlier registration under the same id
    pub async fn register(&self, id: impl Into<String>, location: impl Into<String>) -> Registration {
        let id = id.into();
        let location = location.into();
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        let (tx, control) = mpsc::channel(CONTROL_QUEUE_DEPTH);

        info!("Surface {} registered at {}", id, location);

        let mut surfaces = self.surfaces.lock().await;
        surfaces.insert(
            id.clone(),
            Surface {
                token,
                location,
                tx,
            },
        );

        Registration { id, token, control }
    }

    /// Remove a registration.
    ///
    /// Returns `Some(true)` when the removed surface was a recording page,
    /// `None` when the registration was already gone or superseded.
    pub async fn deregister(&self, id: &str, token: u64) -> Option<bool> {
        let mut surfaces = self.surfaces.lock().await;

        if surfaces.get(id).map(|s| s.token) != Some(token) {
            return None;
        }

        let surface = surfaces.remove(id)?;
        info!("Surface {} closed", id);
        Some(self.is_recording_page(&surface.location))
    }

    pub async fn recording_page_count(&self) -> usize {
        let surfaces = self.surfaces.lock().await;
        surfaces
            .values()
            .filter(|s| self.is_recording_page(&s.location))
            .count()
    }

    /// Forward an action to every recording page. Returns how many took it.
    ///
    /// Delivery is best effort. A page whose stream already closed stays
    /// registered until its own deregister, which is what ends the session.
    pub async fn broadcast_control(&self, action: ControlAction) -> usize {
        let surfaces = self.surfaces.lock().await;
        let mut delivered = 0;

        for (id, surface) in surfaces.iter() {
            if !self.is_recording_page(&surface.location) {
                continue;
            }

            match surface.tx.try_send(action) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Control queue full for surface {}, dropping {:?}", id, action);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Surface {} is closing, {:?} not delivered", id, action);
                }
            }
        }

        if delivered == 0 {
            debug!("{}", RecorderError::NoListener(format!("{:?}", action)));
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "chrome-extension://recorder/index.html";

    #[tokio::test]
    async fn test_control_reaches_only_recording_pages() {
        let registry = SurfaceRegistry::new(PAGE);
        let mut page = registry.register("tab-1", format!("{}?auto=1", PAGE)).await;
        let mut popup = registry
            .register("popup", "chrome-extension://recorder/popup.html")
            .await;

        assert_eq!(registry.broadcast_control(ControlAction::Pause).await, 1);
        assert_eq!(page.control.recv().await, Some(ControlAction::Pause));
        assert!(popup.control.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_recipient_is_not_an_error() {
        let registry = SurfaceRegistry::new(PAGE);
        assert_eq!(registry.broadcast_control(ControlAction::Stop).await, 0);
    }

    #[tokio::test]
    async fn test_closing_page_stays_until_deregistered() {
        let registry = SurfaceRegistry::new(PAGE);
        let page = registry.register("tab-1", PAGE).await;
        let token = page.token;
        drop(page);

        assert_eq!(registry.broadcast_control(ControlAction::Start).await, 0);
        assert_eq!(registry.recording_page_count().await, 1);
        assert_eq!(registry.deregister("tab-1", token).await, Some(true));
    }

    #[tokio::test]
    async fn test_stale_deregister_keeps_newer_registration() {
        let registry = SurfaceRegistry::new(PAGE);
        let first = registry.register("tab-1", PAGE).await;
        let second = registry.register("tab-1", PAGE).await;

        assert_eq!(registry.deregister("tab-1", first.token).await, None);
        assert_eq!(registry.recording_page_count().await, 1);
        assert_eq!(registry.deregister("tab-1", second.token).await, Some(true));
        assert_eq!(registry.recording_page_count().await, 0);
    }
}
