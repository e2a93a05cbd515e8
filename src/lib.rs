pub mod app;
pub mod bus;
pub mod capture;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod media;
pub mod nats;
pub mod protocol;
pub mod session;

pub use app::build_background;
pub use bus::{Broadcaster, BusMessage, ControlAction, Notice, SurfaceRegistry};
pub use capture::{CaptureConstraints, CaptureSource, Encoder, MediaStream, RecordingPage};
pub use config::Config;
pub use error::{Disposition, RecorderError, RecorderResult};
pub use history::{HistoryStore, JsonFilePersistence, MemoryPersistence, RecordId, RecordingRecord};
pub use http::{create_router, AppState};
pub use media::{MediaFormat, MediaRequester};
pub use nats::NatsRelay;
pub use protocol::{Ack, Background, BackgroundLink, Command, Response};
pub use session::{SessionController, SessionEvent, SessionState, StatusSnapshot};
