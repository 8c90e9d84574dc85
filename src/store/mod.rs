pub mod devices;
pub mod ids;
pub mod metrics;
pub mod models;
pub mod sessions;

pub use metrics::StatsSnapshot;
pub use models::{
    DeviceRecord, EncryptedPayload, Message, MessageKind, PeerSet, Session, Tier, SESSION_CAPACITY,
};
pub use sessions::{HeartbeatOutcome, SessionStatus, SessionStore, StoreConfig, UNKNOWN_SENDER};
