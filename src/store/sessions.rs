use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::AppError;
use crate::store::devices::DeviceRegistry;
use crate::store::ids::new_id;
use crate::store::metrics::{RelayMetrics, StatsSnapshot};
use crate::store::models::{EncryptedPayload, Message, MessageKind, PeerSet, Session, Tier};

/// Sentinel recorded when a message arrives without a sender id.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Tunable lifetimes and quotas for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Lifetime of sessions created by free-tier devices.
    pub session_ttl: Duration,
    /// A peer silent for longer than this is considered gone.
    pub offline_timeout: Duration,
    /// Images a free-tier device may send per quota window.
    pub daily_image_quota: u32,
    /// Rolling window for the image quota.
    pub quota_window: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(600),
            offline_timeout: Duration::from_secs(20),
            daily_image_quota: 5,
            quota_window: Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionStatus {
    pub active: bool,
    pub participant_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatOutcome {
    /// True when this heartbeat detected a stale peer and burned the
    /// session.
    pub ended: bool,
}

struct Inner {
    sessions: HashMap<String, Session>,
    devices: DeviceRegistry,
    metrics: RelayMetrics,
    next_seq: u64,
}

/// Handle to the relay's session and device state.
///
/// All state lives behind one mutex, so operations are atomic with
/// respect to each other: a join racing a create on the same code sees a
/// consistent participant count, and a heartbeat-triggered burn can never
/// interleave with an in-flight message append. There is no background
/// sweeper; expiry and staleness are checked only when a session is
/// touched.
#[derive(Clone)]
pub struct SessionStore {
    config: StoreConfig,
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        let devices = DeviceRegistry::new(config.quota_window);
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                sessions: HashMap::new(),
                devices,
                metrics: RelayMetrics::default(),
                next_seq: 0,
            })),
        }
    }

    /// Create a session with the caller as sole participant.
    ///
    /// The rendezvous code is not required to be unique across sessions;
    /// collisions are resolved at join time. Free-tier creators get a
    /// fixed expiry deadline, pro creators none.
    pub async fn create_session(&self, code: &str, device_id: &str) -> Result<String, AppError> {
        validate_code(code)?;
        validate_device_id(device_id)?;

        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let tier = inner.devices.get_or_create(device_id, now).tier;
        let expires_at = match tier {
            Tier::Free => Some(now + self.config.session_ttl),
            Tier::Pro => None,
        };

        let id = new_id();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let mut session = Session {
            id: id.clone(),
            code: code.to_string(),
            active: true,
            participants: PeerSet::default(),
            last_seen: HashMap::new(),
            expires_at,
            messages: Vec::new(),
            created_seq: seq,
        };
        session.participants.insert(device_id);
        session.last_seen.insert(device_id.to_string(), now);
        inner.sessions.insert(id.clone(), session);

        inner.metrics.record_session_created();
        inner.metrics.record_device_seen(device_id);

        tracing::debug!(session_id = %id, "session created");
        Ok(id)
    }

    /// Join the session advertising `code`.
    ///
    /// When several active sessions share a code, the earliest-created
    /// one wins. A resolved session past its deadline is burned in place
    /// and the join fails; the caller has to start a fresh handshake.
    /// Re-joining a session the device already belongs to succeeds and
    /// refreshes its liveness.
    pub async fn join_session(&self, code: &str, device_id: &str) -> Result<String, AppError> {
        validate_code(code)?;
        validate_device_id(device_id)?;

        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let resolved = inner
            .sessions
            .values()
            .filter(|s| s.active && s.code == code)
            .min_by_key(|s| s.created_seq)
            .map(|s| s.id.clone());

        let id = resolved
            .ok_or_else(|| AppError::NotFound("no active session for code".to_string()))?;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal("resolved session vanished".to_string()))?;

        if session.is_expired(now) {
            session.burn();
            tracing::debug!(session_id = %id, "expired session burned on join");
            return Err(AppError::NotFound("session expired".to_string()));
        }

        if session.participants.contains(device_id) {
            session.last_seen.insert(device_id.to_string(), now);
            return Ok(id);
        }
        if session.participants.is_full() {
            return Err(AppError::CapacityExceeded);
        }

        session.participants.insert(device_id);
        session.last_seen.insert(device_id.to_string(), now);
        Ok(id)
    }

    /// End a session, clearing its membership and message ledger.
    /// Ending an already-inactive session is a no-op success.
    pub async fn end_session(&self, session_id: &str) -> Result<(), AppError> {
        let mut guard = self.inner.lock().await;
        let session = guard
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("unknown session".to_string()))?;

        if session.active {
            session.burn();
            tracing::debug!(session_id = %session_id, "session ended");
        }
        Ok(())
    }

    /// Best-effort probe. Never fails: unknown sessions report inactive
    /// and empty. Performs no expiry check, so a deadline-passed session
    /// nothing has touched still reports active.
    pub async fn status(&self, session_id: &str) -> SessionStatus {
        let guard = self.inner.lock().await;
        match guard.sessions.get(session_id) {
            Some(s) => SessionStatus {
                active: s.active,
                participant_count: s.participants.len(),
            },
            None => SessionStatus {
                active: false,
                participant_count: 0,
            },
        }
    }

    /// Record a liveness ping and check the peer for staleness.
    ///
    /// A heartbeat may itself establish membership when the session has
    /// room; join is the only operation that rejects on capacity. The
    /// insert goes through the bounded set, so a third device can ping a
    /// full session without ever growing it, and its liveness is not
    /// recorded (a stranger's silence must not burn a healthy pair).
    ///
    /// Staleness is peer-relative: once two devices have reported in, any
    /// *other* device silent past the offline timeout burns the session.
    pub async fn heartbeat(
        &self,
        session_id: &str,
        device_id: &str,
    ) -> Result<HeartbeatOutcome, AppError> {
        validate_device_id(device_id)?;

        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let session = guard
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("unknown session".to_string()))?;
        if !session.active {
            return Err(AppError::NotFound("session inactive".to_string()));
        }

        if session.participants.insert(device_id) {
            session.last_seen.insert(device_id.to_string(), now);
        }

        if session.last_seen.len() >= 2 {
            let stale_peer = session.last_seen.iter().any(|(peer, seen)| {
                peer != device_id && now.duration_since(*seen) > self.config.offline_timeout
            });
            if stale_peer {
                session.burn();
                tracing::debug!(session_id = %session_id, "stale peer, session burned");
                return Ok(HeartbeatOutcome { ended: true });
            }
        }

        Ok(HeartbeatOutcome { ended: false })
    }

    /// Append an encrypted envelope to an active session.
    ///
    /// Runs the same lazy-expiry burn as join. The payload is checked for
    /// structural presence only and stored verbatim; the returned message
    /// is the stored one, not a transformed view. Image sends from
    /// free-tier devices are counted against the daily quota.
    pub async fn post_message(
        &self,
        session_id: &str,
        sender_id: Option<String>,
        kind: MessageKind,
        ciphertext: Option<String>,
        nonce: Option<String>,
        file_name: Option<String>,
    ) -> Result<Message, AppError> {
        let ciphertext = ciphertext
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::InvalidInput("payload is missing ciphertext".to_string()))?;
        let nonce = nonce
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::InvalidInput("payload is missing nonce".to_string()))?;

        let sender_id = sender_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let session = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("unknown session".to_string()))?;
        if !session.active {
            return Err(AppError::NotFound("session inactive".to_string()));
        }
        if session.is_expired(now) {
            session.burn();
            tracing::debug!(session_id = %session_id, "expired session burned on post");
            return Err(AppError::NotFound("session expired".to_string()));
        }

        if kind == MessageKind::Image {
            let record = inner.devices.get_or_create(&sender_id, now);
            if record.tier == Tier::Free && record.daily_image_count >= self.config.daily_image_quota
            {
                return Err(AppError::QuotaExceeded);
            }
            record.daily_image_count += 1;
        }

        let message = Message {
            id: new_id(),
            sender_id,
            kind,
            payload: EncryptedPayload { ciphertext, nonce },
            file_name: match kind {
                MessageKind::Image => file_name,
                MessageKind::Text => None,
            },
            created_at: chrono::Utc::now().timestamp(),
        };
        session.messages.push(message.clone());
        inner.metrics.record_message_stored();

        Ok(message)
    }

    /// All messages of an active session in append order. Runs the same
    /// lazy-expiry burn as post_message.
    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, AppError> {
        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        let session = guard
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound("unknown session".to_string()))?;
        if !session.active {
            return Err(AppError::NotFound("session inactive".to_string()));
        }
        if session.is_expired(now) {
            session.burn();
            tracing::debug!(session_id = %session_id, "expired session burned on list");
            return Err(AppError::NotFound("session expired".to_string()));
        }

        Ok(session.messages.clone())
    }

    pub async fn stats(&self) -> StatsSnapshot {
        let guard = self.inner.lock().await;
        StatsSnapshot {
            sessions_created: guard.metrics.sessions_created(),
            active_sessions: guard.sessions.values().filter(|s| s.active).count(),
            devices_seen: guard.metrics.devices_seen(),
            messages_stored: guard.metrics.messages_stored(),
        }
    }

    /// Tier changes come from outside the relay (billing, admin tooling);
    /// this forwards to the registry seam.
    pub async fn set_device_tier(&self, device_id: &str, tier: Tier) {
        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        guard.devices.set_tier(device_id, tier, now);
    }
}

fn validate_code(code: &str) -> Result<(), AppError> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(
            "code must be exactly 6 digits".to_string(),
        ));
    }
    Ok(())
}

fn validate_device_id(device_id: &str) -> Result<(), AppError> {
    if device_id.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "deviceId must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("123456").is_ok());
        assert!(validate_code("000000").is_ok());
        assert!(validate_code("12345").is_err());
        assert!(validate_code("1234567").is_err());
        assert!(validate_code("12345a").is_err());
        assert!(validate_code("").is_err());
    }

    #[test]
    fn test_validate_device_id() {
        assert!(validate_device_id("dev1").is_ok());
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id("   ").is_err());
    }
}
