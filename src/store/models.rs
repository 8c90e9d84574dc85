use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Device tier. Free-tier sessions expire and free-tier image sends are
/// quota-limited; pro sessions have no deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Pro,
}

#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub device_id: String,
    pub tier: Tier,
    pub daily_image_count: u32,
    pub last_reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
}

impl MessageKind {
    /// Unknown kinds coerce to text rather than failing.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => MessageKind::Image,
            _ => MessageKind::Text,
        }
    }
}

/// Opaque ciphertext + nonce pair. The relay stores and echoes this
/// verbatim; it never decodes or inspects either component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub kind: MessageKind,
    pub payload: EncryptedPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub created_at: i64,
}

/// Maximum number of participants in a session.
pub const SESSION_CAPACITY: usize = 2;

/// Bounded set of participant device ids.
///
/// A session is a pairwise rendezvous: membership never exceeds
/// `SESSION_CAPACITY`, no matter which operation attempts the insert.
#[derive(Debug, Default)]
pub struct PeerSet {
    members: Vec<String>,
}

impl PeerSet {
    pub fn contains(&self, device_id: &str) -> bool {
        self.members.iter().any(|m| m == device_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= SESSION_CAPACITY
    }

    /// Insert if there is room. Returns true when the device is a member
    /// after the call (inserted now, or already present); false means the
    /// set was full and the device was not admitted.
    pub fn insert(&mut self, device_id: &str) -> bool {
        if self.contains(device_id) {
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.members.push(device_id.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub code: String,
    pub active: bool,
    pub participants: PeerSet,
    /// Wall-clock of each device's most recent liveness-bearing action
    /// (create, join, heartbeat). Only populated for participants.
    pub last_seen: HashMap<String, Instant>,
    /// Fixed at creation, never extended. None for pro-tier creators.
    pub expires_at: Option<Instant>,
    pub messages: Vec<Message>,
    /// Monotonic creation order, used to resolve code collisions on join.
    pub created_seq: u64,
}

impl Session {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }

    /// Burn: mark inactive and clear participants, liveness and the
    /// message ledger in one step. Irreversible; the entry itself stays
    /// in the store so later probes can answer for it.
    pub fn burn(&mut self) {
        self.active = false;
        self.participants.clear();
        self.last_seen.clear();
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_set_capacity() {
        let mut set = PeerSet::default();
        assert!(set.insert("a"));
        assert!(set.insert("b"));
        assert!(set.is_full());
        assert!(!set.insert("c"));
        assert_eq!(set.len(), 2);
        assert!(!set.contains("c"));
    }

    #[test]
    fn test_peer_set_insert_is_idempotent() {
        let mut set = PeerSet::default();
        assert!(set.insert("a"));
        assert!(set.insert("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unknown_kind_coerces_to_text() {
        assert_eq!(MessageKind::parse("image"), MessageKind::Image);
        assert_eq!(MessageKind::parse("text"), MessageKind::Text);
        assert_eq!(MessageKind::parse("video"), MessageKind::Text);
        assert_eq!(MessageKind::parse(""), MessageKind::Text);
    }

    #[test]
    fn test_burn_clears_everything() {
        let now = Instant::now();
        let mut session = Session {
            id: "s".to_string(),
            code: "123456".to_string(),
            active: true,
            participants: PeerSet::default(),
            last_seen: HashMap::new(),
            expires_at: Some(now),
            messages: Vec::new(),
            created_seq: 0,
        };
        session.participants.insert("a");
        session.last_seen.insert("a".to_string(), now);
        session.messages.push(Message {
            id: "m".to_string(),
            sender_id: "a".to_string(),
            kind: MessageKind::Text,
            payload: EncryptedPayload {
                ciphertext: "c".to_string(),
                nonce: "n".to_string(),
            },
            file_name: None,
            created_at: 0,
        });

        session.burn();

        assert!(!session.active);
        assert!(session.participants.is_empty());
        assert!(session.last_seen.is_empty());
        assert!(session.messages.is_empty());
    }
}
