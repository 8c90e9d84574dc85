use std::collections::HashSet;

use serde::Serialize;

/// Counters bumped by the session store as lifecycle side effects.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    sessions_created: u64,
    messages_stored: u64,
    devices_seen: HashSet<String>,
}

impl RelayMetrics {
    pub fn record_session_created(&mut self) {
        self.sessions_created += 1;
    }

    pub fn record_device_seen(&mut self, device_id: &str) {
        if !self.devices_seen.contains(device_id) {
            self.devices_seen.insert(device_id.to_string());
        }
    }

    pub fn record_message_stored(&mut self) {
        self.messages_stored += 1;
    }

    pub fn sessions_created(&self) -> u64 {
        self.sessions_created
    }

    pub fn messages_stored(&self) -> u64 {
        self.messages_stored
    }

    pub fn devices_seen(&self) -> usize {
        self.devices_seen.len()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub sessions_created: u64,
    /// Count of sessions whose `active` flag is still set. Expiry is
    /// lazy, so sessions past their deadline that nothing has touched
    /// since are still counted here.
    pub active_sessions: usize,
    pub devices_seen: usize,
    pub messages_stored: u64,
}
