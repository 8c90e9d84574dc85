use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::store::models::{DeviceRecord, Tier};

/// Process-lifetime registry of devices.
///
/// Records are created on first sight with free tier and a zeroed image
/// counter, and are never deleted. The counter resets lazily: any access
/// after the quota window has elapsed zeroes it before returning.
#[derive(Debug)]
pub struct DeviceRegistry {
    records: HashMap<String, DeviceRecord>,
    quota_window: Duration,
}

impl DeviceRegistry {
    pub fn new(quota_window: Duration) -> Self {
        Self {
            records: HashMap::new(),
            quota_window,
        }
    }

    pub fn get_or_create(&mut self, device_id: &str, now: Instant) -> &mut DeviceRecord {
        let record = self
            .records
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceRecord {
                device_id: device_id.to_string(),
                tier: Tier::Free,
                daily_image_count: 0,
                last_reset_at: now,
            });

        if now.duration_since(record.last_reset_at) > self.quota_window {
            record.daily_image_count = 0;
            record.last_reset_at = now;
        }

        record
    }

    /// The relay itself never changes tiers; this is the seam for an
    /// external upgrade path (billing, admin tooling).
    pub fn set_tier(&mut self, device_id: &str, tier: Tier, now: Instant) {
        self.get_or_create(device_id, now).tier = tier;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sight_defaults() {
        let mut registry = DeviceRegistry::new(Duration::from_secs(86_400));
        let now = Instant::now();

        let record = registry.get_or_create("dev1", now);
        assert_eq!(record.tier, Tier::Free);
        assert_eq!(record.daily_image_count, 0);
    }

    #[test]
    fn test_counter_survives_within_window() {
        let mut registry = DeviceRegistry::new(Duration::from_secs(86_400));
        let now = Instant::now();

        registry.get_or_create("dev1", now).daily_image_count = 3;
        let record = registry.get_or_create("dev1", now);
        assert_eq!(record.daily_image_count, 3);
    }

    #[test]
    fn test_counter_resets_after_window() {
        let mut registry = DeviceRegistry::new(Duration::from_millis(20));
        let now = Instant::now();

        registry.get_or_create("dev1", now).daily_image_count = 5;
        std::thread::sleep(Duration::from_millis(40));

        let later = Instant::now();
        let record = registry.get_or_create("dev1", later);
        assert_eq!(record.daily_image_count, 0);
        assert_eq!(record.last_reset_at, later);
    }

    #[test]
    fn test_set_tier() {
        let mut registry = DeviceRegistry::new(Duration::from_secs(86_400));
        let now = Instant::now();

        registry.set_tier("dev1", Tier::Pro, now);
        assert_eq!(registry.get_or_create("dev1", now).tier, Tier::Pro);
    }
}
