//! In-memory state store
//!
//! Single-owner implementation backed by standard hash maps. It needs no
//! locking because the pipeline driver is its only user.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use super::store::{Category, IpSighting, LoginStateStore, StateStats};
use crate::error::{StateError, StateResult};

/// Running counts for one category plus the current leader
#[derive(Debug, Clone, Default)]
struct CategoryCounter {
    counts: HashMap<String, u64>,
    /// Key holding the maximum count and that count
    leader: Option<(String, u64)>,
}

impl CategoryCounter {
    fn increment(&mut self, category: Category, key: &str) -> StateResult<u64> {
        let current = self.counts.get(key).copied().unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| StateError::CounterOverflow {
                category: category.to_string(),
                key: key.to_string(),
            })?;

        match self.counts.get_mut(key) {
            Some(count) => *count = next,
            None => {
                self.counts.insert(key.to_string(), next);
            }
        }

        // Only a strictly greater count takes the lead, so the first key to
        // reach a count keeps it on a tie.
        let overtakes = match &self.leader {
            Some((_, leading)) => next > *leading,
            None => true,
        };
        if overtakes {
            self.leader = Some((key.to_string(), next));
        } else if let Some((leader, leading)) = &mut self.leader {
            if leader == key {
                *leading = next;
            }
        }

        Ok(next)
    }

    fn leader(&self) -> Option<&str> {
        self.leader.as_ref().map(|(key, _)| key.as_str())
    }

    fn len(&self) -> usize {
        self.counts.len()
    }
}

/// In-memory login state
///
/// ## Example
///
/// ```rust
/// use login_processor::state::{InMemoryLoginState, LoginStateStore};
///
/// let mut state = InMemoryLoginState::new();
/// assert!(!state.record_device_use("device-1", "alice").unwrap());
/// assert!(state.record_device_use("device-1", "bob").unwrap());
/// assert_eq!(state.stats().devices, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoginState {
    user_ips: HashMap<String, HashSet<String>>,
    device_users: HashMap<String, HashSet<String>>,
    app_versions: CategoryCounter,
    locales: CategoryCounter,
    device_types: CategoryCounter,
}

impl InMemoryLoginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a category value, zero if never seen
    pub fn count(&self, category: Category, key: &str) -> u64 {
        self.counter(category).counts.get(key).copied().unwrap_or(0)
    }

    /// Distinct IPs recorded for a user
    pub fn distinct_ips(&self, user_id: &str) -> usize {
        self.user_ips.get(user_id).map_or(0, HashSet::len)
    }

    /// Distinct users recorded for a device
    pub fn distinct_users(&self, device_id: &str) -> usize {
        self.device_users.get(device_id).map_or(0, HashSet::len)
    }

    fn counter(&self, category: Category) -> &CategoryCounter {
        match category {
            Category::AppVersion => &self.app_versions,
            Category::Locale => &self.locales,
            Category::DeviceType => &self.device_types,
        }
    }

    fn counter_mut(&mut self, category: Category) -> &mut CategoryCounter {
        match category {
            Category::AppVersion => &mut self.app_versions,
            Category::Locale => &mut self.locales,
            Category::DeviceType => &mut self.device_types,
        }
    }
}

impl LoginStateStore for InMemoryLoginState {
    fn record_login(&mut self, user_id: &str, ip: &str) -> StateResult<IpSighting> {
        let ips = self.user_ips.entry(user_id.to_string()).or_default();
        let repeat_ip = !ips.insert(ip.to_string());

        trace!(user_id, ip, repeat_ip, distinct_ips = ips.len(), "Recorded login IP");

        Ok(IpSighting {
            repeat_ip,
            distinct_ips: ips.len(),
        })
    }

    fn record_device_use(&mut self, device_id: &str, user_id: &str) -> StateResult<bool> {
        let users = self.device_users.entry(device_id.to_string()).or_default();
        users.insert(user_id.to_string());
        Ok(users.len() > 1)
    }

    fn increment_and_get(&mut self, category: Category, key: &str) -> StateResult<u64> {
        self.counter_mut(category).increment(category, key)
    }

    fn most_frequent(&self, category: Category) -> Option<String> {
        self.counter(category).leader().map(str::to_string)
    }

    fn stats(&self) -> StateStats {
        StateStats {
            users: self.user_ips.len(),
            devices: self.device_users.len(),
            app_versions: self.app_versions.len(),
            locales: self.locales.len(),
            device_types: self.device_types.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_ip_detection() {
        let mut state = InMemoryLoginState::new();

        let first = state.record_login("u1", "1.1.1.1").unwrap();
        assert_eq!(first, IpSighting { repeat_ip: false, distinct_ips: 1 });

        let repeat = state.record_login("u1", "1.1.1.1").unwrap();
        assert_eq!(repeat, IpSighting { repeat_ip: true, distinct_ips: 1 });

        let new_ip = state.record_login("u1", "2.2.2.2").unwrap();
        assert_eq!(new_ip, IpSighting { repeat_ip: false, distinct_ips: 2 });

        // Histories are per user
        let other_user = state.record_login("u2", "1.1.1.1").unwrap();
        assert!(!other_user.repeat_ip);
    }

    #[test]
    fn test_device_history_never_shrinks() {
        let mut state = InMemoryLoginState::new();

        assert!(!state.record_device_use("d1", "u1").unwrap());
        assert!(!state.record_device_use("d1", "u1").unwrap());
        assert!(state.record_device_use("d1", "u2").unwrap());
        assert!(state.record_device_use("d1", "u1").unwrap());
        assert_eq!(state.distinct_users("d1"), 2);
    }

    #[test]
    fn test_counters_are_per_category() {
        let mut state = InMemoryLoginState::new();

        assert_eq!(state.increment_and_get(Category::AppVersion, "1.0").unwrap(), 1);
        assert_eq!(state.increment_and_get(Category::AppVersion, "1.0").unwrap(), 2);
        assert_eq!(state.increment_and_get(Category::Locale, "1.0").unwrap(), 1);
        assert_eq!(state.count(Category::AppVersion, "1.0"), 2);
        assert_eq!(state.count(Category::DeviceType, "1.0"), 0);
    }

    #[test]
    fn test_most_frequent_first_to_reach_count_wins() {
        let mut state = InMemoryLoginState::new();
        assert_eq!(state.most_frequent(Category::DeviceType), None);

        state.increment_and_get(Category::DeviceType, "android").unwrap();
        state.increment_and_get(Category::DeviceType, "ios").unwrap();
        // android reached 1 first
        assert_eq!(state.most_frequent(Category::DeviceType).as_deref(), Some("android"));

        state.increment_and_get(Category::DeviceType, "ios").unwrap();
        assert_eq!(state.most_frequent(Category::DeviceType).as_deref(), Some("ios"));

        // android ties at 2, ios got there first
        state.increment_and_get(Category::DeviceType, "android").unwrap();
        assert_eq!(state.most_frequent(Category::DeviceType).as_deref(), Some("ios"));

        state.increment_and_get(Category::DeviceType, "android").unwrap();
        assert_eq!(state.most_frequent(Category::DeviceType).as_deref(), Some("android"));
    }

    #[test]
    fn test_leader_count_follows_its_own_increments() {
        let mut state = InMemoryLoginState::new();

        for _ in 0..3 {
            state.increment_and_get(Category::Locale, "RU").unwrap();
        }
        for _ in 0..3 {
            state.increment_and_get(Category::Locale, "PL").unwrap();
        }
        assert_eq!(state.most_frequent(Category::Locale).as_deref(), Some("RU"));

        state.increment_and_get(Category::Locale, "PL").unwrap();
        assert_eq!(state.most_frequent(Category::Locale).as_deref(), Some("PL"));
    }

    #[test]
    fn test_counter_overflow_leaves_state_untouched() {
        let mut counter = CategoryCounter::default();
        counter.counts.insert("x".to_string(), u64::MAX);
        counter.leader = Some(("x".to_string(), u64::MAX));

        let err = counter.increment(Category::AppVersion, "x").unwrap_err();
        assert!(matches!(err, StateError::CounterOverflow { .. }));
        assert_eq!(counter.counts.get("x"), Some(&u64::MAX));
    }

    #[test]
    fn test_stats() {
        let mut state = InMemoryLoginState::new();
        state.record_login("u1", "1.1.1.1").unwrap();
        state.record_login("u2", "1.1.1.1").unwrap();
        state.record_device_use("d1", "u1").unwrap();
        state.increment_and_get(Category::Locale, "RU").unwrap();
        state.increment_and_get(Category::Locale, "PL").unwrap();

        let stats = state.stats();
        assert_eq!(stats.users, 2);
        assert_eq!(stats.devices, 1);
        assert_eq!(stats.locales, 2);
        assert_eq!(stats.app_versions, 0);
    }
}
