//! State store trait definition
//!
//! This module defines the `LoginStateStore` trait that the enrichment engine
//! is written against. Keeping the engine generic over the store lets the
//! single-owner store used by the sequential pipeline be swapped for a
//! synchronized one without touching enrichment logic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StateResult;

/// Counted login attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AppVersion,
    Locale,
    DeviceType,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::AppVersion, Category::Locale, Category::DeviceType];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AppVersion => "app_version",
            Category::Locale => "locale",
            Category::DeviceType => "device_type",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of recording a login IP for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpSighting {
    /// The IP was already on record for this user before this login
    pub repeat_ip: bool,
    /// Distinct IPs on record for this user after this login
    pub distinct_ips: usize,
}

/// Cardinality snapshot of a state store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStats {
    /// Users with at least one recorded IP
    pub users: usize,
    /// Devices with at least one recorded user
    pub devices: usize,
    /// Distinct app versions counted
    pub app_versions: usize,
    /// Distinct locales counted
    pub locales: usize,
    /// Distinct device types counted
    pub device_types: usize,
}

/// Core trait for login state storage
///
/// Every method is a complete read-modify-write step. Implementations shared
/// between tasks must serialize each call as a whole; interleaving two
/// `record_login` calls for the same user would break repeat-IP detection.
pub trait LoginStateStore: Send {
    /// Add `ip` to the history of `user_id`
    ///
    /// `repeat_ip` reports whether the IP was already recorded for that user.
    fn record_login(&mut self, user_id: &str, ip: &str) -> StateResult<IpSighting>;

    /// Add `user_id` to the history of `device_id`
    ///
    /// Returns true if more than one distinct user is now on record for the device.
    fn record_device_use(&mut self, device_id: &str, user_id: &str) -> StateResult<bool>;

    /// Increment the counter for `key` in `category` and return the new count
    fn increment_and_get(&mut self, category: Category, key: &str) -> StateResult<u64>;

    /// Category value with the highest count so far
    ///
    /// On a tie the value that reached the count first wins. Returns `None`
    /// if nothing has been counted in the category yet.
    fn most_frequent(&self, category: Category) -> Option<String>;

    /// Current cardinalities
    fn stats(&self) -> StateStats;
}
