//! Login event types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used for every optional field that is absent from a raw event
pub const UNKNOWN: &str = "unknown";

/// Timestamp as it appears on the wire
///
/// Producers are inconsistent: some send epoch seconds as a JSON number,
/// others as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Integral JSON number
    Integer(i64),
    /// Fractional JSON number (truncated toward zero on conversion)
    Float(f64),
    /// JSON string, expected to hold a base-10 integer
    Text(String),
}

impl RawTimestamp {
    /// Interpret the value as Unix epoch seconds
    ///
    /// Returns `None` when the value cannot be read as an integer.
    pub fn to_epoch_seconds(&self) -> Option<i64> {
        match self {
            RawTimestamp::Integer(secs) => Some(*secs),
            RawTimestamp::Float(value) => {
                let truncated = value.trunc();
                if truncated.is_finite()
                    && truncated >= i64::MIN as f64
                    && truncated <= i64::MAX as f64
                {
                    Some(truncated as i64)
                } else {
                    None
                }
            }
            RawTimestamp::Text(text) => text.trim().parse::<i64>().ok(),
        }
    }

    /// True for a zero-length string value
    ///
    /// Whitespace is content here; it fails conversion instead.
    pub fn is_empty(&self) -> bool {
        matches!(self, RawTimestamp::Text(text) if text.is_empty())
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Integer(secs) => write!(f, "{}", secs),
            RawTimestamp::Float(value) => write!(f, "{}", value),
            RawTimestamp::Text(text) => write!(f, "{:?}", text),
        }
    }
}

impl From<i64> for RawTimestamp {
    fn from(secs: i64) -> Self {
        RawTimestamp::Integer(secs)
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        RawTimestamp::Text(text.to_string())
    }
}

/// One login event as received from the input stream
///
/// Every field is optional on the wire; required-field checks happen
/// during enrichment, not during decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

impl RawEvent {
    /// Create an event with the two required fields set
    pub fn new(user_id: impl Into<String>, timestamp: impl Into<RawTimestamp>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            timestamp: Some(timestamp.into()),
            ..Default::default()
        }
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Decode an event from a JSON payload
    pub fn from_json(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    pub fn app_version_or_default(&self) -> &str {
        self.app_version.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn ip_or_default(&self) -> &str {
        self.ip.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn locale_or_default(&self) -> &str {
        self.locale.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn device_id_or_default(&self) -> &str {
        self.device_id.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn device_type_or_default(&self) -> &str {
        self.device_type.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Mobile platforms accepted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Android,
    Ios,
}

impl DeviceType {
    /// Case-insensitive parse; anything other than android/ios is rejected
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "android" => Some(DeviceType::Android),
            "ios" => Some(DeviceType::Ios),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Android => "android",
            DeviceType::Ios => "ios",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login event annotated with cross-message analytics
///
/// Field order is the published JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub user_id: String,
    pub app_version: String,
    /// Accepted logins seen so far for this app version, this one included
    pub total_logins_for_version: u64,
    pub ip: String,
    /// This user has logged in from this exact IP before
    pub suspicious_login: bool,
    /// This user has more than one distinct IP on record
    pub logs_from_multiple_locations: bool,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, or `invalid_timestamp`
    pub normalized_timestamp: String,
    pub locale: String,
    pub total_logins_from_locale: u64,
    pub device_id: String,
    /// More than one distinct user has been seen on this device
    pub shared_device: bool,
    pub device_type: String,
    pub most_common_device_type: String,
}

impl EnrichedEvent {
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
