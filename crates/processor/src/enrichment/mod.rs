//! Login event enrichment
//!
//! The engine turns one [`RawEvent`] into one [`EnrichedEvent`] or a
//! [`DropReason`], consulting and updating a [`LoginStateStore`] on the way.
//!
//! Processing order, each step able to end in a drop:
//!
//! 1. `user_id` and `timestamp` must be present and non-empty
//! 2. the lowercased device type must be `android` or `ios`
//! 3. count the login against its app version
//! 4. record the IP in the user's history (repeat IP => suspicious)
//! 5. normalize the timestamp (falls back to `invalid_timestamp`)
//! 6. count the login against its locale
//! 7. record the user in the device's history
//! 8. count the device type and pick the most common one
//!
//! State changes made by steps 3-8 are not rolled back if a later step fails.

mod outcome;
mod timestamp;

pub use outcome::{DropReason, EnrichmentOutcome};
pub use timestamp::{format_epoch_seconds, normalize_timestamp, INVALID_TIMESTAMP, TIMESTAMP_FORMAT};

use login_pipeline_types::{DeviceType, EnrichedEvent, RawEvent, RawTimestamp, UNKNOWN};
use tracing::{debug, error, warn};

use crate::error::StateResult;
use crate::state::{Category, LoginStateStore};

/// Stateful enrichment engine
///
/// ## Example
///
/// ```rust
/// use login_processor::enrichment::EnrichmentEngine;
/// use login_processor::state::InMemoryLoginState;
/// use login_pipeline_types::RawEvent;
///
/// let mut engine = EnrichmentEngine::new(InMemoryLoginState::new());
/// let event = RawEvent::new("u1", 0).with_device_type("android").with_ip("1.1.1.1");
///
/// let first = engine.enrich(&event).into_enriched().unwrap();
/// assert!(!first.suspicious_login);
///
/// let second = engine.enrich(&event).into_enriched().unwrap();
/// assert!(second.suspicious_login);
/// ```
#[derive(Debug)]
pub struct EnrichmentEngine<S> {
    state: S,
}

impl<S: LoginStateStore> EnrichmentEngine<S> {
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// Read access to the accumulated state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Enrich one event
    pub fn enrich(&mut self, raw: &RawEvent) -> EnrichmentOutcome {
        let user_id = match raw.user_id.as_deref() {
            Some(user_id) if !user_id.is_empty() => user_id,
            _ => {
                warn!("Dropping event: missing user_id");
                return EnrichmentOutcome::Dropped(DropReason::MissingField("user_id"));
            }
        };

        let timestamp = match raw.timestamp.as_ref() {
            Some(timestamp) if !timestamp.is_empty() => timestamp,
            _ => {
                warn!(user_id, "Dropping event: missing timestamp");
                return EnrichmentOutcome::Dropped(DropReason::MissingField("timestamp"));
            }
        };

        let device_type = match DeviceType::parse(raw.device_type_or_default()) {
            Some(device_type) => device_type,
            None => {
                let rejected = raw.device_type_or_default().to_lowercase();
                debug!(user_id, device_type = %rejected, "Skipping non-mobile device");
                return EnrichmentOutcome::Dropped(DropReason::FilteredDeviceType(rejected));
            }
        };

        match self.apply(raw, user_id, timestamp, device_type) {
            Ok(event) => EnrichmentOutcome::Enriched(event),
            Err(e) => {
                error!(user_id, error = %e, "Error processing message");
                EnrichmentOutcome::Dropped(DropReason::Fault(e.to_string()))
            }
        }
    }

    /// Steps 3-8; everything here mutates state
    fn apply(
        &mut self,
        raw: &RawEvent,
        user_id: &str,
        timestamp: &RawTimestamp,
        device_type: DeviceType,
    ) -> StateResult<EnrichedEvent> {
        let app_version = raw.app_version_or_default();
        let ip = raw.ip_or_default();
        let locale = raw.locale_or_default();
        let device_id = raw.device_id_or_default();

        let total_logins_for_version = self
            .state
            .increment_and_get(Category::AppVersion, app_version)?;

        let sighting = self.state.record_login(user_id, ip)?;

        let normalized_timestamp = normalize_timestamp(timestamp);
        if normalized_timestamp == INVALID_TIMESTAMP {
            warn!(user_id, timestamp = %timestamp, "Invalid timestamp");
        }

        let total_logins_from_locale = self.state.increment_and_get(Category::Locale, locale)?;

        let shared_device = self.state.record_device_use(device_id, user_id)?;

        self.state
            .increment_and_get(Category::DeviceType, device_type.as_str())?;
        let most_common_device_type = self
            .state
            .most_frequent(Category::DeviceType)
            .unwrap_or_else(|| UNKNOWN.to_string());

        Ok(EnrichedEvent {
            user_id: user_id.to_string(),
            app_version: app_version.to_string(),
            total_logins_for_version,
            ip: ip.to_string(),
            suspicious_login: sighting.repeat_ip,
            logs_from_multiple_locations: sighting.distinct_ips > 1,
            normalized_timestamp,
            locale: locale.to_string(),
            total_logins_from_locale,
            device_id: device_id.to_string(),
            shared_device,
            device_type: device_type.as_str().to_string(),
            most_common_device_type,
        })
    }
}
