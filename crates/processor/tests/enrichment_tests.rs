//! Behavioral tests for the enrichment engine against the in-memory store

use login_pipeline_types::{RawEvent, RawTimestamp};
use login_processor::enrichment::{DropReason, EnrichmentEngine, INVALID_TIMESTAMP};
use login_processor::state::{Category, InMemoryLoginState, LoginStateStore, StateStats};

fn engine() -> EnrichmentEngine<InMemoryLoginState> {
    EnrichmentEngine::new(InMemoryLoginState::new())
}

fn login(user: &str, device_type: &str, ip: &str, ts: i64) -> RawEvent {
    RawEvent::new(user, ts)
        .with_app_version("1.0.0")
        .with_device_type(device_type)
        .with_ip(ip)
        .with_locale("US")
        .with_device_id(format!("dev-{}", user))
}

#[test]
fn missing_required_fields_drop_without_state_change() {
    let mut engine = engine();
    engine
        .enrich(&login("seed", "android", "1.1.1.1", 0))
        .into_enriched()
        .unwrap();
    let before = engine.state().stats();

    let mut no_user = login("u1", "android", "1.1.1.1", 0);
    no_user.user_id = None;
    let mut empty_user = login("u1", "android", "1.1.1.1", 0);
    empty_user.user_id = Some(String::new());
    let mut no_timestamp = login("u1", "android", "1.1.1.1", 0);
    no_timestamp.timestamp = None;
    let mut empty_timestamp = login("u1", "android", "1.1.1.1", 0);
    empty_timestamp.timestamp = Some(RawTimestamp::Text(String::new()));

    assert_eq!(
        engine.enrich(&no_user).drop_reason(),
        Some(&DropReason::MissingField("user_id"))
    );
    assert_eq!(
        engine.enrich(&empty_user).drop_reason(),
        Some(&DropReason::MissingField("user_id"))
    );
    assert_eq!(
        engine.enrich(&no_timestamp).drop_reason(),
        Some(&DropReason::MissingField("timestamp"))
    );
    assert_eq!(
        engine.enrich(&empty_timestamp).drop_reason(),
        Some(&DropReason::MissingField("timestamp"))
    );

    assert_eq!(engine.state().stats(), before);
}

#[test]
fn whitespace_timestamp_falls_back_instead_of_dropping() {
    let mut engine = engine();
    let raw = RawEvent::from_json(
        br#"{"user_id":"u1","device_type":"android","timestamp":"   "}"#,
    )
    .unwrap();

    let event = engine.enrich(&raw).into_enriched().unwrap();

    assert_eq!(event.normalized_timestamp, INVALID_TIMESTAMP);
    assert_eq!(engine.state().count(Category::DeviceType, "android"), 1);
}

#[test]
fn non_mobile_device_types_are_filtered_without_state_change() {
    let mut engine = engine();

    for device_type in ["web", "desktop", "", "ANDROID-TV"] {
        let outcome = engine.enrich(&login("u1", device_type, "1.1.1.1", 0));
        let reason = outcome.drop_reason().cloned().unwrap();
        assert!(matches!(reason, DropReason::FilteredDeviceType(_)));
        assert!(!reason.is_error());
    }

    let mut absent = login("u1", "android", "1.1.1.1", 0);
    absent.device_type = None;
    assert!(!engine.enrich(&absent).is_enriched());

    assert_eq!(engine.state().stats(), StateStats::default());
}

#[test]
fn device_type_is_case_insensitive() {
    let mut engine = engine();

    let event = engine
        .enrich(&login("u1", "iOS", "1.1.1.1", 0))
        .into_enriched()
        .unwrap();

    assert_eq!(event.device_type, "ios");
    assert_eq!(event.most_common_device_type, "ios");
}

#[test]
fn repeat_ip_is_suspicious() {
    let mut engine = engine();

    let first = engine.enrich(&login("u1", "android", "10.0.0.1", 0)).into_enriched().unwrap();
    let second = engine.enrich(&login("u1", "android", "10.0.0.1", 1)).into_enriched().unwrap();

    assert!(!first.suspicious_login);
    assert!(second.suspicious_login);
    assert!(!second.logs_from_multiple_locations);
}

#[test]
fn new_ip_marks_multiple_locations() {
    let mut engine = engine();

    engine.enrich(&login("u1", "android", "10.0.0.1", 0)).into_enriched().unwrap();
    let second = engine.enrich(&login("u1", "android", "10.0.0.2", 1)).into_enriched().unwrap();

    assert!(!second.suspicious_login);
    assert!(second.logs_from_multiple_locations);
}

#[test]
fn ip_history_is_per_user() {
    let mut engine = engine();

    engine.enrich(&login("u1", "android", "10.0.0.1", 0)).into_enriched().unwrap();
    let other = engine.enrich(&login("u2", "android", "10.0.0.1", 1)).into_enriched().unwrap();

    assert!(!other.suspicious_login);
}

#[test]
fn shared_device_history_never_shrinks() {
    let mut engine = engine();
    let on_device = |user: &str| login(user, "ios", "1.1.1.1", 0).with_device_id("D");

    let first = engine.enrich(&on_device("U1")).into_enriched().unwrap();
    let second = engine.enrich(&on_device("U2")).into_enriched().unwrap();
    let third = engine.enrich(&on_device("U1")).into_enriched().unwrap();

    assert!(!first.shared_device);
    assert!(second.shared_device);
    assert!(third.shared_device);
}

#[test]
fn version_and_locale_totals_increase_monotonically() {
    let mut engine = engine();
    let mut last_version = 0;
    let mut last_locale = 0;

    for ts in 0..20 {
        let event = engine
            .enrich(&login(&format!("user-{}", ts % 3), "android", "1.1.1.1", ts))
            .into_enriched()
            .unwrap();

        assert_eq!(event.total_logins_for_version, last_version + 1);
        assert_eq!(event.total_logins_from_locale, last_locale + 1);
        last_version = event.total_logins_for_version;
        last_locale = event.total_logins_from_locale;
    }

    let other = engine
        .enrich(&login("u9", "android", "1.1.1.1", 0).with_app_version("2.0.0").with_locale("DE"))
        .into_enriched()
        .unwrap();
    assert_eq!(other.total_logins_for_version, 1);
    assert_eq!(other.total_logins_from_locale, 1);
}

#[test]
fn most_common_device_type_follows_first_to_reach_count() {
    let mut engine = engine();
    let mut most_common = |device_type: &str| {
        engine
            .enrich(&login("u1", device_type, "1.1.1.1", 0))
            .into_enriched()
            .unwrap()
            .most_common_device_type
    };

    assert_eq!(most_common("ios"), "ios");
    // android ties at 1, ios reached 1 first
    assert_eq!(most_common("android"), "ios");
    // android reaches 2 first
    assert_eq!(most_common("android"), "android");
    // ios ties at 2, android keeps it
    assert_eq!(most_common("ios"), "android");
    assert_eq!(most_common("ios"), "ios");
}

#[test]
fn timestamps_normalize_or_fall_back() {
    let mut engine = engine();

    let epoch = engine.enrich(&login("u1", "android", "1.1.1.1", 0)).into_enriched().unwrap();
    assert_eq!(epoch.normalized_timestamp, "1970-01-01 00:00:00");

    let text = engine
        .enrich(&RawEvent::new("u1", "1694479551").with_device_type("android"))
        .into_enriched()
        .unwrap();
    assert_eq!(text.normalized_timestamp, "2023-09-12 00:45:51");

    let garbage = engine
        .enrich(&RawEvent::new("u1", "yesterday").with_device_type("android"))
        .into_enriched()
        .unwrap();
    assert_eq!(garbage.normalized_timestamp, INVALID_TIMESTAMP);
}

#[test]
fn absent_optional_fields_use_unknown() {
    let mut engine = engine();

    let event = engine
        .enrich(&RawEvent::new("u1", 0).with_device_type("android"))
        .into_enriched()
        .unwrap();

    assert_eq!(event.app_version, "unknown");
    assert_eq!(event.ip, "unknown");
    assert_eq!(event.locale, "unknown");
    assert_eq!(event.device_id, "unknown");
    assert_eq!(engine.state().count(Category::Locale, "unknown"), 1);
}

#[test]
fn end_to_end_repeat_login() {
    let mut engine = engine();
    let first = RawEvent::from_json(
        br#"{"user_id":"u1","device_type":"android","ip":"1.1.1.1","timestamp":0}"#,
    )
    .unwrap();
    let second = RawEvent::from_json(
        br#"{"user_id":"u1","device_type":"android","ip":"1.1.1.1","timestamp":60}"#,
    )
    .unwrap();

    let first = engine.enrich(&first).into_enriched().unwrap();
    let second = engine.enrich(&second).into_enriched().unwrap();

    assert!(!first.suspicious_login);
    assert!(second.suspicious_login);
    assert_eq!(first.total_logins_for_version, 1);
    assert_eq!(second.total_logins_for_version, 2);
    assert_eq!(second.normalized_timestamp, "1970-01-01 00:01:00");
    assert_eq!(
        engine.state().most_frequent(Category::AppVersion).as_deref(),
        Some("unknown")
    );
}

#[test]
fn enriched_json_field_order() {
    let mut engine = engine();
    let event = engine.enrich(&login("u1", "android", "1.1.1.1", 0)).into_enriched().unwrap();

    let json = String::from_utf8(event.to_json().unwrap()).unwrap();
    let keys = [
        "user_id",
        "app_version",
        "total_logins_for_version",
        "ip",
        "suspicious_login",
        "logs_from_multiple_locations",
        "normalized_timestamp",
        "locale",
        "total_logins_from_locale",
        "device_id",
        "shared_device",
        "device_type",
        "most_common_device_type",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|key| json.find(&format!("\"{}\"", key)).unwrap())
        .collect();

    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!json.contains("\"timestamp\""));
}
