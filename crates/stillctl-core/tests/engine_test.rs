#![allow(clippy::unwrap_used)]
// Integration tests for `SyncEngine` against a wiremock device.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stillctl_core::{
    Command, CoreError, EngineConfig, FlowMeter, LinkIndicator, PollPhase, RateClass,
    SubmitEncoding, SyncEngine, TankLevel,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer, poll: Duration) -> EngineConfig {
    EngineConfig {
        device_url: Url::parse(&server.uri()).unwrap(),
        timeout: Some(Duration::from_secs(5)),
        default_poll_interval: poll,
        ..EngineConfig::default()
    }
}

async fn setup() -> (MockServer, SyncEngine) {
    let server = MockServer::start().await;
    let engine = SyncEngine::new(config_for(&server, Duration::from_secs(10))).unwrap();
    (server, engine)
}

fn data_with_config() -> serde_json::Value {
    json!({
        "temp": [75.2, -1, 60.0],
        "steam": 1500,
        "heads": 300,
        "flows": [100, 40],
        "tn": [5, 8],
        "volts": 229,
        "cfg": {
            "ssid": "distillery",
            "hfr": [10, 20, 30],
            "lfr": [1, 2, 3],
            "tf": [50, 80],
            "poll": 2
        }
    })
}

fn telemetry(tn: [u32; 2]) -> serde_json::Value {
    json!({
        "temp": [76.0, 70.1],
        "steam": 1400,
        "heads": 250,
        "flows": [120, 60],
        "tn": tn,
        "volts": 230
    })
}

async fn mount_config(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("cfg", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(data_with_config()))
        .mount(server)
        .await;
}

async fn mount_telemetry(server: &MockServer, tn: [u32; 2]) {
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("cfg", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(telemetry(tn)))
        .mount(server)
        .await;
}

// ── Poll cycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_poll_pulls_config_then_telemetry_only() {
    let (server, engine) = setup().await;
    mount_config(&server).await;
    mount_telemetry(&server, [6, 9]).await;

    assert!(engine.needs_config());
    engine.poll_once().await.unwrap();

    assert!(!engine.needs_config());
    assert_eq!(engine.poll_interval(), Duration::from_secs(2));
    assert_eq!(engine.flow_lookup(RateClass::High, 2), Some(30.0));
    assert_eq!(engine.tank_lookup(TankLevel::Full, 1), Some(80.0));
    assert_eq!(engine.tank_lookup(TankLevel::Current, 1), Some(8.0));

    let snap = engine.snapshot();
    assert_eq!(snap.phase, PollPhase::SteadyState);
    assert_eq!(snap.indicator, LinkIndicator::Healthy);
    assert_eq!(snap.display.flow(FlowMeter::Still), "5 M");
    assert_eq!(snap.poll_interval_ms, 2000);

    engine.poll_once().await.unwrap();
    assert_eq!(engine.tank_lookup(TankLevel::Current, 0), Some(6.0));
    assert_eq!(engine.tank_lookup(TankLevel::Full, 0), Some(50.0));
    assert_eq!(
        engine.config_snapshot().unwrap().ssid.as_deref(),
        Some("distillery")
    );

    let requests = server.received_requests().await.unwrap();
    let queries: Vec<_> = requests.iter().map(|r| r.url.query().map(str::to_owned)).collect();
    assert_eq!(
        queries,
        vec![Some("cfg=1".to_owned()), Some("cfg=0".to_owned())]
    );
}

#[tokio::test]
async fn test_lookups_blank_before_config() {
    let (_server, engine) = setup().await;
    assert_eq!(engine.flow_lookup(RateClass::Low, 0), None);
    assert_eq!(engine.tank_lookup(TankLevel::Current, 0), None);
    assert!(engine.config_snapshot().is_none());
    assert_eq!(engine.snapshot().indicator, LinkIndicator::Unknown);
}

#[tokio::test]
async fn test_transport_failure_keeps_state_and_alerts() {
    let (server, engine) = setup().await;
    mount_config(&server).await;
    engine.poll_once().await.unwrap();
    let before = engine.snapshot();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = engine.poll_once().await.unwrap_err();
    assert!(
        matches!(err, CoreError::DeviceError { status: 503, .. }),
        "expected device error, got: {err:?}"
    );

    let after = engine.snapshot();
    assert_eq!(after.indicator, LinkIndicator::Alert);
    assert_eq!(after.poll_interval_ms, before.poll_interval_ms);
    assert_eq!(after.phase, before.phase);
    assert_eq!(after.display, before.display);
}

#[tokio::test]
async fn test_malformed_body_degrades_without_mutation() {
    let (server, engine) = setup().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = engine.poll_once().await.unwrap_err();
    assert!(matches!(err, CoreError::MalformedResponse { .. }));

    let snap = engine.snapshot();
    assert_eq!(snap.indicator, LinkIndicator::Degraded);
    assert_eq!(snap.phase, PollPhase::NeedsConfig);
    assert!(!snap.has_config);
}

#[tokio::test]
async fn test_poll_loop_survives_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = SyncEngine::new(config_for(&server, Duration::from_millis(50))).unwrap();
    let mut rx = engine.subscribe();

    engine.start().await;
    assert!(engine.is_running().await);
    tokio::time::sleep(Duration::from_millis(400)).await;
    engine.stop().await;
    assert!(!engine.is_running().await);

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.len() >= 3,
        "expected repeated polls, got {}",
        requests.len()
    );
    assert!(requests.iter().all(|r| r.url.query() == Some("cfg=1")));

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().indicator, LinkIndicator::Alert);
}

#[tokio::test]
async fn test_stop_without_start_is_harmless() {
    let (_server, engine) = setup().await;
    engine.stop().await;
    assert!(!engine.is_running().await);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_config_dispatch_rearms_before_next_poll() {
    let (server, engine) = setup().await;
    mount_config(&server).await;
    Mock::given(method("POST"))
        .and(path("/cfg"))
        .and(body_string("valve=2&rate=0&flow=30"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    engine.poll_once().await.unwrap();
    assert!(!engine.needs_config());

    engine
        .dispatch(Command::CalibrateFlow {
            valve: 2,
            rate: RateClass::High,
            flow: 30.0,
        })
        .await
        .unwrap();

    assert!(engine.needs_config());
    assert_eq!(engine.snapshot().phase, PollPhase::NeedsConfig);

    // The cache is untouched until the device reports back.
    assert_eq!(engine.flow_lookup(RateClass::High, 2), Some(30.0));

    engine.poll_once().await.unwrap();
    assert!(!engine.needs_config());
}

#[tokio::test]
async fn test_run_command_leaves_poll_state_alone() {
    let (server, engine) = setup().await;
    mount_config(&server).await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .and(body_string("open=1&secs=5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    engine.poll_once().await.unwrap();
    engine
        .dispatch(Command::OpenValve { valve: 1, secs: 5.0 })
        .await
        .unwrap();

    assert!(!engine.needs_config());
}

#[tokio::test]
async fn test_rearm_during_inflight_config_fetch_is_kept() {
    let (server, engine) = setup().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("cfg", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(data_with_config())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cfg"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let polling = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.poll_once().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    engine
        .dispatch(Command::SetVolts { volts: 231.0 })
        .await
        .unwrap();
    polling.await.unwrap().unwrap();

    assert!(
        engine.needs_config(),
        "a config response issued before the submission must not clear the re-arm"
    );
    assert_eq!(engine.poll_interval(), Duration::from_secs(2));
}

#[tokio::test]
async fn test_json_rejection_is_submission_failure() {
    let server = MockServer::start().await;
    let config = EngineConfig {
        encoding: SubmitEncoding::Json,
        ..config_for(&server, Duration::from_secs(10))
    };
    let engine = SyncEngine::new(config).unwrap();

    Mock::given(method("POST"))
        .and(path("/cfg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "bad tank"})))
        .mount(&server)
        .await;

    let err = engine
        .dispatch(Command::CalibrateTank {
            tank: 9,
            level: TankLevel::Full,
            volume: 10.0,
        })
        .await
        .unwrap_err();

    match err {
        CoreError::SubmissionFailed { action, reason } => {
            assert_eq!(action, "calibrate tank");
            assert!(reason.contains("bad tank"));
        }
        other => panic!("expected SubmissionFailed, got: {other:?}"),
    }
    assert!(engine.needs_config());
}

#[tokio::test]
async fn test_http_error_is_submission_failure() {
    let (server, engine) = setup().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = engine.dispatch(Command::Heat { on: true }).await.unwrap_err();
    assert!(matches!(err, CoreError::SubmissionFailed { .. }));
}

#[tokio::test]
async fn test_invalid_command_never_reaches_device() {
    let (server, engine) = setup().await;

    let err = engine
        .dispatch(Command::OpenValve { valve: 1, secs: 0.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fire_rearms_immediately() {
    let (server, engine) = setup().await;
    mount_config(&server).await;
    Mock::given(method("POST"))
        .and(path("/cfg"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    engine.poll_once().await.unwrap();
    assert!(!engine.needs_config());

    engine
        .fire(Command::MapSensor {
            sensor_id: 1,
            temp_index: 2,
        })
        .unwrap();
    assert!(engine.needs_config());

    tokio::time::sleep(Duration::from_millis(300)).await;
}

// ── Op log & selector ───────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_log_on_demand() {
    let (server, engine) = setup().await;
    Mock::given(method("GET"))
        .and(path("/oplog"))
        .respond_with(ResponseTemplate::new(200).set_body_string("08:00 boot\n"))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(engine.fetch_log().await.unwrap(), "08:00 boot\n");
}

#[tokio::test]
async fn test_selector_follows_telemetry() {
    let (server, engine) = setup().await;
    mount_config(&server).await;
    mount_telemetry(&server, [1, 1]).await;

    engine.poll_once().await.unwrap();
    assert!(!engine.select_sensor(7));
    assert!(engine.select_sensor(2));
    assert_eq!(engine.snapshot().selector.selected(), Some(2));

    // Telemetry now reports only two sensors.
    engine.poll_once().await.unwrap();
    assert_eq!(engine.snapshot().selector.selected(), None);
}
