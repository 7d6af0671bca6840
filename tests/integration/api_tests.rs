//! API dispatcher: routes, validation, manual override, query shapes.

use chrono::TimeDelta;
use soilgate::api::{ApiRequest, Method, dispatch};
use soilgate::app::ports::Clock;

use super::mocks::{MockClock, NullSink, make_service};

#[test]
fn health_and_unknown_routes() {
    let (svc, _) = make_service();
    let clock = MockClock::default();

    let resp = dispatch(&svc, &ApiRequest::get("/api/health"), clock.now(), 0, &mut NullSink);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["status"], "ok");

    let resp = dispatch(&svc, &ApiRequest::get("/api/nope"), clock.now(), 0, &mut NullSink);
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["success"], false);
}

#[test]
fn wrong_method_is_405() {
    let (svc, transport) = make_service();
    let clock = MockClock::default();

    let resp = dispatch(&svc, &ApiRequest::get("/api/control/pump"), clock.now(), 0, &mut NullSink);
    assert_eq!(resp.status, 405);

    let req = ApiRequest {
        method: Method::Delete,
        path: "/api/sensor/history".into(),
        body: Vec::new(),
    };
    assert_eq!(dispatch(&svc, &req, clock.now(), 0, &mut NullSink).status, 405);
    assert!(transport.published().is_empty());
}

#[test]
fn latest_before_any_telemetry_is_all_null() {
    let (svc, _) = make_service();
    let clock = MockClock::default();

    let resp = dispatch(&svc, &ApiRequest::get("/api/sensor/latest"), clock.now(), 0, &mut NullSink);
    assert_eq!(resp.status, 200);
    assert!(resp.body["soilMoisture"].is_null());
    assert!(resp.body["lastCommandTime"].is_null());
    assert_eq!(resp.body["pumpStatus"], "UNKNOWN");
    assert_eq!(resp.body["cooldownSeconds"], 30);
    assert_eq!(resp.body["automationEnabled"], true);
    assert_eq!(resp.body["dryThreshold"], 700);
    assert_eq!(resp.body["wetThreshold"], 400);
}

#[test]
fn history_lists_readings_oldest_first() {
    let (svc, _) = make_service();
    let clock = MockClock::default();
    for m in [510, 520, 530] {
        svc.ingest(
            format!(r#"{{"soilMoisture":{}}}"#, m).as_bytes(),
            clock.now(),
            &mut NullSink,
        );
    }

    let resp = dispatch(&svc, &ApiRequest::get("/api/sensor/history"), clock.now(), 0, &mut NullSink);
    let items = resp.body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["soilMoisture"], 510);
    assert_eq!(items[2]["soilMoisture"], 530);
    assert_eq!(items[0]["pumpStatus"], "UNKNOWN");
}

#[test]
fn manual_pump_without_action_is_400_and_publishes_nothing() {
    let (svc, transport) = make_service();
    let clock = MockClock::default();

    for body in [&b"{}"[..], br#"{"action":""}"#, b"{broken"] {
        let resp = dispatch(
            &svc,
            &ApiRequest::post("/api/control/pump", body),
            clock.now(),
            0,
            &mut NullSink,
        );
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["success"], false);
    }
    assert!(transport.published().is_empty());
    assert_eq!(svc.last_command_at(), None);
}

#[test]
fn manual_pump_publishes_and_resets_cooldown() {
    let (svc, transport) = make_service();
    let clock = MockClock::default();

    let resp = dispatch(
        &svc,
        &ApiRequest::post("/api/control/pump", r#"{"action":"TURN_PUMP_ON"}"#),
        clock.now(),
        0,
        &mut NullSink,
    );
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["command"], "TURN_PUMP_ON");
    assert_eq!(transport.published(), vec![r#"{"command":"TURN_PUMP_ON"}"#]);
    assert_eq!(svc.last_command_at(), Some(clock.now()));

    let later = clock.now() + TimeDelta::seconds(10);
    let resp = dispatch(&svc, &ApiRequest::get("/api/sensor/latest"), later, 0, &mut NullSink);
    assert_eq!(resp.body["cooldownRemainingSeconds"], 20);
}

#[test]
fn manual_pump_publish_failure_is_502() {
    let (svc, transport) = make_service();
    let clock = MockClock::default();
    transport.set_failing(true);

    let resp = dispatch(
        &svc,
        &ApiRequest::post("/api/control/pump", r#"{"action":"OPEN_VALVE"}"#),
        clock.now(),
        0,
        &mut NullSink,
    );
    assert_eq!(resp.status, 502);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["command"], "OPEN_VALVE");
    assert!(resp.body["error"].as_str().unwrap().contains("timed out"));
    // The cooldown moved even though nothing went out.
    assert_eq!(svc.last_command_at(), Some(clock.now()));
}

#[test]
fn weather_before_first_refresh_is_all_null() {
    let (svc, _) = make_service();
    let clock = MockClock::default();
    let resp = dispatch(&svc, &ApiRequest::get("/api/weather"), clock.now(), 0, &mut NullSink);
    assert_eq!(resp.status, 200);
    assert!(resp.body.as_object().unwrap().values().all(serde_json::Value::is_null));
}

#[test]
fn diagnostics_reports_uptime_and_counters() {
    let (svc, _) = make_service();
    let clock = MockClock::default();
    svc.ingest(b"garbage", clock.now(), &mut NullSink);
    svc.ingest(br#"{"soilMoisture":800,"pumpStatus":"OFF"}"#, clock.now(), &mut NullSink);

    let resp = dispatch(
        &svc,
        &ApiRequest::get("/api/diagnostics"),
        clock.now(),
        clock.uptime_secs(),
        &mut NullSink,
    );
    assert_eq!(resp.body["uptimeSecs"], 42);
    assert_eq!(resp.body["messagesRejected"], 1);
    assert_eq!(resp.body["messagesAccepted"], 1);
    assert_eq!(resp.body["commandsSent"], 1);
    assert_eq!(resp.body["lastPublish"]["command"], "TURN_PUMP_ON");
    assert_eq!(resp.body["lastPublish"]["sent"], true);
}
