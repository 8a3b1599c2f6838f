//! Integration tests for triggerd
//!
//! These tests drive configuration, data model, engine and sinks together the
//! way the daemon does, feeding deltas as JSON lines.

use std::io::Write;
use std::time::Duration;

use trigger_api::{ProviderStatus, TransitionType, UpdateBatch};
use trigger_config::{TriggerSettings, load_config, parse_config};
use trigger_core::{CoreEvent, TriggerEngine};
use trigger_expr::{Evaluator, Value};
use trigger_host::{
    JsonLinesSink, MemoryDataModel, NotificationSink, RecordingSink, RecordingStatus,
    StatusReporter,
};
use trigger_util::{MonotonicInstant, TriggerId};

const CONFIG: &str = r#"
config_version = 1

[engine]
debounce_seconds = 5.0

[[variables]]
name = "speed"
path = "vessels.self.navigation.speedOverGround.value"

[[variables]]
name = "depth"
path = "vessels.self.environment.depth.belowTransducer.value"

[[triggers]]
name = "overspeed"
condition = "speed > 5"
event = "overspeed"
trigger_type = "BOTH"

[[triggers]]
name = "shallow"
condition = "depth < 3"
event = "shallow-water"

[[triggers]]
name = "moving"
condition = "navigation.speedOverGround.value > 0.5"
event = "underway"
trigger_type = "ALWAYS"
"#;

/// Same flow as the daemon's evaluation loop, with recording collaborators
struct Pipeline {
    engine: TriggerEngine,
    model: MemoryDataModel,
    sink: RecordingSink,
    status: RecordingStatus,
    start: MonotonicInstant,
    skipped: usize,
}

impl Pipeline {
    fn new(settings: &TriggerSettings) -> Self {
        Self::with_engine(TriggerEngine::new(), settings)
    }

    fn with_engine(mut engine: TriggerEngine, settings: &TriggerSettings) -> Self {
        let start = MonotonicInstant::now();
        let mut status = RecordingStatus::new();
        let report = engine.configure(settings, start);
        status.set_status(report.status);
        Self {
            engine,
            model: MemoryDataModel::new(),
            sink: RecordingSink::new(),
            status,
            start,
            skipped: 0,
        }
    }

    /// Feed one JSON line at `secs` after start
    fn feed(&mut self, line: &str, secs: u64) {
        let Ok(batch) = serde_json::from_str::<UpdateBatch>(line) else {
            self.skipped += 1;
            return;
        };
        if self.model.apply(&batch).is_err() {
            self.skipped += 1;
            return;
        }
        let now = self.start + Duration::from_secs(secs);
        for event in self.engine.handle_update(&batch, &self.model, now) {
            if let CoreEvent::Fired {
                trigger_id,
                notification,
            } = event
            {
                self.sink.emit(&trigger_id, &notification).unwrap();
            }
        }
    }

    fn stop(&mut self) {
        self.engine.reset();
        self.status.set_status(ProviderStatus::Stopped);
    }
}

fn delta(path: &str, value: f64) -> String {
    serde_json::json!({
        "context": "vessels.self",
        "updates": [{
            "$source": "n2k.115",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "values": [{ "path": path, "value": value }]
        }]
    })
    .to_string()
}

const SOG: &str = "navigation.speedOverGround";
const COG: &str = "navigation.courseOverGroundTrue";
const DEPTH: &str = "environment.depth.belowTransducer";

#[test]
fn test_config_loads_all_triggers() {
    let settings = parse_config(CONFIG).unwrap();
    let pipeline = Pipeline::new(&settings);

    assert_eq!(pipeline.engine.triggers().len(), 3);
    assert_eq!(pipeline.status.latest(), Some(ProviderStatus::Running));
    assert_eq!(
        pipeline
            .engine
            .trigger(&TriggerId::new("shallow"))
            .unwrap()
            .dependencies(),
        &["environment.depth.belowTransducer".to_string()]
    );
}

#[test]
fn test_delta_stream_produces_notifications() {
    let settings = parse_config(CONFIG).unwrap();
    let mut p = Pipeline::new(&settings);

    p.feed(&delta(SOG, 0.2), 0);
    p.feed(&delta(SOG, 6.0), 1);
    p.feed(&delta(COG, 1.1), 2);
    p.feed(&delta(SOG, 6.5), 3);
    p.feed(&delta(DEPTH, 2.0), 4);
    p.feed(&delta(SOG, 0.1), 10);

    let emitted: Vec<(String, TransitionType)> = p
        .sink
        .emitted()
        .into_iter()
        .map(|(_, n)| (n.event, n.transition))
        .collect();
    assert_eq!(
        emitted,
        vec![
            ("overspeed".to_string(), TransitionType::Rising),
            ("underway".to_string(), TransitionType::Rising),
            ("underway".to_string(), TransitionType::NoChange),
            ("shallow-water".to_string(), TransitionType::Rising),
            ("overspeed".to_string(), TransitionType::Falling),
            ("underway".to_string(), TransitionType::Falling),
        ]
    );
}

#[test]
fn test_notification_value_is_the_delta() {
    let settings = parse_config(CONFIG).unwrap();
    let mut p = Pipeline::new(&settings);

    let raw = serde_json::json!({
        "context": "vessels.self",
        "requestId": "abc",
        "updates": [{
            "source": {"label": "n2k", "type": "NMEA2000", "src": "3"},
            "$source": "n2k.3",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "meta": [{"path": SOG, "value": {"units": "m/s"}}],
            "values": [{"path": SOG, "value": 7.0}]
        }]
    });
    p.feed(&raw.to_string(), 0);

    let (_, notification) = p.sink.emitted().into_iter().next().unwrap();
    assert_eq!(serde_json::to_value(&notification.value).unwrap(), raw);
}

#[test]
fn test_debounce_across_triggers() {
    let config = r#"
        config_version = 1

        [engine]
        debounce_seconds = 5.0

        [[triggers]]
        condition = "a.value > 0"
        event = "alarm"

        [[triggers]]
        condition = "b.value > 0"
        event = "alarm"
    "#;
    let settings = parse_config(config).unwrap();
    let mut p = Pipeline::new(&settings);

    p.feed(&delta("a", 1.0), 0);
    p.feed(&delta("b", 1.0), 2);
    assert_eq!(p.sink.len(), 1);

    p.feed(&delta("a", 0.0), 3);
    p.feed(&delta("a", 1.0), 6);
    assert_eq!(p.sink.events(), vec!["alarm", "alarm"]);
}

#[test]
fn test_bad_lines_are_skipped() {
    let settings = parse_config(CONFIG).unwrap();
    let mut p = Pipeline::new(&settings);

    p.feed("not json", 0);
    p.feed(r#"{"context":"vessels.self","updates":[{"values":[{"value":1}]}]}"#, 0);
    p.feed(&delta(SOG, 7.0), 1);

    assert_eq!(p.skipped, 2);
    assert_eq!(p.sink.events(), vec!["overspeed", "underway"]);
}

#[test]
fn test_startup_silence_from_config() {
    let config = r#"
        config_version = 1

        [engine]
        startup_silence_seconds = 10.0

        [[triggers]]
        condition = "navigation.speedOverGround.value > 5"
        event = "overspeed"
        trigger_type = "BOTH"
    "#;
    let settings = parse_config(config).unwrap();
    let mut p = Pipeline::new(&settings);

    p.feed(&delta(SOG, 7.0), 1);
    assert!(p.sink.is_empty());

    p.feed(&delta(SOG, 2.0), 12);
    assert_eq!(p.sink.emitted()[0].1.transition, TransitionType::Falling);
}

#[test]
fn test_status_lifecycle() {
    let empty = parse_config("config_version = 1").unwrap();
    let mut p = Pipeline::new(&empty);
    assert_eq!(p.status.latest(), Some(ProviderStatus::NoTriggersSet));

    let report = p.engine.configure(&parse_config(CONFIG).unwrap(), p.start);
    p.status.set_status(report.status);
    p.stop();
    p.stop();

    assert_eq!(
        p.status.history(),
        vec![
            ProviderStatus::NoTriggersSet,
            ProviderStatus::Running,
            ProviderStatus::Stopped,
            ProviderStatus::Stopped,
        ]
    );
    assert!(p.engine.triggers().is_empty());
}

#[test]
fn test_reload_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    file.flush().unwrap();

    let settings = load_config(file.path()).unwrap();
    let mut p = Pipeline::new(&settings);
    p.feed(&delta(SOG, 7.0), 0);
    assert_eq!(p.sink.len(), 2);

    let reloaded = r#"
        config_version = 1

        [[triggers]]
        condition = "navigation.speedOverGround.value > 10"
        event = "very-fast"
    "#;
    std::fs::write(file.path(), reloaded).unwrap();

    let settings = load_config(file.path()).unwrap();
    p.engine = TriggerEngine::new();
    p.engine.configure(&settings, p.start);
    assert_eq!(p.engine.triggers().len(), 1);

    // The data model survives the reload
    p.feed(&delta(COG, 0.5), 1);
    assert_eq!(p.sink.len(), 2);
    p.feed(&delta(SOG, 11.0), 2);
    assert_eq!(p.sink.events().last().map(String::as_str), Some("very-fast"));
}

fn knots(value: &Value, _: &[Value]) -> Result<Value, String> {
    match value {
        Value::Number(ms) => Ok(Value::Number(ms * 3600.0 / 1852.0)),
        other => Err(format!("knots expects a number, got {}", other.type_name())),
    }
}

#[test]
fn test_custom_transform() {
    let config = r#"
        config_version = 1

        [[variables]]
        name = "speed"
        path = "vessels.self.navigation.speedOverGround.value"

        [[triggers]]
        condition = "speed|knots > 10"
        event = "fast"
    "#;
    let settings = parse_config(config).unwrap();

    // Unknown transforms are rejected at compile time
    let mut plain = TriggerEngine::new();
    let report = plain.configure(&settings, MonotonicInstant::now());
    assert_eq!(report.loaded, 0);

    let mut evaluator = Evaluator::default();
    evaluator.add_transform("knots", knots);
    let mut p = Pipeline::with_engine(TriggerEngine::with_evaluator(evaluator), &settings);

    p.feed(&delta(SOG, 5.0), 0);
    assert!(p.sink.is_empty());
    p.feed(&delta(SOG, 6.0), 1);
    assert_eq!(p.sink.events(), vec!["fast"]);
}

#[test]
fn test_json_lines_output() {
    let settings = parse_config(CONFIG).unwrap();
    let mut engine = TriggerEngine::new();
    let start = MonotonicInstant::now();
    engine.configure(&settings, start);

    let mut model = MemoryDataModel::new();
    let batch: UpdateBatch = serde_json::from_str(&delta(SOG, 7.0)).unwrap();
    model.apply(&batch).unwrap();

    let mut sink = JsonLinesSink::new(Vec::new());
    for event in engine.handle_update(&batch, &model, start) {
        if let CoreEvent::Fired {
            trigger_id,
            notification,
        } = event
        {
            sink.emit(&trigger_id, &notification).unwrap();
        }
    }

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["trigger_id"], "overspeed");
    assert_eq!(lines[0]["notification"]["event"], "overspeed");
    assert_eq!(lines[0]["notification"]["type"], "RISING");
    assert_eq!(lines[0]["notification"]["value"]["context"], "vessels.self");
    assert_eq!(lines[1]["notification"]["type"], "RISING");
}
