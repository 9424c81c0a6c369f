//! End-to-end tests: YAML rule files through the engine against JSON events.

use rdetect_eval::{Engine, EventContext};
use rdetect_parser::parse_rules_yaml;
use serde_json::json;

const RULES: &str = r#"
- name: impossible_travel
  description: Same credential observed from many networks
  severity: high
  action: step_up_auth
  condition: "unique_ips > 5 and in_set(region, ['EU', 'US'])"
  metadata:
    mitre_attack: [T1078]
  ttl_seconds: 300
- name: device_set_drift
  description: Observed device set diverges from the known set
  severity: medium
  action: notify
  condition: "jaccard_distance(known_devices, seen_devices) >= 0.5"
  metadata: {}
- name: privileged_role_added
  description: A role outside the expected set appeared
  severity: critical
  action: rotate_immediately
  condition: "len(roles - expected_roles) > 0"
  metadata:
    mitre_attack: [T1098]
- name: retired_probe
  description: Disabled probe kept for history
  severity: low
  action: allow
  condition: "this condition would never compile ++"
  metadata: {}
  enabled: false
"#;

fn engine() -> Engine {
    let collection = parse_rules_yaml(RULES).unwrap();
    assert!(collection.errors.is_empty(), "{:?}", collection.errors);
    let mut engine = Engine::new();
    engine.add_collection(&collection);
    engine
}

fn context(event: serde_json::Value) -> EventContext {
    EventContext::from_json(&event).unwrap()
}

#[test]
fn matching_event_produces_ordered_hits() {
    let engine = engine();
    let ctx = context(json!({
        "unique_ips": 7,
        "region": "EU",
        "known_devices": ["laptop", "phone"],
        "seen_devices": ["phone", "tablet", "watch"],
        "roles": ["admin", "user"],
        "expected_roles": ["user"]
    }));

    let outcome = engine.evaluate(&ctx);
    assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);

    let names: Vec<&str> = outcome.hits.iter().map(|h| h.rule.as_str()).collect();
    assert_eq!(
        names,
        ["impossible_travel", "device_set_drift", "privileged_role_added"]
    );
}

#[test]
fn quiet_event_produces_no_hits() {
    let engine = engine();
    let ctx = context(json!({
        "unique_ips": 1,
        "region": "EU",
        "known_devices": ["laptop"],
        "seen_devices": ["laptop"],
        "roles": ["user"],
        "expected_roles": ["user"]
    }));

    let outcome = engine.evaluate(&ctx);
    assert!(outcome.hits.is_empty());
    assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
}

#[test]
fn missing_variables_fail_only_the_rules_that_need_them() {
    let engine = engine();
    // Only the fields the first rule needs.
    let ctx = context(json!({"unique_ips": 9, "region": "US"}));

    let outcome = engine.evaluate(&ctx);
    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(outcome.hits[0].rule, "impossible_travel");
    // The two rules referencing absent variables failed; the disabled one
    // stayed silent.
    assert_eq!(outcome.failures.len(), 2);
}

#[test]
fn hit_serialization_shape() {
    let engine = engine();
    let ctx = context(json!({"unique_ips": 9, "region": "US"}));

    let outcome = engine.evaluate(&ctx);
    let hit = serde_json::to_value(&outcome.hits[0]).unwrap();

    assert_eq!(hit["rule"], "impossible_travel");
    assert_eq!(hit["severity"], "high");
    assert_eq!(hit["action"], "step_up_auth");
    assert_eq!(hit["metadata"]["mitre_attack"], json!(["T1078"]));
    assert_eq!(hit["ttl_seconds"], json!(300));
}

#[test]
fn hit_without_ttl_omits_the_field() {
    let engine = engine();
    let ctx = context(json!({
        "known_devices": ["a"],
        "seen_devices": ["b"]
    }));

    let outcome = engine.evaluate(&ctx);
    let hit = outcome
        .hits
        .iter()
        .find(|h| h.rule == "device_set_drift")
        .expect("drift rule should match");
    let json = serde_json::to_value(hit).unwrap();
    assert!(json.as_object().unwrap().get("ttl_seconds").is_none());
}

#[test]
fn engine_is_reusable_across_events() {
    let engine = engine();
    for i in 0..10 {
        let ctx = context(json!({"unique_ips": i, "region": "EU"}));
        let outcome = engine.evaluate(&ctx);
        let should_match = i > 5;
        assert_eq!(
            outcome.hits.iter().any(|h| h.rule == "impossible_travel"),
            should_match,
            "unique_ips = {i}"
        );
    }
}

#[test]
fn rules_loaded_per_file_survive_bad_records() {
    let yaml = r#"
- name: good
  description: loads
  severity: low
  action: allow
  condition: "x > 1"
  metadata: {}
- description: no name at all
  severity: low
  action: allow
  condition: "x > 1"
  metadata: {}
"#;
    let collection = parse_rules_yaml(yaml).unwrap();
    assert_eq!(collection.rules.len(), 1);
    assert_eq!(collection.errors.len(), 1);

    let mut engine = Engine::new();
    engine.add_collection(&collection);

    let mut ctx = EventContext::new();
    ctx.insert("x", 5);
    assert_eq!(engine.evaluate(&ctx).hits.len(), 1);
}
