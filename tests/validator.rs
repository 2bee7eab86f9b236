//! Tests for structural, schema and legacy validation.
mod common;
use ability_pipeline::prelude::*;
use ability_pipeline::validator::{CheckSource, LegacyDiscrepancy, LegacySchemaTable};
use common::*;
use serde_json::json;

fn heal(order: i64, chance: i64) -> serde_json::Value {
    json!({
        "effectId": 3,
        "overrideParams": { "resource": "hp", "amount": "2d6" },
        "order": order,
        "chancePct": chance
    })
}

fn has(findings: &[Finding], path: &str, field: Option<&str>) -> bool {
    findings
        .iter()
        .any(|f| f.path == path && f.field.as_deref() == field)
}

#[test]
fn test_chance_out_of_range_names_node_and_field() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([heal(0, 150)])));

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "Effect[0]");
    assert_eq!(report.errors[0].field.as_deref(), Some("chancePct"));
    assert!(report.errors[0].message.contains("150"));
}

#[test]
fn test_valid_documents_have_no_findings() {
    let registry = create_registry();
    let validator = Validator::new(&registry);

    let report = validator.validate(&create_heal_document());
    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());

    assert!(validator.validate(&create_chance_gate_document()).valid);
}

#[test]
fn test_node_kind_must_be_exactly_one() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        { "effectId": 1, "gateType": "chance", "overrideParams": {}, "order": 0, "chancePct": 100 },
        { "overrideParams": {}, "order": 1, "chancePct": 100 }
    ])));

    assert!(!report.valid);
    assert!(has(&report.errors, "Effect[0]", None));
    assert!(has(&report.errors, "Effect[1]", None));
}

#[test]
fn test_structural_field_errors() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        { "effectId": 0, "overrideParams": {}, "order": 0, "chancePct": 100 },
        { "gateType": "coin_flip", "overrideParams": {}, "order": 1, "chancePct": 100 },
        { "effectId": 3, "overrideParams": { "resource": "hp", "amount": "1" }, "order": -1, "chancePct": 100 },
        { "effectId": 3, "overrideParams": { "resource": "hp", "amount": "1" }, "order": 1, "trigger": "on_sneeze", "chancePct": 100 }
    ])));

    assert!(has(&report.errors, "Effect[0]", Some("effectId")));
    assert!(has(&report.errors, "Effect[1]", Some("gateType")));
    assert!(has(&report.errors, "Effect[2]", Some("order")));
    // Duplicate of Effect[1]'s order.
    assert!(has(&report.errors, "Effect[3]", Some("order")));
    assert!(has(&report.errors, "Effect[3]", Some("trigger")));
    assert_eq!(report.errors.len(), 5);
}

#[test]
fn test_branch_findings_are_path_qualified() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        {
            "gateType": "saving_throw",
            "overrideParams": {
                "saveType": "con",
                "dc": 12,
                "onFail": [ heal(1, 100), heal(2, 150) ]
            },
            "order": 0,
            "chancePct": 100
        }
    ])));

    assert!(!report.valid);
    assert_eq!(report.errors_at("Effect[0].onFail[1]").len(), 1);
    assert!(report.errors_at("Effect[0]").is_empty());
}

#[test]
fn test_malformed_branches_are_errors() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        { "gateType": "chance", "overrideParams": { "percentage": 10, "onPass": "nope" }, "order": 0, "chancePct": 100 },
        { "gateType": "chance", "overrideParams": { "percentage": 10, "onFail": [42] }, "order": 1, "chancePct": 100 }
    ])));

    assert!(has(&report.errors, "Effect[0]", Some("onPass")));
    assert!(has(&report.errors, "Effect[1].onFail[0]", None));
}

#[test]
fn test_ignored_metadata_produces_warnings_only() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        { "gateType": "chance", "overrideParams": { "percentage": 10 }, "order": 0, "trigger": "on_hit", "chancePct": 60 },
        {
            "effectId": 3,
            "overrideParams": { "resource": "hp", "amount": "1", "onPass": [] },
            "order": 1,
            "chancePct": 100
        }
    ])));

    assert!(report.valid);
    assert!(has(&report.warnings, "Effect[0]", Some("trigger")));
    assert!(has(&report.warnings, "Effect[0]", Some("chancePct")));
    assert!(has(&report.warnings, "Effect[1]", Some("onPass")));
}

#[test]
fn test_parameter_schema_checks() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        { "effectId": 3, "overrideParams": { "amount": "2d6" }, "order": 0, "chancePct": 100 },
        { "effectId": 3, "overrideParams": { "resource": "blood", "amount": "lots" }, "order": 1, "chancePct": 100 },
        { "effectId": 2, "overrideParams": { "status": "slow", "duration": 500 }, "order": 2, "chancePct": 100 }
    ])));

    // A missing required parameter is filled in by the editor.
    assert!(has(&report.warnings, "Effect[0]", Some("resource")));
    assert!(!has(&report.errors, "Effect[0]", Some("resource")));

    assert!(has(&report.errors, "Effect[1]", Some("resource")));
    assert!(has(&report.errors, "Effect[1]", Some("amount")));
    assert!(has(&report.errors, "Effect[2]", Some("duration")));
    assert!(report.errors.iter().all(|f| f.source == CheckSource::Schema));
}

#[test]
fn test_unknown_effect_ids_warn_when_registry_is_ready() {
    let registry = create_registry();
    let report = Validator::new(&registry).validate(&document(json!([
        { "effectId": 99, "overrideParams": {}, "order": 0, "chancePct": 100 }
    ])));

    assert!(report.valid);
    assert!(has(&report.warnings, "Effect[0]", Some("effectId")));
}

#[test]
fn test_registry_not_loaded_skips_schema_checks() {
    let registry = Registry::new();
    let report = Validator::new(&registry).validate(&document(json!([
        { "effectId": 3, "overrideParams": { "amount": "lots" }, "order": 0, "chancePct": 100 },
        { "effectId": 99, "overrideParams": {}, "order": 1, "chancePct": 100 }
    ])));

    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, "Document");
}

#[test]
fn test_references_are_checked_against_lookups() {
    let registry = create_registry();
    let validator = Validator::new(&registry);

    let known = validator.validate(&document(json!([
        { "effectId": 5, "overrideParams": { "creatureZoneId": 3, "creatureId": 12 }, "order": 0, "chancePct": 100 }
    ])));
    assert!(known.warnings.is_empty());

    let missing = validator.validate(&document(json!([
        { "effectId": 5, "overrideParams": { "creatureZoneId": 3, "creatureId": 99 }, "order": 0, "chancePct": 100 }
    ])));
    assert!(missing.valid);
    assert!(has(&missing.warnings, "Effect[0]", Some("creatureId")));
    assert!(missing.warnings[0].message.contains("3:99"));
}

#[test]
fn test_legacy_checks_are_opt_in_warnings() {
    let registry = create_registry();
    let legacy_node = document(json!([
        { "effectId": 101, "overrideParams": { "amount": "1d6" }, "order": 0, "chancePct": 100 }
    ]));

    let plain = Validator::new(&registry).validate(&legacy_node);
    assert!(plain.warnings.iter().all(|f| f.source != CheckSource::Legacy));

    let config = CompilerConfig {
        legacy_checks: true,
        ..Default::default()
    };
    let report = Validator::new(&registry).with_config(config).validate(&legacy_node);
    assert!(report.valid);
    let legacy: Vec<&Finding> = report
        .warnings
        .iter()
        .filter(|f| f.source == CheckSource::Legacy)
        .collect();
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].field.as_deref(), Some("damageType"));
}

#[test]
fn test_legacy_audit_reports_drift() {
    let registry = create_registry();
    let found = LegacySchemaTable::default().audit(&registry);

    assert!(found.contains(&LegacyDiscrepancy::IdMismatch {
        name: "heal".to_string(),
        legacy_id: 102,
        registry_id: 3,
    }));
    assert!(found.contains(&LegacyDiscrepancy::MissingFromLegacy {
        name: "script".to_string(),
        registry_id: 7,
    }));
    assert_eq!(found.len(), 7);

    assert!(LegacySchemaTable::default().audit(&Registry::new()).is_empty());
}
