//! Unit tests for the static tables, wire lifting and small helpers.
use ability_pipeline::prelude::*;
use ability_pipeline::schema::{is_empty_sentinel, is_optional};
use serde_json::json;

#[test]
fn test_gate_tags_match_wire_names() {
    for gate in GateType::ALL {
        let tag = gate.block_tag();
        assert_eq!(tag, format!("gate_{}", gate.as_str()));
        assert_eq!(GateType::from_block_tag(&tag), Some(gate));
        assert_eq!(GateType::from_wire(gate.as_str()), Some(gate));
    }
    assert_eq!(GateType::from_wire("coin_flip"), None);
    assert_eq!(GateType::SavingThrow.fields(), &["saveType", "dc"]);
}

#[test]
fn test_trigger_names() {
    assert_eq!(Trigger::from_wire("on_take_damage"), Some(Trigger::OnTakeDamage));
    assert_eq!(Trigger::from_wire("OnHit"), None);
    assert_eq!(Trigger::OnCast.to_string(), "on_cast");
}

#[test]
fn test_optional_sentinels() {
    assert!(is_optional("effect_heal", "scaling"));
    assert!(!is_optional("effect_heal", "resource"));
    assert!(is_empty_sentinel(&json!(null)));
    assert!(is_empty_sentinel(&json!("")));
    assert!(!is_empty_sentinel(&json!(0)));
}

#[test]
fn test_param_spec_nested_fields() {
    let spec: ParamSpec = serde_json::from_value(json!({
        "type": "object",
        "fields": {
            "zoneId": { "type": "integer", "required": true },
            "roomId": { "type": "integer", "min": 1 }
        }
    }))
    .unwrap();

    assert!(spec.check(&json!({ "zoneId": 2, "roomId": 7 })).is_ok());
    assert!(spec.check(&json!({ "roomId": 7 })).is_err());
    assert!(spec.check(&json!({ "zoneId": 2, "roomId": 0 })).is_err());
    assert!(spec.check(&json!("2:7")).is_err());
}

#[test]
fn test_wire_lifting_errors() {
    let lift = |value: serde_json::Value| {
        let wire: WireNode = serde_json::from_value(value).unwrap();
        PipelineNode::from_wire(&wire)
    };

    assert_eq!(
        lift(json!({ "order": 0 })),
        Err(DocumentError::MissingKind { order: 0 })
    );
    assert_eq!(
        lift(json!({ "effectId": -4, "order": 0 })),
        Err(DocumentError::InvalidEffectId(-4))
    );
    assert_eq!(
        lift(json!({ "gateType": "coin_flip", "order": 0 })),
        Err(DocumentError::UnknownGateType("coin_flip".to_string()))
    );
    assert_eq!(
        lift(json!({ "effectId": 1, "order": -2 })),
        Err(DocumentError::OrderOutOfRange(-2))
    );
}

#[test]
fn test_wire_lifting_clamps_and_drops() {
    let wire: WireNode = serde_json::from_value(json!({
        "effectId": 2,
        "overrideParams": { "status": "slow", "onPass": [] },
        "order": 3,
        "trigger": "on_sneeze",
        "chancePct": 250
    }))
    .unwrap();

    match PipelineNode::from_wire(&wire).unwrap() {
        PipelineNode::Effect(effect) => {
            assert_eq!(effect.chance_pct, 100);
            assert_eq!(effect.trigger, None);
            assert!(!effect.params.contains_key("onPass"));
        }
        other => panic!("expected an effect, got {:?}", other),
    }
}

#[test]
fn test_branch_entries_are_written_in_wire_shape() {
    let damage = PipelineNode::Effect(EffectInvocation {
        effect_id: 1,
        params: [("amount".to_string(), json!("1d6"))].into_iter().collect(),
        order: 1,
        trigger: None,
        chance_pct: 75,
    });
    let gate = PipelineNode::Gate(Gate {
        gate_type: GateType::Chance,
        params: [("percentage".to_string(), json!(50))].into_iter().collect(),
        order: 0,
        on_pass: vec![damage],
        on_fail: Vec::new(),
    });

    let document = PipelineDocument::from_nodes(&[gate]);
    assert_eq!(
        document.to_value(),
        json!([{
            "gateType": "chance",
            "overrideParams": {
                "percentage": 50,
                "onPass": [
                    { "effectId": 1, "overrideParams": { "amount": "1d6" }, "order": 1, "chancePct": 75 }
                ]
            },
            "order": 0,
            "chancePct": 100
        }])
    );
    assert_eq!(PipelineDocument::from_json(&document.to_json()), Ok(document));
}
