//! Common test utilities for building registries, programs and documents.
use ability_pipeline::prelude::*;
use serde_json::{Value, json};

/// The effect catalog shared by most tests.
///
/// Ids: damage 1, apply_status 2, heal 3, teleport 4, summon 5,
/// create_item 6, script 7.
#[allow(dead_code)]
pub fn create_snapshot() -> RegistrySnapshot {
    serde_json::from_value(json!({
        "effects": [
            {
                "id": 1,
                "name": "damage",
                "parameterSchema": {
                    "amount": { "type": "dice", "required": true },
                    "damageType": { "type": "enum", "options": ["fire", "cold", "physical"] }
                }
            },
            {
                "id": 2,
                "name": "apply_status",
                "parameterSchema": {
                    "status": { "type": "string", "required": true },
                    "duration": { "type": "integer", "min": 1, "max": 100 }
                }
            },
            {
                "id": 3,
                "name": "heal",
                "parameterSchema": {
                    "resource": { "type": "enum", "required": true, "options": ["hp", "mana"] },
                    "amount": { "type": "dice", "required": true },
                    "scaling": { "type": "string" }
                }
            },
            {
                "id": 4,
                "name": "teleport",
                "parameterSchema": {
                    "targetRoom": { "type": "object", "required": true }
                }
            },
            {
                "id": 5,
                "name": "summon",
                "parameterSchema": {
                    "creatureZoneId": { "type": "integer", "required": true },
                    "creatureId": { "type": "reference", "required": true, "reference": "creature" },
                    "count": { "type": "integer", "min": 1, "max": 10 }
                }
            },
            {
                "id": 6,
                "name": "create_item",
                "parameterSchema": {
                    "itemZoneId": { "type": "integer", "required": true },
                    "itemId": { "type": "reference", "required": true, "reference": "item" }
                }
            },
            {
                "id": 7,
                "name": "script",
                "parameterSchema": {
                    "scriptId": { "type": "string", "required": true },
                    "args": { "type": "any" }
                }
            }
        ],
        "creatures": [ { "zoneId": 3, "id": 12, "name": "fire imp" } ],
        "items": [ { "zoneId": 1, "id": 40, "name": "healing draught" } ],
        "zones": [ { "id": 1, "name": "Lowmarsh" }, { "id": 3, "name": "Cinder Reach" } ]
    }))
    .expect("fixture snapshot should parse")
}

/// A populated registry built from [`create_snapshot`].
#[allow(dead_code)]
pub fn create_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .populate(create_snapshot())
        .expect("fixture snapshot should be valid");
    registry
}

/// Adds an unlinked block with the given fields.
#[allow(dead_code)]
pub fn add_block(program: &mut VisualProgram, tag: &str, fields: Value) -> BlockId {
    let block = program.new_chain_node(tag);
    if let Value::Object(map) = fields {
        for (name, value) in map {
            program.set_field_value(block, &name, value);
        }
    }
    block
}

/// Links `blocks` into a chain and registers it as a top-level chain.
#[allow(dead_code)]
pub fn add_chain(program: &mut VisualProgram, blocks: &[BlockId]) -> BlockId {
    let head = program.link_chain(blocks).expect("chain needs at least one block");
    program.add_top_level_chain(head, [0.0, 0.0]);
    head
}

/// Links `blocks` and hangs them under `slot` of `gate`.
#[allow(dead_code)]
pub fn add_branch(program: &mut VisualProgram, gate: BlockId, slot: &str, blocks: &[BlockId]) {
    let head = program.link_chain(blocks).expect("branch needs at least one block");
    program.set_nested_chain_slot(gate, slot, head);
}

/// heal -> saving_throw gate (onPass: damage, onFail: damage -> apply_status) -> summon
#[allow(dead_code)]
pub fn create_nested_program() -> VisualProgram {
    let mut program = VisualProgram::new();
    let heal = add_block(
        &mut program,
        "effect_heal",
        json!({ "resource": "hp", "amount": "1d8", "chancePct": 100 }),
    );
    let gate = add_block(
        &mut program,
        "gate_saving_throw",
        json!({ "saveType": "dex", "dc": 14 }),
    );
    let half = add_block(&mut program, "effect_damage", json!({ "amount": "2d6" }));
    let full = add_block(
        &mut program,
        "effect_damage",
        json!({ "amount": "4d6", "damageType": "fire" }),
    );
    let burn = add_block(
        &mut program,
        "effect_apply_status",
        json!({ "status": "burning", "duration": 3, "chancePct": 50 }),
    );
    let summon = add_block(
        &mut program,
        "effect_summon",
        json!({ "creatureRef": "3:12", "trigger": "on_hit" }),
    );
    add_branch(&mut program, gate, "onPass", &[half]);
    add_branch(&mut program, gate, "onFail", &[full, burn]);
    add_chain(&mut program, &[heal, gate, summon]);
    program
}

/// Scenario: a single heal bound to `on_cast`.
#[allow(dead_code)]
pub fn create_heal_document() -> PipelineDocument {
    document(json!([
        {
            "effectId": 3,
            "overrideParams": { "resource": "hp", "amount": "2d6", "scaling": "wis" },
            "order": 0,
            "trigger": "on_cast",
            "chancePct": 100
        }
    ]))
}

/// Scenario: a 50% chance gate with one damage effect on pass.
#[allow(dead_code)]
pub fn create_chance_gate_document() -> PipelineDocument {
    document(json!([
        {
            "gateType": "chance",
            "overrideParams": {
                "percentage": 50,
                "onPass": [
                    {
                        "effectId": 1,
                        "overrideParams": { "amount": "1d6" },
                        "order": 1,
                        "chancePct": 100
                    }
                ],
                "onFail": []
            },
            "order": 0,
            "chancePct": 100
        }
    ]))
}

#[allow(dead_code)]
pub fn document(value: Value) -> PipelineDocument {
    PipelineDocument::from_value(value).expect("fixture document should parse")
}

/// Path of a file under the crate's `data/` directory.
#[allow(dead_code)]
pub fn data_path(name: &str) -> String {
    format!("{}/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}
