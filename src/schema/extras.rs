/// Fields that exist only on the visual block, not as registry parameters.
///
/// Their values are turned into registry parameters by the composite rules.
pub fn ui_extra_fields(type_tag: &str) -> &'static [&'static str] {
    match type_tag {
        "effect_teleport" => &["targetRoomZoneId", "targetRoomId"],
        "effect_summon" => &["creatureRef"],
        "effect_create_item" => &["itemRef"],
        "effect_script" => &["scriptId", "args"],
        _ => &[],
    }
}

// (type tag, field) pairs left out of the document while empty.
const OPTIONAL_FIELDS: &[(&str, &str)] = &[
    ("effect_damage", "damageType"),
    ("effect_heal", "scaling"),
    ("effect_script", "args"),
    ("effect_apply_status", "duration"),
    ("gate_check", "comparison"),
];

pub fn is_optional(type_tag: &str, field: &str) -> bool {
    OPTIONAL_FIELDS
        .iter()
        .any(|(tag, name)| *tag == type_tag && *name == field)
}

/// True when `value` is the "left empty" sentinel for an optional field.
pub fn is_empty_sentinel(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}
