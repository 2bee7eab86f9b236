use crate::pipeline::Params;
use ahash::AHashMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Field values read from (or written to) a single visual block.
pub type FieldValues = BTreeMap<String, Value>;

/// A reversible transform between a UI-convenient field shape and its wire form.
///
/// `fold` runs during serialization and `unfold` during deserialization;
/// `unfold` returns the wire keys it consumed so they are not copied again.
pub trait CompositeRule: Send + Sync {
    fn ui_fields(&self) -> Vec<&str>;
    fn fold(&self, fields: &FieldValues, params: &mut Params);
    fn unfold(&self, params: &Params, fields: &mut FieldValues) -> Vec<String>;
}

/// Splits a combined `"zone:id"` reference into two parameters.
pub struct SplitReference {
    ui_field: &'static str,
    zone_key: &'static str,
    id_key: &'static str,
}

impl SplitReference {
    pub const fn new(ui_field: &'static str, zone_key: &'static str, id_key: &'static str) -> Self {
        Self {
            ui_field,
            zone_key,
            id_key,
        }
    }
}

impl CompositeRule for SplitReference {
    fn ui_fields(&self) -> Vec<&str> {
        vec![self.ui_field]
    }

    fn fold(&self, fields: &FieldValues, params: &mut Params) {
        let Some(value) = fields.get(self.ui_field) else {
            return;
        };
        match value.as_str().and_then(|s| s.split_once(':')) {
            Some((zone, id)) if !zone.trim().is_empty() && !id.trim().is_empty() => {
                params.insert(self.zone_key.to_string(), reference_component(zone));
                params.insert(self.id_key.to_string(), reference_component(id));
            }
            _ => warn!(
                field = self.ui_field,
                value = %value,
                "reference is not in zone:id form, dropped"
            ),
        }
    }

    fn unfold(&self, params: &Params, fields: &mut FieldValues) -> Vec<String> {
        match (params.get(self.zone_key), params.get(self.id_key)) {
            (Some(zone), Some(id)) => {
                let combined = format!("{}:{}", plain_text(zone), plain_text(id));
                fields.insert(self.ui_field.to_string(), Value::String(combined));
                vec![self.zone_key.to_string(), self.id_key.to_string()]
            }
            _ => Vec::new(),
        }
    }
}

/// Nests two numeric fields under one parameter, e.g. a target coordinate.
pub struct NestPair {
    key: &'static str,
    members: [(&'static str, &'static str); 2],
}

impl NestPair {
    /// `first` and `second` are `(ui_field, nested_key)` pairs.
    pub const fn new(
        key: &'static str,
        first: (&'static str, &'static str),
        second: (&'static str, &'static str),
    ) -> Self {
        Self {
            key,
            members: [first, second],
        }
    }
}

impl CompositeRule for NestPair {
    fn ui_fields(&self) -> Vec<&str> {
        self.members.iter().map(|(ui, _)| *ui).collect()
    }

    fn fold(&self, fields: &FieldValues, params: &mut Params) {
        let mut nested = Map::new();
        for (ui, sub) in self.members {
            if let Some(value) = fields.get(ui) {
                nested.insert(sub.to_string(), numeric(value));
            }
        }
        if !nested.is_empty() {
            params.insert(self.key.to_string(), Value::Object(nested));
        }
    }

    fn unfold(&self, params: &Params, fields: &mut FieldValues) -> Vec<String> {
        let Some(Value::Object(nested)) = params.get(self.key) else {
            return Vec::new();
        };
        for (ui, sub) in self.members {
            if let Some(value) = nested.get(sub) {
                fields.insert(ui.to_string(), value.clone());
            }
        }
        vec![self.key.to_string()]
    }
}

/// A field edited as JSON text in the UI but stored as structured JSON.
///
/// Text that does not parse is stored verbatim as a string.
pub struct JsonText {
    field: &'static str,
}

impl JsonText {
    pub const fn new(field: &'static str) -> Self {
        Self { field }
    }
}

impl CompositeRule for JsonText {
    fn ui_fields(&self) -> Vec<&str> {
        vec![self.field]
    }

    fn fold(&self, fields: &FieldValues, params: &mut Params) {
        let Some(value) = fields.get(self.field) else {
            return;
        };
        let parsed = match value {
            Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| value.clone()),
            other => other.clone(),
        };
        params.insert(self.field.to_string(), parsed);
    }

    fn unfold(&self, params: &Params, fields: &mut FieldValues) -> Vec<String> {
        let Some(value) = params.get(self.field) else {
            return Vec::new();
        };
        fields.insert(self.field.to_string(), Value::String(json_text(value)));
        vec![self.field.to_string()]
    }
}

fn reference_component(part: &str) -> Value {
    let part = part.trim();
    part.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(part.to_string()))
}

fn numeric(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            if let Ok(n) = s.trim().parse::<i64>() {
                Value::from(n)
            } else if let Some(n) = s.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Value::Number(n)
            } else {
                value.clone()
            }
        }
        other => other.clone(),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Inverse of `JsonText::fold`: a string is written back bare only when
/// `fold` would keep the bare text as that same string.
fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() && serde_json::from_str::<Value>(s).is_err() => s.clone(),
        other => other.to_string(),
    }
}

/// Composite rules keyed by block type tag.
#[derive(Default)]
pub struct CompositeTable {
    rules: AHashMap<String, Vec<Box<dyn CompositeRule>>>,
}

impl CompositeTable {
    /// A table preloaded with the built-in rules.
    pub fn new() -> Self {
        let mut table = Self::default();
        register_default_rules(&mut table);
        table
    }

    pub fn insert(&mut self, type_tag: &str, rule: Box<dyn CompositeRule>) {
        self.rules.entry(type_tag.to_string()).or_default().push(rule);
    }

    pub fn rules_for(&self, type_tag: &str) -> &[Box<dyn CompositeRule>] {
        self.rules.get(type_tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ui_fields(&self, type_tag: &str) -> Vec<&str> {
        self.rules_for(type_tag)
            .iter()
            .flat_map(|rule| rule.ui_fields())
            .collect()
    }
}

/// Declares the built-in rules as `tag => rule` pairs.
macro_rules! define_composite_rules {
    ( $( $tag:literal => $rule:expr ),* $(,)? ) => {
        fn register_default_rules(table: &mut CompositeTable) {
            $( table.insert($tag, Box::new($rule)); )*
        }
    };
}

define_composite_rules! {
    "effect_teleport" => NestPair::new("targetRoom", ("targetRoomZoneId", "zoneId"), ("targetRoomId", "roomId")),
    "effect_summon" => SplitReference::new("creatureRef", "creatureZoneId", "creatureId"),
    "effect_create_item" => SplitReference::new("itemRef", "itemZoneId", "itemId"),
    "effect_script" => JsonText::new("args"),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn split_reference_folds_and_unfolds() {
        let rule = SplitReference::new("creatureRef", "creatureZoneId", "creatureId");
        let mut params = Params::new();
        rule.fold(&values(&[("creatureRef", json!("3:12"))]), &mut params);
        assert_eq!(params.get("creatureZoneId"), Some(&json!(3)));
        assert_eq!(params.get("creatureId"), Some(&json!(12)));

        let mut fields = FieldValues::new();
        let consumed = rule.unfold(&params, &mut fields);
        assert_eq!(fields.get("creatureRef"), Some(&json!("3:12")));
        assert_eq!(consumed.len(), 2);
    }

    #[test]
    fn split_reference_drops_malformed_values() {
        let rule = SplitReference::new("itemRef", "itemZoneId", "itemId");
        let mut params = Params::new();
        rule.fold(&values(&[("itemRef", json!("12"))]), &mut params);
        rule.fold(&values(&[("itemRef", json!(":12"))]), &mut params);
        assert!(params.is_empty());
    }

    #[test]
    fn split_reference_keeps_half_references_unconsumed() {
        let rule = SplitReference::new("itemRef", "itemZoneId", "itemId");
        let params: Params = values(&[("itemId", json!(7))]);
        let mut fields = FieldValues::new();
        assert!(rule.unfold(&params, &mut fields).is_empty());
        assert!(fields.is_empty());
    }

    #[test]
    fn nest_pair_coerces_numeric_text() {
        let rule = NestPair::new("targetRoom", ("targetRoomZoneId", "zoneId"), ("targetRoomId", "roomId"));
        let mut params = Params::new();
        rule.fold(
            &values(&[("targetRoomZoneId", json!("4")), ("targetRoomId", json!(17))]),
            &mut params,
        );
        assert_eq!(params.get("targetRoom"), Some(&json!({"zoneId": 4, "roomId": 17})));

        let mut fields = FieldValues::new();
        assert_eq!(rule.unfold(&params, &mut fields), vec!["targetRoom".to_string()]);
        assert_eq!(fields.get("targetRoomZoneId"), Some(&json!(4)));
        assert_eq!(fields.get("targetRoomId"), Some(&json!(17)));
    }

    #[test]
    fn nest_pair_without_values_emits_nothing() {
        let rule = NestPair::new("targetRoom", ("targetRoomZoneId", "zoneId"), ("targetRoomId", "roomId"));
        let mut params = Params::new();
        rule.fold(&FieldValues::new(), &mut params);
        assert!(params.is_empty());
    }

    #[test]
    fn json_text_parses_when_possible() {
        let rule = JsonText::new("args");
        let mut params = Params::new();
        rule.fold(&values(&[("args", json!(r#"{"power": 2}"#))]), &mut params);
        assert_eq!(params.get("args"), Some(&json!({"power": 2})));

        let mut fields = FieldValues::new();
        rule.unfold(&params, &mut fields);
        assert_eq!(fields.get("args"), Some(&json!(r#"{"power":2}"#)));

        let mut params = Params::new();
        rule.fold(&values(&[("args", json!("not json"))]), &mut params);
        assert_eq!(params.get("args"), Some(&json!("not json")));
    }

    #[test]
    fn json_text_keeps_quoted_strings_quoted() {
        let rule = JsonText::new("args");
        for (text, stored) in [(r#""42""#, json!("42")), (r#""""#, json!(""))] {
            let mut params = Params::new();
            rule.fold(&values(&[("args", json!(text))]), &mut params);
            assert_eq!(params.get("args"), Some(&stored));

            let mut fields = FieldValues::new();
            rule.unfold(&params, &mut fields);
            assert_eq!(fields.get("args"), Some(&json!(text)));

            let mut refolded = Params::new();
            rule.fold(&fields, &mut refolded);
            assert_eq!(refolded, params);
        }
    }

    #[test]
    fn json_text_writes_unparsed_text_back_bare() {
        let rule = JsonText::new("args");
        let mut params = Params::new();
        rule.fold(&values(&[("args", json!("fire {"))]), &mut params);

        let mut fields = FieldValues::new();
        rule.unfold(&params, &mut fields);
        assert_eq!(fields.get("args"), Some(&json!("fire {")));
    }

    #[test]
    fn default_table_covers_builtin_tags() {
        let table = CompositeTable::new();
        assert_eq!(table.ui_fields("effect_summon"), vec!["creatureRef"]);
        assert_eq!(
            table.ui_fields("effect_teleport"),
            vec!["targetRoomZoneId", "targetRoomId"]
        );
        assert!(table.rules_for("effect_heal").is_empty());
    }
}
