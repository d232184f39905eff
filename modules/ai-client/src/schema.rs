use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Keywords Gemini's `responseSchema` understands. Everything else is dropped.
const GEMINI_KEYWORDS: &[&str] = &[
    "type",
    "nullable",
    "properties",
    "required",
    "items",
    "enum",
    "description",
    "format",
];

/// Types that can be requested as structured LLM output.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema for OpenAI and Claude tool input.
    ///
    /// OpenAI requires:
    /// 1. `additionalProperties: false` on all object schemas
    /// 2. ALL properties listed in `required`, even nullable ones
    /// 3. Fully inlined schemas (no `$ref` references)
    fn openai_schema() -> Value {
        let mut value = raw_schema::<Self>();
        inline_refs(&mut value);
        strip_meta(&mut value);
        close_objects(&mut value);
        value
    }

    /// Gemini accepts only an OpenAPI-flavoured subset of JSON Schema.
    fn gemini_schema() -> Value {
        sanitize_gemini_schema(raw_schema::<Self>())
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn raw_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_default()
}

/// Rewrite an arbitrary JSON Schema into the subset Gemini accepts.
///
/// `$ref`s are inlined, `["T", "null"]` unions and `anyOf: [T, null]` become
/// `nullable: true`, unknown keywords and unsupported `format`s are dropped
/// and type names are upper-cased.
pub fn sanitize_gemini_schema(mut schema: Value) -> Value {
    inline_refs(&mut schema);
    strip_meta(&mut schema);
    sanitize_node(schema)
}

fn sanitize_node(node: Value) -> Value {
    let Value::Object(mut map) = node else {
        return node;
    };

    let mut nullable = false;

    // anyOf/oneOf of exactly one schema plus null collapses to that schema.
    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(variants)) = map.remove(key) {
            let (nulls, rest): (Vec<Value>, Vec<Value>) = variants
                .into_iter()
                .partition(|v| v.get("type").and_then(Value::as_str) == Some("null"));
            nullable |= !nulls.is_empty();
            if let Some(Value::Object(inner)) = rest.into_iter().next() {
                for (k, v) in inner {
                    map.entry(k).or_insert(v);
                }
            }
        }
    }

    if let Some(Value::Array(types)) = map.get("type").cloned() {
        let non_null: Vec<&str> = types
            .iter()
            .filter_map(Value::as_str)
            .filter(|t| *t != "null")
            .collect();
        nullable |= non_null.len() < types.len();
        match non_null.first() {
            Some(t) => {
                map.insert("type".into(), Value::String(t.to_string()));
            }
            None => {
                map.remove("type");
            }
        }
    }

    let mut out = Map::new();
    for (key, value) in map {
        if !GEMINI_KEYWORDS.contains(&key.as_str()) {
            continue;
        }
        let value = match key.as_str() {
            "type" => match value.as_str() {
                Some(t) => Value::String(t.to_uppercase()),
                None => continue,
            },
            "format" => match value.as_str() {
                Some("enum") | Some("date-time") => value,
                _ => continue,
            },
            "properties" => match value {
                Value::Object(props) => Value::Object(
                    props
                        .into_iter()
                        .map(|(k, v)| (k, sanitize_node(v)))
                        .collect(),
                ),
                other => other,
            },
            "items" => sanitize_node(value),
            _ => value,
        };
        out.insert(key, value);
    }

    if nullable {
        out.insert("nullable".into(), Value::Bool(true));
    }

    Value::Object(out)
}

fn strip_meta(value: &mut Value) {
    if let Value::Object(map) = value {
        map.remove("definitions");
        map.remove("$schema");
        map.remove("title");
    }
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }
            for (_, v) in map.iter_mut() {
                close_objects(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                close_objects(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };
    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                let name = ref_path.trim_start_matches("#/definitions/");
                if let Some(def) = definitions.get(name) {
                    // Keep sibling keywords such as `description`.
                    let mut merged = def.clone();
                    if let Value::Object(target) = &mut merged {
                        for (k, v) in map.iter() {
                            if k != "$ref" {
                                target.entry(k.clone()).or_insert_with(|| v.clone());
                            }
                        }
                    }
                    *value = merged;
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    map.remove("allOf");
                    if let Some(Value::Object(inner)) = all_of.into_iter().next() {
                        for (k, v) in inner {
                            map.entry(k).or_insert(v);
                        }
                    }
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
