//! Key normalization — renames the known camelCase spellings sent by clients
//! to the snake_case names the schema and typed request model use.

use serde_json::{Map, Value};

/// External spelling → canonical spelling.
/// Keys not listed here pass through untouched.
pub const KEY_MAP: &[(&str, &str)] = &[
    ("outputFormat", "output_format"),
    ("sectionOrder", "section_order"),
    ("sectionVisibility", "section_visibility"),
    ("isAnonymized", "is_anonymized"),
    ("recruiterProfile", "recruiter_profile"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("profileStatement", "profile_statement"),
    ("endDate", "end_date"),
    ("startDate", "start_date"),
    ("additionalDetails", "additional_details"),
    ("professionalMemberships", "professional_memberships"),
    ("earlierCareer", "earlier_career"),
];

/// Returns the canonical spelling for `key`, or `key` itself when unmapped.
pub fn canonical_key(key: &str) -> &str {
    KEY_MAP
        .iter()
        .find(|(external, _)| *external == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Recursively renames mapped keys in every object of `value`.
///
/// Recursion follows nested objects and arrays whose elements are *all*
/// objects. Arrays mixing objects with scalars are returned as-is, including
/// any objects inside them.
///
/// When two keys of one object normalize to the same name, the one that comes
/// later in the object's iteration (document) order wins.
pub fn normalize_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map)),
        other => other.clone(),
    }
}

fn normalize_object(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let renamed = canonical_key(key).to_string();
        out.insert(renamed, normalize_value(value));
    }
    out
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map)),
        Value::Array(items) if items.iter().all(Value::is_object) => {
            Value::Array(items.iter().map(normalize_value).collect())
        }
        other => other.clone(),
    }
}
