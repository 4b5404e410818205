//! Rendering context assembly: section order, section visibility,
//! anonymization and recruiter branding applied to a validated request.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Placeholder values written over candidate contact details.
const CONTACT_REDACTIONS: &[(&str, &str)] = &[
    ("email", "candidate@example.com"),
    ("phone", "+44 XXX XXX XXXX"),
    ("address", "United Kingdom"),
    ("linkedin", "linkedin.com/in/candidate"),
];

const DEFAULT_FIRST_INITIAL: char = 'A';
const DEFAULT_SURNAME_INITIAL: char = 'B';

/// Caller-supplied policies. Section identifiers are opaque here; whether they
/// name real sections is up to the template.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub section_order: Option<Vec<String>>,
    pub section_visibility: Option<BTreeMap<String, bool>>,
    pub anonymize: bool,
}

/// The finished structure handed to the template renderer. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderingContext(Value);

impl RenderingContext {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Resolves a dotted path such as `data.experience.0.role`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.0, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}

/// Builds a fresh context from `record`. The record itself is never modified;
/// anonymization works on a copy.
pub fn build_context(record: &Value, options: &ContextOptions) -> RenderingContext {
    let mut context = record.as_object().cloned().unwrap_or_default();

    if options.anonymize {
        if let Some(Value::Object(data)) = context.get_mut("data") {
            anonymize_personal(data);
        }
    }

    if let Some(order) = &options.section_order {
        context.insert(
            "sectionOrder".to_string(),
            Value::Array(order.iter().cloned().map(Value::String).collect()),
        );
    }

    if let Some(visibility) = &options.section_visibility {
        context.insert(
            "sectionVisibility".to_string(),
            Value::Object(
                visibility
                    .iter()
                    .map(|(section, visible)| (section.clone(), Value::Bool(*visible)))
                    .collect(),
            ),
        );
    }

    // The recruiter profile describes the issuing agency, not the candidate.
    if let Some(profile) = record
        .get("recruiterProfile")
        .or_else(|| record.get("recruiter_profile"))
    {
        context.insert("recruiterProfile".to_string(), profile.clone());
    }

    RenderingContext(Value::Object(context))
}

/// Replaces top-level personal fields of `data`. Nested sections such as
/// experience and education are left untouched. Works on both the camelCase
/// and the normalized spelling of the first-name key.
fn anonymize_personal(data: &mut Map<String, Value>) {
    let first_key = if data.contains_key("first_name") && !data.contains_key("firstName") {
        "first_name"
    } else {
        "firstName"
    };

    let first = initial(data.get(first_key), DEFAULT_FIRST_INITIAL);
    let surname = initial(data.get("surname"), DEFAULT_SURNAME_INITIAL);
    data.insert(first_key.to_string(), Value::String(first));
    data.insert("surname".to_string(), Value::String(surname));

    for (key, placeholder) in CONTACT_REDACTIONS {
        if let Some(value) = data.get_mut(*key) {
            *value = Value::String((*placeholder).to_string());
        }
    }
}

fn initial(name: Option<&Value>, fallback: char) -> String {
    let name = name.and_then(Value::as_str).unwrap_or_default();
    // Escaped input may start with an entity such as `&amp;`; keep it whole.
    if name.starts_with('&') {
        if let Some(end) = name.find(';').filter(|&end| end <= 8) {
            return format!("{}.", &name[..=end]);
        }
    }
    match name.chars().next() {
        Some(c) => format!("{c}."),
        None => format!("{fallback}."),
    }
}
