//! Structural validation of normalized generation requests.
//!
//! Schemas are open: fields a schema does not declare are ignored. Each object
//! reports every failing field in declaration order, while a list reports only
//! its first failing element so a long list cannot flood the error output.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::pipeline::keys::canonical_key;

/// Accepted values of `output_format`.
pub const OUTPUT_FORMATS: &[&str] = &["doc", "docx", "pdf"];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Any non-null value.
    Any,
    String {
        non_empty: bool,
    },
    Boolean,
    Number,
    /// A string drawn from a closed set.
    OneOf(Vec<String>),
    List(Box<FieldType>),
    /// An object with arbitrary keys whose values share one type.
    Map(Box<FieldType>),
    Object(ObjectSchema),
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::String { non_empty: false }
    }

    pub fn non_empty_string() -> Self {
        FieldType::String { non_empty: true }
    }

    pub fn list_of(item: FieldType) -> Self {
        FieldType::List(Box::new(item))
    }

    pub fn map_of(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    pub fn one_of(values: &[&str]) -> Self {
        FieldType::OneOf(values.iter().map(|v| v.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    /// Required fields must be present and non-null.
    pub required: bool,
}

/// An ordered field table. Declaration order is the order errors are reported in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<FieldSpec>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &str, ty: FieldType) -> Self {
        self.upsert(FieldSpec {
            name: name.to_string(),
            ty,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, ty: FieldType) -> Self {
        self.upsert(FieldSpec {
            name: name.to_string(),
            ty,
            required: false,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Merges `other` into this schema. Rules only accumulate: a field stays
    /// required if either side requires it, strings stay non-empty if either
    /// side says so, and nested objects, list items and map values merge the
    /// same way. Where both sides declare different concrete types `other`'s
    /// type wins; an untyped declaration in `other` keeps the existing type.
    /// Fields declared on only one side are kept, new ones appended after the
    /// existing declaration order.
    pub fn overlay(mut self, other: ObjectSchema) -> Self {
        for incoming in other.fields {
            match self.fields.iter_mut().find(|f| f.name == incoming.name) {
                Some(existing) => {
                    existing.ty = merge_types(&existing.ty, incoming.ty);
                    existing.required |= incoming.required;
                }
                None => self.fields.push(incoming),
            }
        }
        self
    }

    /// Reads a JSON-Schema-like document (`properties`, `required`, `type`,
    /// `items`, `enum`). Property names go through the key normalization table
    /// so camelCase schema documents match normalized records.
    pub fn from_json_schema(doc: &Value) -> Self {
        let required: Vec<&str> = doc
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut schema = ObjectSchema::new();
        if let Some(props) = doc.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                let canonical = canonical_key(name);
                let is_required = required
                    .iter()
                    .any(|r| *r == name.as_str() || canonical_key(r) == canonical);
                schema.upsert(FieldSpec {
                    name: canonical.to_string(),
                    ty: field_type_from_json(prop),
                    required: is_required,
                });
            }
        }
        schema
    }

    fn upsert(&mut self, spec: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }
}

fn merge_types(base: &FieldType, top: FieldType) -> FieldType {
    match (base, top) {
        (FieldType::Object(base), FieldType::Object(top)) => {
            FieldType::Object(base.clone().overlay(top))
        }
        (FieldType::List(base), FieldType::List(top)) => {
            FieldType::list_of(merge_types(base, *top))
        }
        (FieldType::Map(base), FieldType::Map(top)) => {
            FieldType::map_of(merge_types(base, *top))
        }
        (FieldType::String { non_empty: a }, FieldType::String { non_empty: b }) => {
            FieldType::String { non_empty: *a || b }
        }
        (base, FieldType::Any) => base.clone(),
        (_, top) => top,
    }
}

fn field_type_from_json(prop: &Value) -> FieldType {
    if let Some(variants) = prop.get("enum").and_then(Value::as_array) {
        return FieldType::OneOf(
            variants
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        );
    }

    let type_name = match prop.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // ["string", "null"] style unions: nullability is already the
        // optional-field default, so only the concrete type matters.
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    };

    match type_name {
        Some("string") => FieldType::String {
            non_empty: prop
                .get("minLength")
                .and_then(Value::as_u64)
                .is_some_and(|n| n > 0),
        },
        Some("boolean") => FieldType::Boolean,
        Some("number") | Some("integer") => FieldType::Number,
        Some("array") => FieldType::list_of(
            prop.get("items")
                .map(field_type_from_json)
                .unwrap_or(FieldType::Any),
        ),
        Some("object") => match prop.get("additionalProperties") {
            Some(values @ Value::Object(_)) if prop.get("properties").is_none() => {
                FieldType::map_of(field_type_from_json(values))
            }
            _ => FieldType::Object(ObjectSchema::from_json_schema(prop)),
        },
        _ => FieldType::Any,
    }
}

/// One violation, e.g. `data.experience[2].start_date: missing required field`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaValidationResult {
    pub passed: bool,
    pub errors: Vec<FieldError>,
}

/// Validates normalized records against a root [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    root: ObjectSchema,
}

impl SchemaValidator {
    pub fn new(root: ObjectSchema) -> Self {
        Self { root }
    }

    /// The built-in CV generation request schema.
    pub fn canonical() -> Self {
        Self::new(canonical_request_schema())
    }

    /// Layers an external schema document over the current table.
    pub fn with_schema_document(self, doc: &Value) -> Self {
        Self::new(self.root.overlay(ObjectSchema::from_json_schema(doc)))
    }

    pub fn schema(&self) -> &ObjectSchema {
        &self.root
    }

    pub fn validate(&self, record: &Value) -> SchemaValidationResult {
        let mut errors = Vec::new();
        match record.as_object() {
            Some(map) => validate_object(&self.root, map, "", &mut errors),
            None => errors.push(FieldError {
                path: "$".to_string(),
                reason: format!("expected object, found {}", type_name(record)),
            }),
        }
        SchemaValidationResult {
            passed: errors.is_empty(),
            errors,
        }
    }
}

fn validate_object(
    schema: &ObjectSchema,
    map: &serde_json::Map<String, Value>,
    prefix: &str,
    errors: &mut Vec<FieldError>,
) {
    for spec in &schema.fields {
        let path = join_path(prefix, &spec.name);
        match map.get(&spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    errors.push(FieldError {
                        path,
                        reason: "missing required field".to_string(),
                    });
                }
            }
            Some(value) => check(&spec.ty, value, &path, errors),
        }
    }
}

fn check(ty: &FieldType, value: &Value, path: &str, errors: &mut Vec<FieldError>) {
    let mismatch = |expected: &str| FieldError {
        path: path.to_string(),
        reason: format!("expected {expected}, found {}", type_name(value)),
    };

    match ty {
        FieldType::Any => {
            if value.is_null() {
                errors.push(mismatch("a value"));
            }
        }
        FieldType::String { non_empty } => match value.as_str() {
            Some(s) if *non_empty && s.trim().is_empty() => errors.push(FieldError {
                path: path.to_string(),
                reason: "must not be empty".to_string(),
            }),
            Some(_) => {}
            None => errors.push(mismatch("string")),
        },
        FieldType::Boolean => {
            if !value.is_boolean() {
                errors.push(mismatch("boolean"));
            }
        }
        FieldType::Number => {
            if !value.is_number() {
                errors.push(mismatch("number"));
            }
        }
        FieldType::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => {}
            Some(s) => errors.push(FieldError {
                path: path.to_string(),
                reason: format!("'{s}' is not one of {}", allowed.join(", ")),
            }),
            None => errors.push(mismatch("string")),
        },
        FieldType::List(item_ty) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    if let Some(first) = first_error(item_ty, item, &item_path) {
                        errors.push(first);
                        break;
                    }
                }
            }
            None => errors.push(mismatch("array")),
        },
        FieldType::Map(value_ty) => match value.as_object() {
            Some(entries) => {
                for (key, entry) in entries {
                    let entry_path = join_path(path, key);
                    if let Some(first) = first_error(value_ty, entry, &entry_path) {
                        errors.push(first);
                        break;
                    }
                }
            }
            None => errors.push(mismatch("object")),
        },
        FieldType::Object(schema) => match value.as_object() {
            Some(map) => validate_object(schema, map, path, errors),
            None => errors.push(mismatch("object")),
        },
    }
}

fn first_error(ty: &FieldType, value: &Value, path: &str) -> Option<FieldError> {
    let mut found = Vec::new();
    check(ty, value, path, &mut found);
    found.into_iter().next()
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Canonical schema
// ────────────────────────────────────────────────────────────────────────────

pub fn canonical_request_schema() -> ObjectSchema {
    let recruiter = ObjectSchema::new()
        .optional("first_name", FieldType::string())
        .optional("last_name", FieldType::string())
        .optional("email", FieldType::string())
        .optional("phone", FieldType::string())
        .optional("agency_name", FieldType::string())
        .optional("agency_logo", FieldType::string())
        .optional("website", FieldType::string());

    ObjectSchema::new()
        .optional("template", FieldType::string())
        .optional("output_format", FieldType::one_of(OUTPUT_FORMATS))
        .optional("section_order", FieldType::list_of(FieldType::string()))
        .optional("section_visibility", FieldType::map_of(FieldType::Boolean))
        .optional("is_anonymized", FieldType::Boolean)
        .optional("recruiter_profile", FieldType::Object(recruiter))
        .required("data", FieldType::Object(cv_data_schema()))
}

fn cv_data_schema() -> ObjectSchema {
    let experience = ObjectSchema::new()
        .required("role", FieldType::string())
        .required("company", FieldType::string())
        .required("start_date", FieldType::string())
        .optional("end_date", FieldType::string())
        .optional("current", FieldType::Boolean)
        .optional("description", FieldType::string())
        .optional("achievements", FieldType::list_of(FieldType::string()));

    let education = ObjectSchema::new()
        .required("institution", FieldType::string())
        .required("degree", FieldType::string())
        .optional("field", FieldType::string())
        .optional("start_date", FieldType::string())
        .optional("end_date", FieldType::string())
        .optional("grade", FieldType::string())
        .optional("description", FieldType::string());

    let certification = ObjectSchema::new()
        .required("name", FieldType::string())
        .optional("issuer", FieldType::string())
        .optional("date", FieldType::string())
        .optional("description", FieldType::string());

    let achievement = ObjectSchema::new()
        .required("title", FieldType::string())
        .optional("description", FieldType::string())
        .optional("date", FieldType::string());

    let language = ObjectSchema::new()
        .required("language", FieldType::string())
        .optional("proficiency", FieldType::string());

    let membership = ObjectSchema::new()
        .required("organization", FieldType::string())
        .optional("role", FieldType::string())
        .optional("start_date", FieldType::string())
        .optional("end_date", FieldType::string());

    let earlier_career = ObjectSchema::new()
        .required("role", FieldType::string())
        .optional("company", FieldType::string())
        .optional("period", FieldType::string())
        .optional("description", FieldType::string());

    let publication = ObjectSchema::new()
        .required("title", FieldType::string())
        .optional("publisher", FieldType::string())
        .optional("date", FieldType::string())
        .optional("url", FieldType::string())
        .optional("description", FieldType::string());

    ObjectSchema::new()
        .required("first_name", FieldType::non_empty_string())
        .required("surname", FieldType::non_empty_string())
        .optional("email", FieldType::string())
        .optional("phone", FieldType::string())
        .optional("address", FieldType::string())
        .optional("linkedin", FieldType::string())
        .optional("website", FieldType::string())
        .optional("profile_statement", FieldType::string())
        .optional("experience", FieldType::list_of(FieldType::Object(experience)))
        .optional("education", FieldType::list_of(FieldType::Object(education)))
        .optional("skills", FieldType::list_of(FieldType::string()))
        .optional(
            "certifications",
            FieldType::list_of(FieldType::Object(certification)),
        )
        .optional(
            "achievements",
            FieldType::list_of(FieldType::Object(achievement)),
        )
        .optional("languages", FieldType::list_of(FieldType::Object(language)))
        .optional(
            "professional_memberships",
            FieldType::list_of(FieldType::Object(membership)),
        )
        .optional(
            "earlier_career",
            FieldType::list_of(FieldType::Object(earlier_career)),
        )
        .optional(
            "publications",
            FieldType::list_of(FieldType::Object(publication)),
        )
        .optional("additional_details", FieldType::list_of(FieldType::string()))
}
