use serde_json::Value;

/// Recursively HTML-escapes every string in `value` so the rendered DOCX XML
/// never receives raw markup characters. Object keys are left alone.
pub fn escape_markup(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape_markup).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), escape_markup(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
