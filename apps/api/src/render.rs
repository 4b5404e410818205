//! DOCX template rendering.
//!
//! `DocxTemplateRenderer` fills `{{ dotted.path }}` placeholders in the body,
//! header and footer parts of a DOCX archive from the rendering context.
//! Placeholders must sit inside a single text run to be recognized; Word
//! splits runs when text is edited piecemeal, so templates should type each
//! placeholder in one go.
//!
//! CPU-bound: callers run `render` inside `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::pipeline::RenderingContext;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template is not a valid DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),

    #[error("template part {0} is not UTF-8")]
    Encoding(String),
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &[u8], context: &RenderingContext) -> Result<Bytes, RenderError>;
}

pub struct DocxTemplateRenderer;

impl TemplateRenderer for DocxTemplateRenderer {
    fn render(&self, template: &[u8], context: &RenderingContext) -> Result<Bytes, RenderError> {
        let mut archive = ZipArchive::new(Cursor::new(template))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();

            if !is_text_part(&name) {
                writer.raw_copy_file(entry)?;
                continue;
            }

            let mut raw = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut raw)?;
            let xml = String::from_utf8(raw).map_err(|_| RenderError::Encoding(name.clone()))?;
            let options = FileOptions::default().compression_method(entry.compression());
            writer.start_file(name, options)?;
            writer.write_all(fill_placeholders(&xml, context).as_bytes())?;
        }

        let cursor = writer.finish()?;
        Ok(Bytes::from(cursor.into_inner()))
    }
}

fn is_text_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Replaces each `{{ path }}` with the context value at `path`. Unterminated
/// openers are copied through unchanged.
pub fn fill_placeholders(text: &str, context: &RenderingContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let path = rest[start + 2..start + 2 + len].trim();
        out.push_str(&display(context.lookup(path)));
        rest = &rest[start + 2 + len + 2..];
    }
    out.push_str(rest);
    out
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_object() && !item.is_array() && !item.is_null())
            .map(|item| display(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::{build_context, ContextOptions};
    use serde_json::json;

    /// Builds a minimal DOCX-shaped archive with the given body XML.
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        writer
            .start_file("[Content_Types].xml", options)
            .expect("start content types");
        writer
            .write_all(b"<Types/>")
            .expect("write content types");
        writer
            .start_file("word/document.xml", options)
            .expect("start document");
        writer.write_all(body.as_bytes()).expect("write document");
        writer.finish().expect("finish archive").into_inner()
    }

    pub(crate) fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).expect("valid archive");
        let mut part = archive.by_name(name).expect("part exists");
        let mut text = String::new();
        part.read_to_string(&mut text).expect("utf-8 part");
        text
    }

    fn context() -> RenderingContext {
        build_context(
            &json!({
                "data": {
                    "firstName": "John",
                    "surname": "Doe",
                    "skills": ["Rust", "SQL"],
                    "experience": [{ "role": "Dev", "current": true }],
                    "years": 7
                }
            }),
            &ContextOptions::default(),
        )
    }

    #[test]
    fn test_fill_placeholders() {
        let out = fill_placeholders(
            "<w:t>{{ data.firstName }} {{data.surname}}</w:t><w:t>{{ data.skills }}</w:t>",
            &context(),
        );
        assert_eq!(out, "<w:t>John Doe</w:t><w:t>Rust, SQL</w:t>");
    }

    #[test]
    fn test_fill_placeholders_scalars_and_missing() {
        let out = fill_placeholders(
            "{{ data.years }}|{{ data.experience.0.current }}|{{ data.nope }}|{{ data.experience }}",
            &context(),
        );
        assert_eq!(out, "7|true||");
    }

    #[test]
    fn test_unterminated_placeholder_kept() {
        assert_eq!(fill_placeholders("a {{ data.firstName", &context()), "a {{ data.firstName");
    }

    #[test]
    fn test_render_docx_archive() {
        let template = docx_with_body("<w:t>CV of {{ data.firstName }}</w:t>");
        let rendered = DocxTemplateRenderer
            .render(&template, &context())
            .expect("render succeeds");
        assert_eq!(read_part(&rendered, "word/document.xml"), "<w:t>CV of John</w:t>");
        assert_eq!(read_part(&rendered, "[Content_Types].xml"), "<Types/>");
    }

    #[test]
    fn test_render_rejects_non_zip() {
        let err = DocxTemplateRenderer
            .render(b"not a zip", &context())
            .expect_err("invalid archive");
        assert!(matches!(err, RenderError::Archive(_)));
    }
}
