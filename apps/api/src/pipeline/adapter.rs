//! Format adapter — maps between the CV parser's output shape and the
//! generator's request shape.
//!
//! Parser shape: flat `contact_info`, snake_case keys, `title` / `is_current`.
//! Generator shape: everything under `data`, camelCase keys, `role` / `current`.
//!
//! Both directions are total: any input (including null, scalars, or objects
//! missing every field) produces a record, never an error. List entries are
//! always emitted with every field present, defaulting to `""` / `false`.

use serde::Serialize;
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Generator shape
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<GeneratorData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorData {
    pub first_name: String,
    pub surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub profile_statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<GeneratorExperience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<GeneratorEducation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<CertificationItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<LanguageItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<AchievementItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorExperience {
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorEducation {
    pub institution: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
    pub grade: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Parser shape
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParserRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<ParserExperience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<ParserEducation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<CertificationItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<LanguageItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<AchievementItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParserExperience {
    pub title: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParserEducation {
    pub institution: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
    pub grade: String,
}

// Subsections spelled identically in both shapes.

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CertificationItem {
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanguageItem {
    pub language: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AchievementItem {
    pub title: String,
    pub description: String,
    pub date: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Conversions
// ────────────────────────────────────────────────────────────────────────────

/// Parser shape → generator shape. Empty, null, or non-object input yields
/// an empty record.
pub fn parser_to_generator(parser: &Value) -> GeneratorRecord {
    let Some(root) = parser.as_object().filter(|m| !m.is_empty()) else {
        return GeneratorRecord::default();
    };

    let contact = root.get("contact_info").unwrap_or(&Value::Null);
    let (linkedin, website) = classify_links(root.get("links"));

    let data = GeneratorData {
        first_name: text(contact, "first_name"),
        surname: text(contact, "last_name"),
        email: contact_text(contact, "email"),
        phone: contact_text(contact, "phone"),
        address: contact_text(contact, "location"),
        profile_statement: text(parser, "personal_statement"),
        linkedin,
        website,
        skills: items(parser, "skills").map(<[Value]>::to_vec),
        experience: map_items(parser, "experience", |exp| GeneratorExperience {
            role: text(exp, "title"),
            company: text(exp, "company"),
            start_date: text(exp, "start_date"),
            end_date: text(exp, "end_date"),
            current: flag(exp, "is_current"),
            description: text(exp, "description"),
        }),
        education: map_items(parser, "education", |edu| GeneratorEducation {
            institution: text(edu, "institution"),
            degree: text(edu, "degree"),
            start_date: text(edu, "start_date"),
            end_date: text(edu, "end_date"),
            grade: text(edu, "grade"),
        }),
        certifications: map_items(parser, "certifications", certification),
        languages: map_items(parser, "languages", language),
        achievements: map_items(parser, "achievements", achievement),
    };

    GeneratorRecord { data: Some(data) }
}

/// Generator shape → parser shape. Empty, null, or non-object input yields
/// an empty record.
pub fn generator_to_parser(generator: &Value) -> ParserRecord {
    if !generator.as_object().is_some_and(|m| !m.is_empty()) {
        return ParserRecord::default();
    }
    let data = generator.get("data").unwrap_or(&Value::Null);

    let links: Vec<String> = ["linkedin", "website"]
        .into_iter()
        .filter_map(|key| opt_text(data, key))
        .filter(|link| !link.is_empty())
        .collect();

    ParserRecord {
        contact_info: Some(ContactInfo {
            first_name: text(data, "firstName"),
            last_name: text(data, "surname"),
            email: text(data, "email"),
            phone: text(data, "phone"),
            location: text(data, "address"),
        }),
        personal_statement: Some(text(data, "profileStatement")),
        links: (!links.is_empty()).then_some(links),
        skills: items(data, "skills").map(<[Value]>::to_vec),
        experience: map_items(data, "experience", |exp| ParserExperience {
            title: text(exp, "role"),
            company: text(exp, "company"),
            start_date: text(exp, "startDate"),
            end_date: text(exp, "endDate"),
            is_current: flag(exp, "current"),
            description: text(exp, "description"),
        }),
        education: map_items(data, "education", |edu| ParserEducation {
            institution: text(edu, "institution"),
            degree: text(edu, "degree"),
            start_date: text(edu, "startDate"),
            end_date: text(edu, "endDate"),
            grade: text(edu, "grade"),
        }),
        certifications: map_items(data, "certifications", certification),
        languages: map_items(data, "languages", language),
        achievements: map_items(data, "achievements", achievement),
    }
}

/// First link mentioning "linkedin" becomes `linkedin`; first mentioning
/// "github" or "gitlab" becomes `website`. Everything else is dropped.
fn classify_links(links: Option<&Value>) -> (Option<String>, Option<String>) {
    let mut linkedin = None;
    let mut website = None;

    let Some(links) = links.and_then(Value::as_array) else {
        return (linkedin, website);
    };

    for link in links.iter().filter_map(Value::as_str) {
        let lower = link.to_lowercase();
        if lower.contains("linkedin") {
            linkedin.get_or_insert_with(|| link.to_string());
        } else if lower.contains("github") || lower.contains("gitlab") {
            website.get_or_insert_with(|| link.to_string());
        }
    }
    (linkedin, website)
}

fn certification(cert: &Value) -> CertificationItem {
    CertificationItem {
        name: text(cert, "name"),
        issuer: text(cert, "issuer"),
        date: text(cert, "date"),
        description: text(cert, "description"),
    }
}

fn language(lang: &Value) -> LanguageItem {
    LanguageItem {
        language: text(lang, "language"),
        proficiency: text(lang, "proficiency"),
    }
}

fn achievement(ach: &Value) -> AchievementItem {
    AchievementItem {
        title: text(ach, "title"),
        description: text(ach, "description"),
        date: text(ach, "date"),
    }
}

fn text(obj: &Value, key: &str) -> String {
    opt_text(obj, key).unwrap_or_default()
}

fn opt_text(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

/// The parser shape fills unknown contact details with `""`; those count as
/// absent.
fn contact_text(obj: &Value, key: &str) -> Option<String> {
    opt_text(obj, key).filter(|value| !value.is_empty())
}

fn flag(obj: &Value, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn items<'a>(obj: &'a Value, key: &str) -> Option<&'a [Value]> {
    obj.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn map_items<T>(obj: &Value, key: &str, f: impl Fn(&Value) -> T) -> Option<Vec<T>> {
    items(obj, key).map(|list| list.iter().map(f).collect())
}
