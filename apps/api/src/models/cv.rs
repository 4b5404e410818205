use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A CV generation request after key normalization and schema validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvGenerationRequest {
    pub template: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub section_order: Option<Vec<String>>,
    pub section_visibility: Option<BTreeMap<String, bool>>,
    pub is_anonymized: Option<bool>,
    pub recruiter_profile: Option<RecruiterProfile>,
    pub data: CvData,
}

impl CvGenerationRequest {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }

    pub fn anonymize(&self) -> bool {
        self.is_anonymized.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Doc,
    #[default]
    Docx,
    Pdf,
}

impl OutputFormat {
    /// Word output is always written as `.docx`, whatever the request called it.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Doc | OutputFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Doc | OutputFormat::Docx => DOCX_CONTENT_TYPE,
        }
    }
}

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecruiterProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub agency_name: Option<String>,
    pub agency_logo: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvData {
    pub first_name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub profile_statement: Option<String>,
    pub experience: Option<Vec<Experience>>,
    pub education: Option<Vec<Education>>,
    pub skills: Option<Vec<String>>,
    pub certifications: Option<Vec<Certification>>,
    pub achievements: Option<Vec<Achievement>>,
    pub languages: Option<Vec<Language>>,
    pub professional_memberships: Option<Vec<ProfessionalMembership>>,
    pub earlier_career: Option<Vec<EarlierCareer>>,
    pub publications: Option<Vec<Publication>>,
    pub additional_details: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub current: Option<bool>,
    pub description: Option<String>,
    pub achievements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub grade: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub language: String,
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalMembership {
    pub organization: String,
    pub role: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlierCareer {
    pub role: String,
    pub company: Option<String>,
    pub period: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_normalized_request() {
        let req: CvGenerationRequest = serde_json::from_value(json!({
            "output_format": "pdf",
            "is_anonymized": true,
            "section_visibility": { "skills": false },
            "data": {
                "first_name": "John",
                "surname": "Doe",
                "experience": [{ "role": "Dev", "company": "X", "start_date": "2020", "current": true }]
            }
        }))
        .expect("valid request");
        assert_eq!(req.output_format(), OutputFormat::Pdf);
        assert!(req.anonymize());
        assert_eq!(req.data.experience.as_ref().map(Vec::len), Some(1));
        assert_eq!(req.section_visibility.and_then(|v| v.get("skills").copied()), Some(false));
    }

    #[test]
    fn test_defaults() {
        let req: CvGenerationRequest = serde_json::from_value(json!({
            "data": { "first_name": "A", "surname": "B" }
        }))
        .expect("minimal request");
        assert_eq!(req.output_format(), OutputFormat::Docx);
        assert!(!req.anonymize());
    }

    #[test]
    fn test_doc_writes_docx_extension() {
        assert_eq!(OutputFormat::Doc.extension(), "docx");
        assert_eq!(OutputFormat::Pdf.extension(), "pdf");
        assert_eq!(OutputFormat::Pdf.content_type(), "application/pdf");
    }
}
