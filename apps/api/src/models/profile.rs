use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Deployment profile: which schema document and template a deployment uses,
/// plus optional section defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Schema document name inside the `cv-schemas` container.
    #[serde(rename = "schema", alias = "schema_file")]
    pub schema_file: String,
    /// Template name inside the `cv-generator` container.
    pub template: String,
    pub agency_name: Option<String>,
    pub agency_logo: Option<String>,
    pub default_section_visibility: Option<BTreeMap<String, bool>>,
    /// Free-form in older profiles; only a list of strings is used as an order.
    pub default_section_order: Option<Value>,
}

impl Profile {
    pub fn default_section_order(&self) -> Option<Vec<String>> {
        let items = self.default_section_order.as_ref()?.as_array()?;
        items
            .iter()
            .map(|item| item.as_str().map(String::from))
            .collect()
    }
}
