use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Input schema exported alongside the models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_cols: Vec<String>,
    #[serde(default)]
    pub cat_cols: Vec<String>,
    /// Identifier column used when the caller does not name one.
    #[serde(default = "default_id_fallback")]
    pub id_fallback: String,
}

fn default_id_fallback() -> String {
    "row_id".to_string()
}

impl ModelMetadata {
    pub fn is_categorical(&self, column: &str) -> bool {
        self.cat_cols.iter().any(|name| name == column)
    }
}

/// Levels learned for each categorical column by the preprocessing step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessSpec {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_defaults_optional_fields() {
        let meta: ModelMetadata =
            serde_json::from_str(r#"{"feature_cols": ["recency", "channel"]}"#).expect("parse");
        assert!(meta.cat_cols.is_empty());
        assert_eq!(meta.id_fallback, "row_id");
        assert!(!meta.is_categorical("channel"));
    }

    #[test]
    fn metadata_reads_categorical_columns() {
        let meta: ModelMetadata = serde_json::from_str(
            r#"{"feature_cols": ["recency", "channel"], "cat_cols": ["channel"], "id_fallback": "customer_id"}"#,
        )
        .expect("parse");
        assert!(meta.is_categorical("channel"));
        assert_eq!(meta.id_fallback, "customer_id");
    }
}
