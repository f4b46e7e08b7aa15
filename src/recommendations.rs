use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Actions shipped with the binary, keyed by the label the model returns.
const BUILTIN: &[(&str, &[&str])] = &[
    (
        "Corn___Common_Rust",
        &[
            "Remove infected leaves.",
            "Apply fungicides.",
            "Monitor for rust development.",
        ],
    ),
    (
        "Corn___Gray_Leaf_Spot",
        &[
            "Use resistant hybrids.",
            "Apply foliar fungicides.",
            "Practice crop rotation.",
        ],
    ),
    (
        "Corn___Healthy",
        &[
            "No actions needed.",
            "Continue regular monitoring.",
            "Maintain good crop management practices.",
        ],
    ),
    (
        "Corn___Northern_Leaf_Blight",
        &[
            "Use resistant hybrids.",
            "Apply fungicides at tasseling.",
            "Remove crop residue.",
        ],
    ),
    (
        "Corn___Northern_Leaf_Spot",
        &[
            "Use resistant hybrids.",
            "Apply foliar fungicides.",
            "Practice crop rotation.",
        ],
    ),
    (
        "Corn___Phaeosphaeria_Leaf_Spot",
        &[
            "Apply appropriate fungicides.",
            "Practice crop rotation.",
            "Remove crop debris.",
        ],
    ),
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read recommendation table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid recommendation table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only mapping from exact label to ordered recommended actions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationTable {
    entries: HashMap<String, Vec<String>>,
}

impl RecommendationTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(label, actions)| {
                (
                    label.to_string(),
                    actions.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Parse a JSON object of `label -> [action, ...]`.
    pub fn from_json(data: &str) -> Result<Self, TableError> {
        let entries: HashMap<String, Vec<String>> = serde_json::from_str(data)?;
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Load from `path` if given, falling back to the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        match Self::load(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} recommendation entries from {}",
                    table.len(),
                    path.display()
                );
                table
            }
            Err(e) => {
                log::warn!("{e}; using built-in recommendations");
                Self::builtin()
            }
        }
    }

    /// Actions for `label`, matched verbatim. Unknown labels have none.
    pub fn lookup(&self, label: &str) -> &[String] {
        self.entries.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FALLBACK_LABEL;

    #[test]
    fn test_healthy_label_actions() {
        let table = RecommendationTable::builtin();
        assert_eq!(
            table.lookup("Corn___Healthy"),
            [
                "No actions needed.",
                "Continue regular monitoring.",
                "Maintain good crop management practices.",
            ]
        );
    }

    #[test]
    fn test_unknown_and_near_miss_labels_are_empty() {
        let table = RecommendationTable::builtin();
        assert!(table.lookup("Tomato___Early_Blight").is_empty());
        assert!(table.lookup("corn___healthy").is_empty());
        assert!(table.lookup(" Corn___Healthy").is_empty());
        assert!(table.lookup(FALLBACK_LABEL).is_empty());
    }

    #[test]
    fn test_builtin_covers_six_labels() {
        let table = RecommendationTable::builtin();
        assert_eq!(table.len(), 6);
        for (label, _) in BUILTIN {
            assert_eq!(table.lookup(label).len(), 3);
        }
    }

    #[test]
    fn test_from_json_keeps_order() {
        let table =
            RecommendationTable::from_json(r#"{"Rice___Blast": ["Drain field.", "Spray."]}"#)
                .unwrap();
        assert_eq!(table.lookup("Rice___Blast"), ["Drain field.", "Spray."]);
    }

    #[test]
    fn test_invalid_file_falls_back_to_builtin() {
        let path = std::env::temp_dir().join("leaf-doctor-bad-table.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let table = RecommendationTable::load_or_builtin(Some(&path));
        assert_eq!(table, RecommendationTable::builtin());
        let _ = fs::remove_file(&path);
    }
}
