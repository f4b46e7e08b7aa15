use std::fmt;

use crate::app::WorkflowState;
use crate::recommendations::RecommendationTable;
use crate::selection::{PreviewId, SelectedImage};

/// How many service-reported alternatives the result panel lists.
const MAX_ALTERNATIVES: usize = 3;

/// Result panel contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    pub label: String,
    pub recommendations: Vec<String>,
    pub alternatives: Vec<(String, f64)>,
    pub failed: bool,
}

/// Everything a surface needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub preview: Option<PreviewId>,
    pub file_name: Option<String>,
    pub loading: bool,
    pub submit_enabled: bool,
    pub clear_enabled: bool,
    pub result: Option<ResultPanel>,
    pub notice: Option<String>,
}

impl View {
    pub fn build(
        state: &WorkflowState,
        image: Option<&SelectedImage>,
        table: &RecommendationTable,
        notice: Option<&str>,
    ) -> Self {
        let loading = matches!(state, WorkflowState::Submitting);
        let result = state.display_label().map(|label| {
            let alternatives = match state {
                WorkflowState::Succeeded(result) => {
                    let mut ranked = result.confidences();
                    ranked.truncate(MAX_ALTERNATIVES);
                    ranked
                }
                _ => Vec::new(),
            };
            ResultPanel {
                label: label.to_string(),
                recommendations: table.lookup(label).to_vec(),
                alternatives,
                failed: matches!(state, WorkflowState::Failed(_)),
            }
        });

        Self {
            preview: image.map(|i| i.preview.id()),
            file_name: image.map(|i| i.file_name.clone()),
            loading,
            submit_enabled: !loading,
            clear_enabled: true,
            result,
            notice: notice.map(str::to_string),
        }
    }
}

impl fmt::Display for ResultPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classified Label: {}", self.label)?;
        if !self.alternatives.is_empty() {
            writeln!(f, "Confidences:")?;
            for (label, confidence) in &self.alternatives {
                writeln!(f, "  {label}: {:.1}%", confidence * 100.0)?;
            }
        }
        if !self.recommendations.is_empty() {
            writeln!(f, "Recommended Actions:")?;
            for (i, action) in self.recommendations.iter().enumerate() {
                writeln!(f, "  {}. {action}", i + 1)?;
            }
        }
        Ok(())
    }
}
