use serde_json::Value;
use thiserror::Error;

use crate::classifier::{ClassifyError, ImagePayload};
use crate::selection::SelectedImage;

/// Label shown in the result panel when classification fails.
pub const FALLBACK_LABEL: &str = "An error occurred while processing your request.";

/// Successful classification: the first prediction, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    pub raw_payload: Value,
}

impl ClassificationResult {
    /// Alternatives reported by the service, best first, if any.
    pub fn confidences(&self) -> Vec<(String, f64)> {
        let Some(items) = self.raw_payload.get("confidences").and_then(Value::as_array) else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = items
            .iter()
            .filter_map(|item| {
                let label = item.get("label")?.as_str()?;
                let confidence = item.get("confidence")?.as_f64()?;
                Some((label.to_string(), confidence))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Submitting,
    Succeeded(ClassificationResult),
    Failed(ErrorInfo),
}

impl WorkflowState {
    /// Label for the result panel; `None` while there is nothing to show.
    pub fn display_label(&self) -> Option<&str> {
        match self {
            WorkflowState::Succeeded(result) => Some(&result.label),
            WorkflowState::Failed(_) => Some(FALLBACK_LABEL),
            WorkflowState::Idle | WorkflowState::Submitting => None,
        }
    }
}

/// Local precondition failures. These never reach the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("no image selected")]
    NoImageSelected,
    #[error("submission already in progress")]
    SubmissionInProgress,
}

/// A submission accepted by [`Workflow::submit`]; its outcome must be
/// handed back with the same generation.
#[derive(Debug)]
pub struct Ticket {
    pub generation: u64,
    pub payload: ImagePayload,
}

/// What happened to an outcome passed to [`Workflow::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

/// Request lifecycle of a single classification surface.
///
/// Every reset and every accepted submission bumps the generation, so an
/// outcome that arrives after a `clear()` no longer matches and is dropped.
#[derive(Debug)]
pub struct Workflow {
    state: WorkflowState,
    generation: u64,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_submitting(&self) -> bool {
        self.state == WorkflowState::Submitting
    }

    /// Start a submission for `image`. On success the state is `Submitting`
    /// and any previous result is gone.
    pub fn submit(&mut self, image: Option<&SelectedImage>) -> Result<Ticket, WorkflowError> {
        if self.is_submitting() {
            return Err(WorkflowError::SubmissionInProgress);
        }
        let image = image.ok_or(WorkflowError::NoImageSelected)?;

        self.generation += 1;
        self.state = WorkflowState::Submitting;
        log::info!(
            "Submitting {} (generation {})",
            image.file_name,
            self.generation
        );

        Ok(Ticket {
            generation: self.generation,
            payload: ImagePayload {
                bytes: image.bytes.clone(),
                mime_type: image.mime_type.clone(),
                file_name: image.file_name.clone(),
            },
        })
    }

    /// Apply the outcome of the call tagged `generation`, unless a reset or
    /// newer submission has happened since.
    pub fn resolve(
        &mut self,
        generation: u64,
        outcome: Result<Vec<Value>, ClassifyError>,
    ) -> Resolution {
        if generation != self.generation || !self.is_submitting() {
            log::warn!(
                "Discarding stale response (generation {generation}, current {})",
                self.generation
            );
            return Resolution::Stale;
        }

        self.state = match outcome.and_then(first_prediction) {
            Ok(result) => {
                log::info!("Classified as {}", result.label);
                WorkflowState::Succeeded(result)
            }
            Err(e) => {
                log::error!("Classification failed: {e}");
                WorkflowState::Failed(ErrorInfo {
                    message: e.to_string(),
                })
            }
        };
        Resolution::Applied
    }

    /// Back to `Idle`, orphaning any call still in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = WorkflowState::Idle;
    }
}

fn first_prediction(predictions: Vec<Value>) -> Result<ClassificationResult, ClassifyError> {
    let first = predictions
        .into_iter()
        .next()
        .ok_or_else(|| ClassifyError::Malformed("empty prediction sequence".into()))?;
    let label = first
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifyError::Malformed("prediction has no label".into()))?
        .to_string();
    Ok(ClassificationResult {
        label,
        raw_payload: first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{DetachedPreviews, SelectionManager};
    use serde_json::json;
    use std::rc::Rc;

    fn selection_with_image() -> SelectionManager {
        let mut selection = SelectionManager::new(Rc::new(DetachedPreviews::default()));
        selection
            .select(vec![0xff, 0xd8, 0xff], "image/jpeg", "leaf.jpg")
            .unwrap();
        selection
    }

    #[test]
    fn test_submit_without_image_stays_idle() {
        let mut workflow = Workflow::new();
        assert_eq!(workflow.submit(None).unwrap_err(), WorkflowError::NoImageSelected);
        assert_eq!(*workflow.state(), WorkflowState::Idle);
        assert_eq!(workflow.generation(), 0);

        // Same after a full cycle that ends in Idle.
        let selection = selection_with_image();
        let ticket = workflow.submit(selection.current()).unwrap();
        workflow.resolve(ticket.generation, Ok(vec![json!({"label": "x"})]));
        workflow.reset();
        assert_eq!(workflow.submit(None).unwrap_err(), WorkflowError::NoImageSelected);
        assert_eq!(*workflow.state(), WorkflowState::Idle);
    }

    #[test]
    fn test_reentrant_submit_is_rejected() {
        let selection = selection_with_image();
        let mut workflow = Workflow::new();
        let ticket = workflow.submit(selection.current()).unwrap();

        let err = workflow.submit(selection.current()).unwrap_err();
        assert_eq!(err, WorkflowError::SubmissionInProgress);
        assert!(workflow.is_submitting());
        assert_eq!(workflow.generation(), ticket.generation);
    }

    #[test]
    fn test_ticket_carries_image_payload() {
        let selection = selection_with_image();
        let mut workflow = Workflow::new();
        let ticket = workflow.submit(selection.current()).unwrap();
        assert_eq!(ticket.payload.bytes, vec![0xff, 0xd8, 0xff]);
        assert_eq!(ticket.payload.mime_type, "image/jpeg");
        assert_eq!(ticket.payload.file_name, "leaf.jpg");
    }

    #[test]
    fn test_first_label_used_verbatim() {
        let selection = selection_with_image();
        let mut workflow = Workflow::new();
        let ticket = workflow.submit(selection.current()).unwrap();

        let outcome = Ok(vec![
            json!({"label": " Corn___Common_Rust ", "confidences": []}),
            json!({"label": "Corn___Healthy"}),
        ]);
        assert_eq!(workflow.resolve(ticket.generation, outcome), Resolution::Applied);
        match workflow.state() {
            WorkflowState::Succeeded(result) => {
                assert_eq!(result.label, " Corn___Common_Rust ");
                assert_eq!(result.raw_payload["confidences"], json!([]));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_failures_show_fallback_label() {
        let selection = selection_with_image();
        let outcomes: Vec<Result<Vec<Value>, ClassifyError>> = vec![
            Ok(vec![]),
            Ok(vec![json!({"score": 0.3})]),
            Ok(vec![json!({"label": 7})]),
            Err(ClassifyError::Transport("connection refused".into())),
        ];

        for outcome in outcomes {
            let mut workflow = Workflow::new();
            let ticket = workflow.submit(selection.current()).unwrap();
            workflow.resolve(ticket.generation, outcome);
            assert!(matches!(workflow.state(), WorkflowState::Failed(_)));
            assert_eq!(
                workflow.state().display_label(),
                Some("An error occurred while processing your request.")
            );
        }
    }

    #[test]
    fn test_response_after_reset_is_discarded() {
        let selection = selection_with_image();
        let mut workflow = Workflow::new();
        let ticket = workflow.submit(selection.current()).unwrap();

        workflow.reset();
        let resolution =
            workflow.resolve(ticket.generation, Ok(vec![json!({"label": "Corn___Healthy"})]));

        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(*workflow.state(), WorkflowState::Idle);
        assert!(workflow.state().display_label().is_none());
    }

    #[test]
    fn test_old_response_does_not_overwrite_new_submission() {
        let selection = selection_with_image();
        let mut workflow = Workflow::new();
        let first = workflow.submit(selection.current()).unwrap();
        workflow.reset();
        let second = workflow.submit(selection.current()).unwrap();

        assert_eq!(
            workflow.resolve(first.generation, Ok(vec![json!({"label": "old"})])),
            Resolution::Stale
        );
        assert!(workflow.is_submitting());
        workflow.resolve(second.generation, Ok(vec![json!({"label": "new"})]));
        assert_eq!(workflow.state().display_label(), Some("new"));
    }

    #[test]
    fn test_resubmit_discards_previous_result() {
        let selection = selection_with_image();
        let mut workflow = Workflow::new();
        let ticket = workflow.submit(selection.current()).unwrap();
        workflow.resolve(ticket.generation, Ok(vec![json!({"label": "Corn___Healthy"})]));

        workflow.submit(selection.current()).unwrap();
        assert_eq!(*workflow.state(), WorkflowState::Submitting);
        assert!(workflow.state().display_label().is_none());
    }

    #[test]
    fn test_confidences_ranked_best_first() {
        let result = ClassificationResult {
            label: "Corn___Common_Rust".into(),
            raw_payload: json!({
                "label": "Corn___Common_Rust",
                "confidences": [
                    {"label": "Corn___Healthy", "confidence": 0.1},
                    {"label": "Corn___Common_Rust", "confidence": 0.85},
                    {"label": "bad"}
                ]
            }),
        };
        assert_eq!(
            result.confidences(),
            vec![
                ("Corn___Common_Rust".to_string(), 0.85),
                ("Corn___Healthy".to_string(), 0.1),
            ]
        );
    }
}
