use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use super::workflow::Workflow;
use crate::classifier::{ClassifyError, Classifier};
use crate::recommendations::RecommendationTable;
use crate::render::View;
use crate::selection::{PreviewFactory, SelectionManager};

/// Events delivered to the main thread, from the UI or from background tasks.
#[derive(Debug)]
pub enum BackendEvent {
    ImagePicked(PathBuf),
    /// `generation` is the load generation current when the file was picked.
    ImageLoaded {
        generation: u64,
        bytes: Vec<u8>,
        mime_type: String,
        file_name: String,
    },
    ImageLoadFailed {
        generation: u64,
        message: String,
    },
    SubmitRequested,
    ClearRequested,
    ClassificationFinished {
        generation: u64,
        outcome: Result<Vec<Value>, ClassifyError>,
    },
}

/// Central application state. Lives on the main thread inside Rc<RefCell<>>.
pub struct AppState {
    pub selection: SelectionManager,
    pub workflow: Workflow,
    pub recommendations: Arc<RecommendationTable>,
    pub classifier: Arc<dyn Classifier>,
    pub tokio_rt: tokio::runtime::Runtime,
    pub backend_sender: async_channel::Sender<BackendEvent>,
    /// Bumped by every pick and clear; loads tagged with an older value are dropped.
    pub load_generation: u64,
    /// Last local problem (validation or file read), cleared by the next action.
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(
        sender: async_channel::Sender<BackendEvent>,
        classifier: Arc<dyn Classifier>,
        recommendations: Arc<RecommendationTable>,
        previews: Rc<dyn PreviewFactory>,
    ) -> std::io::Result<Self> {
        let tokio_rt = tokio::runtime::Runtime::new()?;

        Ok(Self {
            selection: SelectionManager::new(previews),
            workflow: Workflow::new(),
            recommendations,
            classifier,
            tokio_rt,
            backend_sender: sender,
            load_generation: 0,
            notice: None,
        })
    }

    /// Render-ready snapshot for whichever surface is attached.
    pub fn view(&self) -> View {
        View::build(
            self.workflow.state(),
            self.selection.current(),
            &self.recommendations,
            self.notice.as_deref(),
        )
    }
}
