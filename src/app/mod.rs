mod event_handler;
mod pipeline;
mod state;
mod workflow;

pub use event_handler::handle_backend_event;
pub use state::{AppState, BackendEvent};
pub use workflow::{ClassificationResult, ErrorInfo, WorkflowState, FALLBACK_LABEL};
