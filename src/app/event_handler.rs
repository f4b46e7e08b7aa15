use std::cell::RefCell;
use std::rc::Rc;

use super::pipeline::{dispatch_classification, dispatch_image_load};
use super::state::{AppState, BackendEvent};
use super::workflow::{Resolution, WorkflowError};

/// Handle a backend event. This is the core state machine driver.
pub fn handle_backend_event(state: &Rc<RefCell<AppState>>, event: BackendEvent) {
    match event {
        BackendEvent::ImagePicked(path) => {
            let generation = {
                let mut s = state.borrow_mut();
                s.load_generation += 1;
                s.load_generation
            };
            log::info!("Loading {} (load {generation})", path.display());
            dispatch_image_load(state, generation, path);
        }
        BackendEvent::ImageLoaded {
            generation,
            bytes,
            mime_type,
            file_name,
        } => {
            let mut s = state.borrow_mut();
            if generation != s.load_generation {
                log::warn!("Discarding stale load of {file_name} (load {generation})");
                return;
            }
            let notice = match s.selection.select(bytes, &mime_type, &file_name) {
                Ok(_) => None,
                Err(e) => {
                    log::warn!("Rejected {file_name}: {e}");
                    Some(format!("{file_name}: {e}"))
                }
            };
            s.notice = notice;
        }
        BackendEvent::ImageLoadFailed {
            generation,
            message,
        } => {
            let mut s = state.borrow_mut();
            if generation != s.load_generation {
                log::warn!("Ignoring failed stale load: {message}");
                return;
            }
            log::error!("Image load failed: {message}");
            s.notice = Some(message);
        }
        BackendEvent::SubmitRequested => on_submit(state),
        BackendEvent::ClearRequested => {
            let mut s = state.borrow_mut();
            s.load_generation += 1;
            s.selection.clear();
            s.workflow.reset();
            s.notice = None;
            log::info!("Reset (generation {})", s.workflow.generation());
        }
        BackendEvent::ClassificationFinished {
            generation,
            outcome,
        } => {
            let resolution = state.borrow_mut().workflow.resolve(generation, outcome);
            if resolution == Resolution::Stale {
                log::info!("Ignored result for generation {generation}");
            }
        }
    }
}

fn on_submit(state: &Rc<RefCell<AppState>>) {
    let ticket = {
        let mut s = state.borrow_mut();
        let s = &mut *s;
        s.workflow.submit(s.selection.current())
    };

    match ticket {
        Ok(ticket) => {
            state.borrow_mut().notice = None;
            dispatch_classification(state, ticket);
        }
        Err(e) => {
            log::warn!("Submit rejected: {e}");
            let notice = match e {
                WorkflowError::NoImageSelected => "Please upload an image.".to_string(),
                WorkflowError::SubmissionInProgress => e.to_string(),
            };
            state.borrow_mut().notice = Some(notice);
        }
    }
}
