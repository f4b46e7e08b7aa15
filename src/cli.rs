use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use crate::app::{handle_backend_event, AppState, BackendEvent, WorkflowState};
use crate::config::Config;

/// Classify a maize leaf photo and show recommended actions.
#[derive(Debug, Parser)]
#[command(name = "leaf-doctor", version, about)]
pub struct Cli {
    /// Leaf photo to classify. Without one, the desktop window opens (gui builds only).
    pub image: Option<PathBuf>,

    /// Service root, e.g. http://localhost:7860
    #[arg(long)]
    pub base_url: Option<String>,

    /// Hugging Face space id hosting the model
    #[arg(long)]
    pub space: Option<String>,

    /// Gradio route of the prediction endpoint
    #[arg(long)]
    pub route: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// JSON file mapping labels to recommended actions
    #[arg(long)]
    pub recommendations: Option<PathBuf>,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.service.base_url = Some(url.clone());
        }
        if let Some(space) = &self.space {
            config.service.space = space.clone();
        }
        if let Some(route) = &self.route {
            config.service.route = route.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = Some(secs);
        }
        if let Some(path) = &self.recommendations {
            config.recommendations_path = Some(path.clone());
        }
    }
}

/// Drive one select -> submit -> result cycle without a window.
pub fn run_headless(
    state: &Rc<RefCell<AppState>>,
    events: &async_channel::Receiver<BackendEvent>,
    image: PathBuf,
) -> ExitCode {
    handle_backend_event(state, BackendEvent::ImagePicked(image));
    // Exactly one ImageLoaded or ImageLoadFailed comes back.
    if !pump(state, events) {
        return ExitCode::FAILURE;
    }
    if let Some(notice) = state.borrow_mut().notice.take() {
        eprintln!("{notice}");
        return ExitCode::FAILURE;
    }

    handle_backend_event(state, BackendEvent::SubmitRequested);
    if let Some(notice) = state.borrow_mut().notice.take() {
        eprintln!("{notice}");
        return ExitCode::FAILURE;
    }

    eprintln!("Classifying...");
    while state.borrow().workflow.is_submitting() {
        if !pump(state, events) {
            return ExitCode::FAILURE;
        }
    }

    let view = state.borrow().view();
    if let Some(panel) = view.result {
        print!("{panel}");
    }
    let s = state.borrow();
    if let WorkflowState::Failed(info) = s.workflow.state() {
        eprintln!("{}", info.message);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Block on the next backend event and handle it. False if the channel closed.
fn pump(state: &Rc<RefCell<AppState>>, events: &async_channel::Receiver<BackendEvent>) -> bool {
    let next = state.borrow().tokio_rt.block_on(events.recv());
    match next {
        Ok(event) => {
            handle_backend_event(state, event);
            true
        }
        Err(e) => {
            log::error!("Event channel closed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "leaf-doctor",
            "leaf.jpg",
            "--base-url",
            "http://localhost:7860",
            "--route",
            "/classify",
            "--timeout",
            "20",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(cli.image, Some(PathBuf::from("leaf.jpg")));
        assert_eq!(
            config.service.base_url.as_deref(),
            Some("http://localhost:7860")
        );
        assert_eq!(config.service.route, "/classify");
        assert_eq!(config.request_timeout_secs, Some(20));
        assert_eq!(
            config.service.space,
            "srijonashraf/maize-leaf-disease-detection"
        );
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["leaf-doctor"]);
        let mut config = Config::default();
        config.request_timeout_secs = Some(3);
        cli.apply(&mut config);
        assert!(cli.image.is_none());
        assert_eq!(config.request_timeout_secs, Some(3));
        assert!(config.service.base_url.is_none());
    }
}
