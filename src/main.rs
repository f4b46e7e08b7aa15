mod app;
mod classifier;
mod cli;
mod config;
mod recommendations;
mod render;
mod selection;
#[cfg(feature = "gui")]
mod ui;

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;

use app::AppState;
use classifier::{Classifier, GradioClient};
use cli::Cli;
use config::Config;
use recommendations::RecommendationTable;
use selection::DetachedPreviews;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load();
    cli.apply(&mut config);

    if cli.print_config {
        return match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize config: {e}");
                ExitCode::FAILURE
            }
        };
    }
    if cli.save_config {
        match config.save() {
            Ok(()) => log::info!("Saved config to {}", Config::path().display()),
            Err(e) => log::warn!("Failed to save config: {e}"),
        }
    }

    log::info!("Leaf doctor starting");
    let recommendations = Arc::new(RecommendationTable::load_or_builtin(
        config.recommendations_path.as_deref(),
    ));
    let classifier: Arc<dyn Classifier> =
        match GradioClient::new(&config.service, config.request_timeout()) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                log::error!("Failed to build HTTP client: {e}");
                return ExitCode::FAILURE;
            }
        };

    match cli.image {
        Some(image) => {
            let (backend_tx, backend_rx) = async_channel::unbounded();
            let state = match AppState::new(
                backend_tx,
                classifier,
                recommendations,
                Rc::new(DetachedPreviews::default()),
            ) {
                Ok(state) => Rc::new(RefCell::new(state)),
                Err(e) => {
                    log::error!("Failed to create tokio runtime: {e}");
                    return ExitCode::FAILURE;
                }
            };
            cli::run_headless(&state, &backend_rx, image)
        }
        None => run_desktop(classifier, recommendations),
    }
}

#[cfg(feature = "gui")]
fn run_desktop(
    classifier: Arc<dyn Classifier>,
    recommendations: Arc<RecommendationTable>,
) -> ExitCode {
    ui::launch(classifier, recommendations).into()
}

#[cfg(not(feature = "gui"))]
fn run_desktop(
    _classifier: Arc<dyn Classifier>,
    _recommendations: Arc<RecommendationTable>,
) -> ExitCode {
    eprintln!("No image given. Pass a leaf photo, or build with `--features gui` for the window.");
    ExitCode::FAILURE
}
