pub mod previews;
pub mod window;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use gtk4::prelude::*;

use crate::app::{self, AppState, BackendEvent};
use crate::classifier::Classifier;
use crate::recommendations::RecommendationTable;
use previews::TexturePreviews;

/// Run the desktop surface until the window closes.
pub fn launch(
    classifier: Arc<dyn Classifier>,
    recommendations: Arc<RecommendationTable>,
) -> gtk4::glib::ExitCode {
    let application = libadwaita::Application::builder()
        .application_id("com.github.leaf-doctor")
        .build();

    application.connect_activate(move |app| {
        on_activate(app, classifier.clone(), recommendations.clone());
    });
    // Arguments were already parsed by clap.
    application.run_with_args::<&str>(&[])
}

fn on_activate(
    app: &libadwaita::Application,
    classifier: Arc<dyn Classifier>,
    recommendations: Arc<RecommendationTable>,
) {
    // UI and background tasks both talk to the state through this channel
    let (backend_tx, backend_rx) = async_channel::unbounded::<BackendEvent>();

    let previews = Rc::new(TexturePreviews::default());
    let state = match AppState::new(
        backend_tx.clone(),
        classifier,
        recommendations,
        previews.clone(),
    ) {
        Ok(state) => Rc::new(RefCell::new(state)),
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            return;
        }
    };

    let widgets = window::build_window(app, backend_tx);
    window::render(&widgets, &previews, &state.borrow().view());
    widgets.window.present();

    gtk4::glib::spawn_future_local(async move {
        while let Ok(event) = backend_rx.recv().await {
            app::handle_backend_event(&state, event);
            window::render(&widgets, &previews, &state.borrow().view());
        }
    });
}
