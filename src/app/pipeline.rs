use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use super::state::{AppState, BackendEvent};
use super::workflow::Ticket;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Read a picked file on the tokio runtime and hand the bytes back, tagged
/// with the load generation it was picked under.
pub fn dispatch_image_load(state: &Rc<RefCell<AppState>>, generation: u64, path: PathBuf) {
    let s = state.borrow();
    let sender = s.backend_sender.clone();

    s.tokio_rt.spawn(async move {
        let event = match tokio::fs::read(&path).await {
            Ok(bytes) => BackendEvent::ImageLoaded {
                generation,
                mime_type: sniff_mime(&bytes).to_string(),
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".into()),
                bytes,
            },
            Err(e) => BackendEvent::ImageLoadFailed {
                generation,
                message: format!("{}: {e}", path.display()),
            },
        };
        let _ = sender.send(event).await;
    });
}

/// Content type from magic bytes. Unknown data is still forwarded as-is.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// Run the remote classification on the tokio runtime. The outcome comes
/// back tagged with the ticket's generation.
pub fn dispatch_classification(state: &Rc<RefCell<AppState>>, ticket: Ticket) {
    let s = state.borrow();
    let classifier = s.classifier.clone();
    let sender = s.backend_sender.clone();

    s.tokio_rt.spawn(async move {
        let Ticket {
            generation,
            payload,
        } = ticket;
        let started = std::time::Instant::now();
        let outcome = classifier.classify(&payload).await;
        log::debug!(
            "Generation {generation} finished in {:.1}s",
            started.elapsed().as_secs_f32()
        );
        let _ = sender
            .send(BackendEvent::ClassificationFinished {
                generation,
                outcome,
            })
            .await;
    });
}
