use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// Identifier of a preview created by a [`PreviewFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewId(pub u64);

/// Creates and releases displayable previews for selected images.
///
/// The desktop surface turns bytes into a texture here; the headless runner
/// only tracks ids. Every id returned by `create` is passed to `release`
/// exactly once, when the owning [`PreviewHandle`] is dropped.
pub trait PreviewFactory {
    fn create(&self, bytes: &[u8], mime_type: &str) -> PreviewId;
    fn release(&self, id: PreviewId);
}

/// Owned preview resource. Dropping it releases the preview.
pub struct PreviewHandle {
    id: PreviewId,
    factory: Rc<dyn PreviewFactory>,
}

impl PreviewHandle {
    pub fn id(&self) -> PreviewId {
        self.id
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.factory.release(self.id);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.id.0).finish()
    }
}

/// The image currently chosen by the user.
#[derive(Debug)]
pub struct SelectedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub preview: PreviewHandle,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("selected file is empty")]
    Empty,
}

/// Owns at most one [`SelectedImage`] at a time.
pub struct SelectionManager {
    current: Option<SelectedImage>,
    previews: Rc<dyn PreviewFactory>,
}

impl SelectionManager {
    pub fn new(previews: Rc<dyn PreviewFactory>) -> Self {
        Self {
            current: None,
            previews,
        }
    }

    /// Replace the current selection. Any bytes are accepted; the previous
    /// preview is released before the new one is created.
    pub fn select(
        &mut self,
        bytes: Vec<u8>,
        mime_type: &str,
        file_name: &str,
    ) -> Result<&SelectedImage, SelectError> {
        if bytes.is_empty() {
            return Err(SelectError::Empty);
        }

        self.current = None;

        let id = self.previews.create(&bytes, mime_type);
        log::info!("Selected {file_name} ({} bytes, {mime_type})", bytes.len());
        let image = SelectedImage {
            bytes,
            mime_type: mime_type.to_string(),
            file_name: file_name.to_string(),
            preview: PreviewHandle {
                id,
                factory: self.previews.clone(),
            },
        };
        Ok(self.current.insert(image))
    }

    /// Drop the current selection, if any.
    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            log::info!("Selection cleared");
        }
    }

    pub fn current(&self) -> Option<&SelectedImage> {
        self.current.as_ref()
    }
}

/// Preview factory that hands out ids without rendering anything.
#[derive(Debug, Default)]
pub struct DetachedPreviews {
    next: std::cell::Cell<u64>,
}

impl PreviewFactory for DetachedPreviews {
    fn create(&self, _bytes: &[u8], _mime_type: &str) -> PreviewId {
        let id = self.next.get() + 1;
        self.next.set(id);
        PreviewId(id)
    }

    fn release(&self, id: PreviewId) {
        log::debug!("Released preview {}", id.0);
    }
}
