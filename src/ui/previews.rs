use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use gtk4::{gdk, glib};

use crate::selection::{PreviewFactory, PreviewId};

/// Decodes selected images into GDK textures for the preview area.
#[derive(Default)]
pub struct TexturePreviews {
    next: Cell<u64>,
    textures: RefCell<HashMap<PreviewId, gdk::Texture>>,
}

impl TexturePreviews {
    pub fn texture(&self, id: PreviewId) -> Option<gdk::Texture> {
        self.textures.borrow().get(&id).cloned()
    }
}

impl PreviewFactory for TexturePreviews {
    fn create(&self, bytes: &[u8], mime_type: &str) -> PreviewId {
        let id = PreviewId(self.next.get() + 1);
        self.next.set(id.0);

        // Undecodable data still gets an id; it just has nothing to show.
        match gdk::Texture::from_bytes(&glib::Bytes::from(bytes)) {
            Ok(texture) => {
                self.textures.borrow_mut().insert(id, texture);
            }
            Err(e) => log::warn!("No preview for {mime_type} data: {e}"),
        }
        id
    }

    fn release(&self, id: PreviewId) {
        self.textures.borrow_mut().remove(&id);
    }
}
