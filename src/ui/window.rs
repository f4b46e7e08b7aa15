use gtk4::prelude::*;
use libadwaita::prelude::*;

use super::previews::TexturePreviews;
use crate::app::BackendEvent;
use crate::render::View;

/// Handles returned from building the main window.
pub struct WindowWidgets {
    pub window: libadwaita::ApplicationWindow,
    pub picture: gtk4::Picture,
    pub placeholder: gtk4::Box,
    pub file_label: gtk4::Label,
    pub clear_button: gtk4::Button,
    pub submit_button: gtk4::Button,
    pub spinner: gtk4::Spinner,
    pub notice_label: gtk4::Label,
    pub result_group: libadwaita::PreferencesGroup,
    pub label_value: gtk4::Label,
    pub confidence_label: gtk4::Label,
    pub actions_box: gtk4::Box,
}

/// Build the main window. Every user action is forwarded to `backend_sender`.
pub fn build_window(
    app: &libadwaita::Application,
    backend_sender: async_channel::Sender<BackendEvent>,
) -> WindowWidgets {
    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Maize Leaf Disease Detection")
        .default_width(520)
        .default_height(720)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();
    toolbar_view.add_top_bar(&header);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.set_margin_top(12);
    content.set_margin_bottom(12);

    let intro = gtk4::Label::new(Some(
        "Upload an image of a maize leaf to classify its disease.",
    ));
    intro.add_css_class("dim-label");
    intro.set_wrap(true);
    content.append(&intro);

    // --- Drop / pick area ---
    let drop_frame = gtk4::Frame::new(None);
    drop_frame.set_height_request(260);

    let overlay = gtk4::Overlay::new();
    let picture = gtk4::Picture::new();
    picture.set_content_fit(gtk4::ContentFit::Contain);
    picture.set_visible(false);
    overlay.set_child(Some(&picture));

    let placeholder = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
    placeholder.set_halign(gtk4::Align::Center);
    placeholder.set_valign(gtk4::Align::Center);
    placeholder.append(&gtk4::Label::new(Some("Drop Image Here")));
    placeholder.append(&gtk4::Label::new(Some("- or -")));
    let pick_button = gtk4::Button::builder()
        .label("Click to Upload")
        .css_classes(["flat"])
        .build();
    placeholder.append(&pick_button);
    overlay.add_overlay(&placeholder);
    drop_frame.set_child(Some(&overlay));
    content.append(&drop_frame);

    let file_label = gtk4::Label::new(None);
    file_label.add_css_class("dim-label");
    content.append(&file_label);

    {
        let sender = backend_sender.clone();
        let target = gtk4::DropTarget::new(
            gtk4::gio::File::static_type(),
            gtk4::gdk::DragAction::COPY,
        );
        target.connect_drop(move |_, value, _, _| {
            match value.get::<gtk4::gio::File>().ok().and_then(|f| f.path()) {
                Some(path) => sender.try_send(BackendEvent::ImagePicked(path)).is_ok(),
                None => false,
            }
        });
        drop_frame.add_controller(target);
    }

    {
        let sender = backend_sender.clone();
        let parent = window.clone();
        pick_button.connect_clicked(move |_| {
            let filter = gtk4::FileFilter::new();
            filter.set_name(Some("Images"));
            filter.add_mime_type("image/*");
            let filters = gtk4::gio::ListStore::new::<gtk4::FileFilter>();
            filters.append(&filter);

            let dialog = gtk4::FileDialog::builder()
                .title("Choose a leaf photo")
                .filters(&filters)
                .build();
            let sender = sender.clone();
            dialog.open(
                Some(&parent),
                gtk4::gio::Cancellable::NONE,
                move |result| {
                    if let Some(path) = result.ok().and_then(|f| f.path()) {
                        let _ = sender.try_send(BackendEvent::ImagePicked(path));
                    }
                },
            );
        });
    }

    // --- Actions ---
    let buttons = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    buttons.set_halign(gtk4::Align::Center);

    let clear_button = gtk4::Button::with_label("Clear");
    let submit_button = gtk4::Button::builder()
        .label("Submit")
        .css_classes(["suggested-action"])
        .build();
    buttons.append(&clear_button);
    buttons.append(&submit_button);
    content.append(&buttons);

    {
        let sender = backend_sender.clone();
        clear_button.connect_clicked(move |_| {
            let _ = sender.try_send(BackendEvent::ClearRequested);
        });
    }
    {
        let sender = backend_sender;
        submit_button.connect_clicked(move |_| {
            let _ = sender.try_send(BackendEvent::SubmitRequested);
        });
    }

    let spinner = gtk4::Spinner::new();
    spinner.set_size_request(32, 32);
    spinner.set_visible(false);
    content.append(&spinner);

    let notice_label = gtk4::Label::new(None);
    notice_label.add_css_class("error");
    notice_label.set_wrap(true);
    notice_label.set_visible(false);
    content.append(&notice_label);

    // --- Result panel ---
    let result_group = libadwaita::PreferencesGroup::new();
    result_group.set_title("Classified Label");
    result_group.set_visible(false);

    let label_value = gtk4::Label::new(None);
    label_value.add_css_class("title-2");
    label_value.set_wrap(true);
    label_value.set_selectable(true);
    result_group.add(&label_value);

    let confidence_label = gtk4::Label::new(None);
    confidence_label.add_css_class("dim-label");
    confidence_label.set_visible(false);
    result_group.add(&confidence_label);

    let actions_box = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    actions_box.set_margin_top(8);
    result_group.add(&actions_box);

    content.append(&result_group);

    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .child(&content)
        .build();
    toolbar_view.set_content(Some(&scrolled));
    window.set_content(Some(&toolbar_view));

    WindowWidgets {
        window,
        picture,
        placeholder,
        file_label,
        clear_button,
        submit_button,
        spinner,
        notice_label,
        result_group,
        label_value,
        confidence_label,
        actions_box,
    }
}

/// Bring the widgets in line with the current view.
pub fn render(widgets: &WindowWidgets, previews: &TexturePreviews, view: &View) {
    let texture = view.preview.and_then(|id| previews.texture(id));
    widgets.picture.set_paintable(texture.as_ref());
    widgets.picture.set_visible(texture.is_some());
    widgets.placeholder.set_visible(view.preview.is_none());
    widgets
        .file_label
        .set_text(view.file_name.as_deref().unwrap_or(""));

    widgets.submit_button.set_sensitive(view.submit_enabled);
    widgets.clear_button.set_sensitive(view.clear_enabled);
    widgets.spinner.set_visible(view.loading);
    widgets.spinner.set_spinning(view.loading);

    match &view.notice {
        Some(text) => {
            widgets.notice_label.set_text(text);
            widgets.notice_label.set_visible(true);
        }
        None => widgets.notice_label.set_visible(false),
    }

    while let Some(child) = widgets.actions_box.first_child() {
        widgets.actions_box.remove(&child);
    }

    let Some(panel) = view.result.as_ref().filter(|_| !view.loading) else {
        widgets.result_group.set_visible(false);
        return;
    };

    widgets.result_group.set_visible(true);
    widgets.label_value.set_text(&panel.label);
    if panel.failed {
        widgets.label_value.add_css_class("error");
    } else {
        widgets.label_value.remove_css_class("error");
    }

    let confidences = panel
        .alternatives
        .iter()
        .map(|(label, c)| format!("{label} {:.0}%", c * 100.0))
        .collect::<Vec<_>>()
        .join("  ·  ");
    widgets.confidence_label.set_text(&confidences);
    widgets.confidence_label.set_visible(!confidences.is_empty());

    if panel.recommendations.is_empty() {
        return;
    }
    let heading = gtk4::Label::new(Some("Recommended Actions:"));
    heading.add_css_class("heading");
    heading.set_margin_bottom(4);
    widgets.actions_box.append(&heading);

    let list = gtk4::ListBox::new();
    list.set_selection_mode(gtk4::SelectionMode::None);
    list.add_css_class("boxed-list");
    for action in &panel.recommendations {
        let row = libadwaita::ActionRow::builder().title(action.as_str()).build();
        list.append(&row);
    }
    widgets.actions_box.append(&list);
}
