//! LazyTreeApp - owns the backend connection, error toasts and the tree view

use zoon::*;

use crate::config::load_config;
use crate::connection::BackendClient;
use crate::error_display::{ErrorAlert, ErrorDisplay};
use crate::error_ui::toast_notifications_container;
use crate::tree_view::{PageSource, TreeView, tree_view_panel};

pub struct LazyTreeApp {
    /// Also keeps the connection's message handler running when pages come
    /// from an HTTP endpoint.
    pub backend: BackendClient,
    pub errors: ErrorDisplay,
    pub tree_view: TreeView,
}

impl LazyTreeApp {
    /// Connect, fetch the config, then hand the initial items to the tree view.
    pub async fn new() -> Self {
        let errors = ErrorDisplay::new();
        let backend = BackendClient::new();

        let config = load_config(&backend, &errors).await;
        let page_source = PageSource::from_config(&config.tree.page_source, &backend);
        let tree_view = TreeView::new(config.tree, page_source, errors.clone());

        match backend.load_initial_items().await {
            Ok(items) => tree_view.items_received_relay.send(items),
            Err(error) => errors.report(ErrorAlert::new_connection_error(&error.to_string())),
        }

        Self {
            backend,
            errors,
            tree_view,
        }
    }

    /// Root UI element. The app lives as long as the element does.
    pub fn root(self) -> impl Element {
        Stack::new()
            .s(Height::screen())
            .s(Width::fill())
            .s(Background::new().color("rgb(255, 255, 255)"))
            .s(Font::new().family([
                FontFamily::new("Inter"),
                FontFamily::new("system-ui"),
                FontFamily::new("Segoe UI"),
                FontFamily::SansSerif,
            ]))
            .layer(
                Column::new()
                    .s(Align::new().center_x())
                    .s(Padding::new().top(24))
                    .item(
                        El::new()
                            .s(Padding::new().x(16))
                            .s(Font::new().size(20).weight(FontWeight::Bold))
                            .child("LazyTree"),
                    )
                    .item(tree_view_panel(&self.tree_view)),
            )
            .layer(toast_notifications_container(self.errors.clone()))
            .after_remove(move |_| drop(self))
    }
}
