//! LazyTree frontend entry point

use std::sync::OnceLock;
use zoon::*;

/// Stores the main application task handle to prevent it from being dropped.
static MAIN_TASK: OnceLock<TaskHandle> = OnceLock::new();

mod app;
mod config;
mod connection;
mod dataflow;
mod debug_utils;
mod error_display;
mod error_ui;
mod tree_view;

pub fn main() {
    let handle = Task::start_droppable(async {
        let app = crate::app::LazyTreeApp::new().await;
        let root_element = app.root();
        start_app("app", move || root_element);
    });
    let _ = MAIN_TASK.set(handle);
}
