//! Configuration as seen by the browser.
//!
//! The backend owns the `.lazytree` file; the frontend asks for it once at
//! startup and falls back to defaults when that fails.

use shared::AppConfig;

use crate::connection::BackendClient;
use crate::error_display::{ErrorAlert, ErrorDisplay};

pub async fn load_config(client: &BackendClient, errors: &ErrorDisplay) -> AppConfig {
    match client.load_config().await {
        Ok(mut config) => {
            // Values can still be out of range when the backend runs an older build.
            for warning in config.validate_and_fix() {
                zoon::println!("Config warning: {warning}");
            }
            config
        }
        Err(error) => {
            errors.report(ErrorAlert::new_config_error(&error.to_string()));
            AppConfig::default()
        }
    }
}
