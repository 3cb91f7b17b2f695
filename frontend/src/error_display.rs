use futures::StreamExt;
use shared::{LoadError, NodeId};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dataflow::{ActorVec, Relay, relay};
use crate::debug_utils::debug_critical;

const DEFAULT_AUTO_DISMISS_MS: u64 = 5000;

static TOAST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAlert {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Raw error text, logged to the console instead of shown.
    pub technical_error: String,
    /// 0 keeps the toast until it is dismissed.
    pub auto_dismiss_ms: u64,
}

impl ErrorAlert {
    fn new(title: &str, message: String, technical_error: String) -> Self {
        let id = TOAST_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("toast_{id}"),
            title: title.to_string(),
            message,
            technical_error,
            auto_dismiss_ms: DEFAULT_AUTO_DISMISS_MS,
        }
    }

    pub fn new_child_load_error(node_id: NodeId, label: &str, error: &LoadError) -> Self {
        let technical_error = error.to_string();
        Self::new(
            "Can't Load Children",
            format!("{label}: {}", make_error_user_friendly(&technical_error)),
            format!("Loading children of node {node_id} failed: {technical_error}"),
        )
    }

    pub fn new_page_load_error(error: &LoadError) -> Self {
        let technical_error = error.to_string();
        Self::new(
            "Can't Load More Items",
            format!(
                "{} Scroll down again to retry.",
                make_error_user_friendly(&technical_error)
            ),
            technical_error,
        )
    }

    pub fn new_config_error(error: &str) -> Self {
        Self::new(
            "Configuration Error",
            format!("{} Using default settings.", make_error_user_friendly(error)),
            format!("Config error: {error}"),
        )
    }

    pub fn new_connection_error(error: &str) -> Self {
        Self::new(
            "Connection Error",
            make_error_user_friendly(error),
            format!("Connection error: {error}"),
        )
    }
}

pub fn make_error_user_friendly(error: &str) -> String {
    let error_lower = error.to_lowercase();

    let http_status = error_lower
        .find("http ")
        .and_then(|start| error_lower[start + 5..].get(..3))
        .and_then(|code| code.parse::<u16>().ok());

    if let Some(status) = http_status {
        match status {
            404 => "The item endpoint was not found.".to_string(),
            500..=599 => "The server had a problem answering. Please try again.".to_string(),
            _ => format!("The server answered with status {status}."),
        }
    } else if error_lower.contains("failed to parse") || error_lower.contains("expected") {
        "The server sent items in an unexpected format.".to_string()
    } else if error_lower.contains("unreachable")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("failed to fetch")
    {
        "Connection error. Please check your network connection.".to_string()
    } else if error_lower.contains("timeout") || error_lower.contains("timed out") {
        "Operation timed out. Please try again.".to_string()
    } else {
        error.trim().to_string()
    }
}

/// Active toasts, newest last.
#[derive(Clone)]
pub struct ErrorDisplay {
    pub active_toasts: ActorVec<ErrorAlert>,
    toast_added_relay: Relay<ErrorAlert>,
    toast_dismissed_relay: Relay<String>,
}

impl ErrorDisplay {
    pub fn new() -> Self {
        let (toast_added_relay, mut toast_added_stream) = relay::<ErrorAlert>();
        let (toast_dismissed_relay, mut toast_dismissed_stream) = relay::<String>();

        let active_toasts = ActorVec::new(vec![], async move |toasts| {
            loop {
                futures::select! {
                    alert = toast_added_stream.next() => {
                        if let Some(alert) = alert {
                            toasts.push_cloned(alert);
                        }
                    }
                    dismissed_id = toast_dismissed_stream.next() => {
                        if let Some(id) = dismissed_id {
                            toasts.retain(|alert| alert.id != id);
                        }
                    }
                }
            }
        });

        Self {
            active_toasts,
            toast_added_relay,
            toast_dismissed_relay,
        }
    }

    /// Log the technical error and show a toast.
    pub fn report(&self, alert: ErrorAlert) {
        debug_critical(&alert.technical_error);
        self.toast_added_relay.send(alert);
    }

    pub fn dismiss(&self, id: &str) {
        self.toast_dismissed_relay.send(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PageWindow;

    #[test]
    fn http_statuses_get_readable_messages() {
        let error = LoadError::page_fetch(PageWindow::new(0, 10), "HTTP 503 Service Unavailable");
        assert_eq!(
            make_error_user_friendly(&error.to_string()),
            "The server had a problem answering. Please try again."
        );
        assert_eq!(
            make_error_user_friendly("HTTP 404"),
            "The item endpoint was not found."
        );
    }

    #[test]
    fn parse_and_connection_errors_are_recognized() {
        let parse = LoadError::Parse("expected value at line 1 column 1".to_string());
        assert_eq!(
            make_error_user_friendly(&parse.to_string()),
            "The server sent items in an unexpected format."
        );

        let connection = LoadError::Connection("socket closed".to_string());
        assert_eq!(
            make_error_user_friendly(&connection.to_string()),
            "Connection error. Please check your network connection."
        );
    }

    #[test]
    fn unknown_errors_are_kept_verbatim() {
        assert_eq!(make_error_user_friendly("  something odd  "), "something odd");
    }

    #[test]
    fn alerts_carry_context_and_unique_ids() {
        let error = LoadError::child_load(NodeId(7), "boom");
        let first = ErrorAlert::new_child_load_error(NodeId(7), "Item 7", &error);
        let second = ErrorAlert::new_child_load_error(NodeId(7), "Item 7", &error);

        assert_ne!(first.id, second.id);
        assert!(first.message.starts_with("Item 7: "));
        assert!(first.technical_error.contains("node 7"));
        assert_eq!(first.auto_dismiss_ms, DEFAULT_AUTO_DISMISS_MS);
    }
}
