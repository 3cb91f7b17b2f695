use shared::{
    HierarchyItem, LoadError, PageRequest, PageSourceConfig, PageWindow, parse_page_response,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::connection::BackendClient;

/// Where additional root-level items come from.
#[derive(Clone)]
pub enum PageSource {
    Backend(BackendClient),
    Http { endpoint: String },
}

impl PageSource {
    pub fn from_config(config: &PageSourceConfig, backend: &BackendClient) -> Self {
        match config {
            PageSourceConfig::Backend => PageSource::Backend(backend.clone()),
            PageSourceConfig::Http(endpoint) => PageSource::Http {
                endpoint: endpoint.clone(),
            },
        }
    }

    pub async fn fetch(&self, request: PageRequest) -> Result<Vec<HierarchyItem>, LoadError> {
        match self {
            PageSource::Backend(client) => client.load_page(request).await,
            PageSource::Http { endpoint } => fetch_http(endpoint, request.window).await,
        }
    }
}

/// `endpoint` with the window appended as `startIndex`/`stopIndex` query
/// parameters.
pub fn page_url(endpoint: &str, window: PageWindow) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{}", window.query_string())
}

async fn fetch_http(endpoint: &str, window: PageWindow) -> Result<Vec<HierarchyItem>, LoadError> {
    let url = page_url(endpoint, window);
    let fetch_error = |reason: String| LoadError::page_fetch(window, reason);

    let browser = web_sys::window().ok_or_else(|| fetch_error("no browser window".to_string()))?;
    let response = JsFuture::from(browser.fetch_with_str(&url))
        .await
        .map_err(|error| fetch_error(js_error_text(&error)))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| fetch_error("fetch did not return a response".to_string()))?;

    if !response.ok() {
        return Err(fetch_error(format!(
            "HTTP {} {}",
            response.status(),
            response.status_text()
        )));
    }

    let text_promise = response
        .text()
        .map_err(|error| fetch_error(js_error_text(&error)))?;
    let body = JsFuture::from(text_promise)
        .await
        .map_err(|error| fetch_error(js_error_text(&error)))?
        .as_string()
        .ok_or_else(|| fetch_error("response body is not text".to_string()))?;

    parse_page_response(&body)
}

fn js_error_text(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_appended_as_query_parameters() {
        let window = PageWindow::new(5, 15);
        assert_eq!(
            page_url("/api/items", window),
            "/api/items?startIndex=5&stopIndex=15"
        );
        assert_eq!(
            page_url("/api/items?tree=main", window),
            "/api/items?tree=main&startIndex=5&stopIndex=15"
        );
    }
}
