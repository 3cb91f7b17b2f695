use moon::*;
use shared::{AppConfig, DatasetConfig, DownMsg, LoadError, PageWindow, UpMsg};
use std::fs;
use std::sync::Arc;

mod dataset;
use dataset::Dataset;

// ===== CENTRALIZED DEBUG FLAGS =====
const DEBUG_BACKEND: bool = false; // Request/response debugging
const DEBUG_CONFIG: bool = false; // Config loading debugging
const DEBUG_PAGES: bool = false; // Page slicing debugging

// Debug macro for easy toggling
macro_rules! debug_log {
    ($flag:expr, $($arg:tt)*) => {
        if $flag {
            println!($($arg)*);
        }
    };
}

const CONFIG_FILE_PATH: &str = ".lazytree";

async fn frontend() -> Frontend {
    Frontend::new()
        .title("LazyTree")
        .index_by_robots(false)
}

// Built once from the config file; the config is read-only at runtime.
static DATASET: Lazy<Arc<Dataset>> = Lazy::new(|| {
    let config = read_config().map(|(config, _)| config.dataset).unwrap_or_else(|error| {
        println!("Dataset config unavailable, using defaults: {error}");
        DatasetConfig::default()
    });
    let dataset = Dataset::from_config(&config).unwrap_or_else(|error| {
        println!("Falling back to generated dataset: {error}");
        Dataset::generate(&DatasetConfig {
            path: None,
            ..config
        })
    });
    debug_log!(DEBUG_BACKEND, "Dataset ready: {} items, {} roots", dataset.len(), dataset.root_count());
    Arc::new(dataset)
});

async fn up_msg_handler(req: UpMsgRequest<UpMsg>) {
    let (session_id, cor_id) = (req.session_id, req.cor_id);
    debug_log!(DEBUG_BACKEND, "Received {:?}", req.up_msg);

    match req.up_msg {
        UpMsg::LoadConfig => {
            load_config(session_id, cor_id).await;
        }
        UpMsg::LoadInitialItems => {
            let items = DATASET.initial_items();
            debug_log!(DEBUG_PAGES, "Sending {} initial items", items.len());
            send_down_msg(DownMsg::InitialItems(items), session_id, cor_id).await;
        }
        UpMsg::LoadPage { request_id, window } => {
            load_page(request_id, window, session_id, cor_id).await;
        }
    }
}

async fn send_down_msg(msg: DownMsg, session_id: SessionId, cor_id: CorId) {
    if let Some(session) = sessions::by_session_id().wait_for(session_id).await {
        session.send_down_msg(&msg, cor_id).await;
    } else {
        debug_log!(DEBUG_BACKEND, "Session not found, dropping response");
    }
}

/// Read and validate the config file. A missing file yields the defaults.
fn read_config() -> Result<(AppConfig, Vec<String>), LoadError> {
    let mut config = match fs::read_to_string(CONFIG_FILE_PATH) {
        Ok(content) => AppConfig::from_toml_str(&content)?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug_log!(DEBUG_CONFIG, "No {CONFIG_FILE_PATH} found, using defaults");
            AppConfig::default()
        }
        Err(error) => {
            return Err(LoadError::Config(format!(
                "Failed to read {CONFIG_FILE_PATH}: {error}"
            )));
        }
    };
    let warnings = config.validate_and_fix();
    Ok((config, warnings))
}

async fn load_config(session_id: SessionId, cor_id: CorId) {
    let result = tokio::task::spawn_blocking(read_config)
        .await
        .unwrap_or_else(|error| Err(LoadError::Config(format!("Config task failed: {error}"))));

    match result {
        Ok((config, warnings)) => {
            for warning in &warnings {
                println!("Config: {warning}");
            }
            send_down_msg(DownMsg::ConfigLoaded(config), session_id, cor_id).await;
        }
        Err(error) => {
            send_down_msg(DownMsg::ConfigError(error.to_string()), session_id, cor_id).await;
        }
    }
}

async fn load_page(request_id: u64, window: PageWindow, session_id: SessionId, cor_id: CorId) {
    let msg = match DATASET.page(window) {
        Ok(items) => {
            debug_log!(DEBUG_PAGES, "Page {request_id} {window}: {} items", items.len());
            DownMsg::PageLoaded { request_id, items }
        }
        Err(error) => DownMsg::PageError { request_id, error },
    };
    send_down_msg(msg, session_id, cor_id).await;
}

#[moon::main]
async fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        println!("BACKEND PANIC: {:?}", panic_info);
    }));

    start(frontend, up_msg_handler, |_| {}).await
}
