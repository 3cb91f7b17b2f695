use futures::channel::mpsc::{UnboundedReceiver, unbounded};
use futures::channel::oneshot;
use futures::stream::StreamExt;
use shared::{AppConfig, DownMsg, HierarchyItem, LoadError, PageRequest, UpMsg};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use zoon::*;

use crate::dataflow::Actor;
use crate::debug_utils::debug_critical;

type Reply<T> = oneshot::Sender<Result<T, LoadError>>;

/// Actor+Relay compatible Connection adapter
pub struct ConnectionAdapter {
    connection: Connection<UpMsg, DownMsg>,
}

impl ConnectionAdapter {
    pub fn new() -> (Self, UnboundedReceiver<DownMsg>) {
        let (message_sender, message_stream) = unbounded();

        let connection = Connection::new(move |down_msg, _| {
            let _ = message_sender.unbounded_send(down_msg);
        });

        (ConnectionAdapter { connection }, message_stream)
    }

    pub async fn send_up_msg(&self, up_msg: UpMsg) -> Result<(), LoadError> {
        self.connection
            .send_up_msg(up_msg)
            .await
            .map(|_| ())
            .map_err(|error| {
                zoon::println!("Failed to send message: {:?}", error);
                LoadError::Connection(format!("{error:?}"))
            })
    }
}

/// Requests waiting for their `DownMsg`.
#[derive(Default)]
struct PendingResponses {
    config: Option<Reply<AppConfig>>,
    initial_items: Option<Reply<Vec<HierarchyItem>>>,
    pages: HashMap<u64, Reply<Vec<HierarchyItem>>>,
}

impl PendingResponses {
    /// Hand the message to whoever asked for it. Returns false when nobody
    /// was waiting.
    fn resolve(&mut self, down_msg: DownMsg) -> bool {
        match down_msg {
            DownMsg::ConfigLoaded(config) => reply(self.config.take(), Ok(config)),
            DownMsg::ConfigError(error) => {
                reply(self.config.take(), Err(LoadError::Config(error)))
            }
            DownMsg::InitialItems(items) => reply(self.initial_items.take(), Ok(items)),
            DownMsg::PageLoaded { request_id, items } => {
                reply(self.pages.remove(&request_id), Ok(items))
            }
            DownMsg::PageError { request_id, error } => {
                reply(self.pages.remove(&request_id), Err(error))
            }
        }
    }
}

fn reply<T>(sender: Option<Reply<T>>, result: Result<T, LoadError>) -> bool {
    match sender {
        // The requester may have given up; that is not an error here.
        Some(sender) => {
            let _ = sender.send(result);
            true
        }
        None => false,
    }
}

fn lock(pending: &Mutex<PendingResponses>) -> MutexGuard<'_, PendingResponses> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Request/response view over the backend connection.
#[derive(Clone)]
pub struct BackendClient {
    adapter: Arc<ConnectionAdapter>,
    pending: Arc<Mutex<PendingResponses>>,
    #[allow(dead_code)]
    message_handler: Actor<()>,
}

impl BackendClient {
    pub fn new() -> Self {
        let (adapter, mut down_msg_stream) = ConnectionAdapter::new();
        let pending = Arc::new(Mutex::new(PendingResponses::default()));

        let message_handler = Actor::new((), {
            let pending = pending.clone();
            async move |_state| {
                while let Some(down_msg) = down_msg_stream.next().await {
                    handle_down_msg(down_msg, &pending);
                }
            }
        });

        Self {
            adapter: Arc::new(adapter),
            pending,
            message_handler,
        }
    }

    pub async fn load_config(&self) -> Result<AppConfig, LoadError> {
        let (sender, receiver) = oneshot::channel();
        lock(&self.pending).config = Some(sender);
        self.request(UpMsg::LoadConfig, receiver).await
    }

    pub async fn load_initial_items(&self) -> Result<Vec<HierarchyItem>, LoadError> {
        let (sender, receiver) = oneshot::channel();
        lock(&self.pending).initial_items = Some(sender);
        self.request(UpMsg::LoadInitialItems, receiver).await
    }

    pub async fn load_page(&self, request: PageRequest) -> Result<Vec<HierarchyItem>, LoadError> {
        let (sender, receiver) = oneshot::channel();
        lock(&self.pending).pages.insert(request.request_id, sender);
        let up_msg = UpMsg::LoadPage {
            request_id: request.request_id,
            window: request.window,
        };
        let result = self.request(up_msg, receiver).await;
        if result.is_err() {
            lock(&self.pending).pages.remove(&request.request_id);
        }
        result
    }

    async fn request<T>(
        &self,
        up_msg: UpMsg,
        receiver: oneshot::Receiver<Result<T, LoadError>>,
    ) -> Result<T, LoadError> {
        self.adapter.send_up_msg(up_msg).await?;
        receiver
            .await
            .map_err(|_| LoadError::Connection("response channel closed".to_string()))?
    }
}

fn handle_down_msg(down_msg: DownMsg, pending: &Mutex<PendingResponses>) {
    let description = match &down_msg {
        DownMsg::ConfigLoaded(_) => "ConfigLoaded".to_string(),
        DownMsg::ConfigError(error) => format!("ConfigError({error})"),
        DownMsg::InitialItems(items) => format!("InitialItems({} items)", items.len()),
        DownMsg::PageLoaded { request_id, items } => {
            format!("PageLoaded(#{request_id}, {} items)", items.len())
        }
        DownMsg::PageError { request_id, error } => format!("PageError(#{request_id}, {error})"),
    };
    if !lock(pending).resolve(down_msg) {
        debug_critical(&format!("Unexpected message from backend: {description}"));
    }
}
