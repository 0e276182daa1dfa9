use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use bytes::Bytes;
use studymind_logging::{sm_debug, sm_error, sm_info};
use tokio_util::sync::CancellationToken;

use crate::poll::{PollRegistry, Poller};
use crate::{
    ApiError, AskRequest, ClientEvent, ClientSettings, EventSink, FailureKind, ReqwestApi,
    StudyApi,
};

enum ClientCommand {
    Upload { name: String, path: PathBuf },
    StartPolling { name: String },
    Delete { name: String },
    Reset,
    ListStatus,
    ParseSyllabus { path: PathBuf },
    Ask { request: AskRequest },
}

/// Forwards events over a channel until the owning handle is shut down.
pub struct ChannelEventSink {
    tx: mpsc::Sender<ClientEvent>,
    alive: CancellationToken,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<ClientEvent>, alive: CancellationToken) -> Self {
        Self { tx, alive }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ClientEvent) {
        if self.alive.is_cancelled() {
            sm_debug!("Dropping event after shutdown: {:?}", event);
            return;
        }
        let _ = self.tx.send(event);
    }
}

struct CommandContext {
    api: Arc<dyn StudyApi>,
    poller: Poller,
    sink: Arc<dyn EventSink>,
    alive: CancellationToken,
}

/// Runs backend calls on a background runtime and reports results as [`ClientEvent`]s.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: mpsc::Receiver<ClientEvent>,
    registry: Arc<PollRegistry>,
    alive: CancellationToken,
}

impl ClientHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let api = Arc::new(ReqwestApi::new(&settings)?);
        sm_info!("Using backend at {}", api.base_url());
        Self::with_api(api, &settings)
    }

    pub fn with_api(api: Arc<dyn StudyApi>, settings: &ClientSettings) -> Result<Self, ApiError> {
        Self::start(api, settings, tokio::runtime::Runtime::new)
    }

    /// Spawns the worker thread and waits until its runtime is up.
    fn start<B>(
        api: Arc<dyn StudyApi>,
        settings: &ClientSettings,
        build_runtime: B,
    ) -> Result<Self, ApiError>
    where
        B: FnOnce() -> std::io::Result<tokio::runtime::Runtime> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let alive = CancellationToken::new();
        let registry = Arc::new(PollRegistry::new());
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx, alive.clone()));
        let context = Arc::new(CommandContext {
            poller: Poller::new(
                api.clone(),
                registry.clone(),
                sink.clone(),
                settings.poll_interval,
            ),
            api,
            sink,
            alive: alive.clone(),
        });

        let worker_registry = registry.clone();
        thread::spawn(move || {
            let runtime = match build_runtime() {
                Ok(runtime) => {
                    let _ = ready_tx.send(Ok(()));
                    runtime
                }
                Err(err) => {
                    sm_error!("Failed to start client runtime: {}", err);
                    let _ = ready_tx.send(Err(ApiError::new(
                        FailureKind::Io,
                        format!("failed to start client runtime: {err}"),
                    )));
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let context = context.clone();
                runtime.spawn(async move {
                    handle_command(&context, command).await;
                });
            }
            worker_registry.cancel_all();
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(ApiError::new(
                    FailureKind::Io,
                    "client worker exited before starting",
                ));
            }
        }

        Ok(Self {
            cmd_tx,
            event_rx,
            registry,
            alive,
        })
    }

    pub fn upload(&self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.send(ClientCommand::Upload {
            name: name.into(),
            path: path.into(),
        });
    }

    pub fn start_polling(&self, name: impl Into<String>) {
        self.send(ClientCommand::StartPolling { name: name.into() });
    }

    pub fn delete(&self, name: impl Into<String>) {
        self.send(ClientCommand::Delete { name: name.into() });
    }

    pub fn reset(&self) {
        self.send(ClientCommand::Reset);
    }

    pub fn list_status(&self) {
        self.send(ClientCommand::ListStatus);
    }

    pub fn parse_syllabus(&self, path: impl Into<PathBuf>) {
        self.send(ClientCommand::ParseSyllabus { path: path.into() });
    }

    pub fn ask(&self, request: AskRequest) {
        self.send(ClientCommand::Ask { request });
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn is_polling(&self, name: &str) -> bool {
        self.registry.is_polling(name)
    }

    pub fn active_polls(&self) -> usize {
        self.registry.active_count()
    }

    /// Cancels every poller and silences events still in flight.
    pub fn shutdown(&self) {
        if self.alive.is_cancelled() {
            return;
        }
        self.alive.cancel();
        let cancelled = self.registry.cancel_all();
        sm_info!("Client shut down ({} pollers cancelled)", cancelled);
    }

    fn send(&self, command: ClientCommand) {
        if self.alive.is_cancelled() {
            return;
        }
        let _ = self.cmd_tx.send(command);
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_command(context: &CommandContext, command: ClientCommand) {
    if context.alive.is_cancelled() {
        return;
    }
    let sink = &context.sink;
    match command {
        ClientCommand::Upload { name, path } => {
            let result = match read_file(&path).await {
                Ok(bytes) => {
                    context
                        .api
                        .upload_document(&name, bytes, sink.clone())
                        .await
                }
                Err(err) => Err(err),
            };
            sink.emit(ClientEvent::UploadFinished { name, result });
        }
        ClientCommand::StartPolling { name } => {
            context.poller.start(&name);
        }
        ClientCommand::Delete { name } => {
            let result = context.api.delete_document(&name).await;
            if result.is_ok() {
                context.poller.registry().cancel(&name);
            }
            sink.emit(ClientEvent::DocumentRemoved { name, result });
        }
        ClientCommand::Reset => {
            let result = context.api.reset_documents().await;
            if result.is_ok() {
                context.poller.registry().cancel_all();
            }
            sink.emit(ClientEvent::DocumentsReset { result });
        }
        ClientCommand::ListStatus => {
            let result = context.api.list_status().await;
            sink.emit(ClientEvent::StatusListed { result });
        }
        ClientCommand::ParseSyllabus { path } => {
            let result = match read_file(&path).await {
                Ok(bytes) => {
                    let name = file_name(&path);
                    context.api.upload_syllabus(&name, bytes).await
                }
                Err(err) => Err(err),
            };
            sink.emit(ClientEvent::SyllabusParsed { result });
        }
        ClientCommand::Ask { request } => {
            let result = context.api.ask(&request).await;
            sink.emit(ClientEvent::AnswerReceived { result });
        }
    }
}

async fn read_file(path: &Path) -> Result<Bytes, ApiError> {
    tokio::fs::read(path).await.map(Bytes::from).map_err(|err| {
        ApiError::new(
            FailureKind::Io,
            format!("failed to read {}: {err}", path.display()),
        )
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
