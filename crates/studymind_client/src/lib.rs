//! StudyMind client: backend API calls, upload progress and status polling.
mod api;
mod handle;
mod poll;
mod settings;
mod types;
mod upload;

pub use api::{content_type_for, EventSink, ReqwestApi, StudyApi};
pub use handle::{ChannelEventSink, ClientHandle};
pub use poll::{PollRegistry, Poller};
pub use settings::{ClientSettings, API_URL_ENV, DEFAULT_API_URL};
pub use types::{
    ApiError, AskRequest, AskResponse, ChatTurn, ClientEvent, FailureKind, IngestStatus,
    ParsedSyllabus, PollStop, Source, StatusReport, SyllabusUnit, UploadAccepted,
};
pub use upload::upload_percent;
