use std::path::PathBuf;

use studymind_client::{
    ApiError, AskRequest, AskResponse, ChatTurn, ClientEvent, ClientHandle, IngestStatus,
    ParsedSyllabus, PollStop, StatusReport,
};
use studymind_core::{
    Answer, Effect, FileStatus, Msg, PolledStatus, QuestionRequest, ServerDocument, Source,
    SyllabusOutline, SyllabusUnit,
};
use studymind_logging::{sm_debug, sm_error, sm_info, sm_warn};

use crate::persistence;

/// Executes core effects against the backend client and turns client events back into messages.
pub struct EffectRunner {
    client: ClientHandle,
    data_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(client: ClientHandle, data_dir: PathBuf) -> Self {
        Self { client, data_dir }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::UploadDocument { name, path } => {
                    sm_info!("UploadDocument name={} path={:?}", name, path);
                    self.client.upload(name, path);
                }
                Effect::StartPolling { name } => self.client.start_polling(name),
                Effect::DeleteDocument { name } => {
                    sm_info!("DeleteDocument name={}", name);
                    self.client.delete(name);
                }
                Effect::ResetDocuments => {
                    sm_info!("ResetDocuments");
                    self.client.reset();
                }
                Effect::ListServerStatus => self.client.list_status(),
                Effect::ParseSyllabus { path } => self.client.parse_syllabus(path),
                Effect::AskQuestion { request } => {
                    sm_info!(
                        "AskQuestion question_len={} marks={} history={}",
                        request.question.len(),
                        request.marks,
                        request.chat_history.as_ref().map_or(0, Vec::len)
                    );
                    self.client.ask(ask_request(request));
                }
                Effect::PersistSettings(settings) => {
                    if let Err(err) = persistence::save_settings(&self.data_dir, &settings) {
                        sm_error!("Failed to persist study settings: {}", err);
                    }
                }
            }
        }
    }

    /// Messages for every client event that arrived since the last call.
    pub fn drain_events(&self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.client.try_recv() {
            if let Some(msg) = event_to_msg(event) {
                inbox.push(msg);
            }
        }
        inbox
    }

    pub fn shutdown(&self) {
        self.client.shutdown();
    }
}

pub(crate) fn event_to_msg(event: ClientEvent) -> Option<Msg> {
    let msg = match event {
        ClientEvent::UploadProgress { name, percent } => Msg::UploadProgress { name, percent },
        ClientEvent::UploadFinished { name, result } => Msg::UploadFinished {
            name,
            result: result.map(drop).map_err(|err| describe(&err)),
        },
        ClientEvent::StatusPolled { name, report } => Msg::StatusPolled {
            name,
            status: polled_status(report),
        },
        ClientEvent::PollingStopped { name, reason } => match reason {
            PollStop::NotFound => Msg::StatusPolled {
                name,
                status: PolledStatus::NotFound,
            },
            PollStop::Terminal(status) => {
                sm_debug!("Polling for {} finished as {}", name, status.as_str());
                return None;
            }
            PollStop::Failed(err) => {
                sm_warn!("Lost track of {}: {}", name, err);
                return None;
            }
        },
        ClientEvent::DocumentRemoved { name, result } => Msg::RemoveFinished {
            name,
            result: result.map_err(|err| describe(&err)),
        },
        ClientEvent::DocumentsReset { result } => Msg::ResetFinished {
            result: result.map_err(|err| describe(&err)),
        },
        ClientEvent::StatusListed { result } => Msg::ServerStatusListed(
            result
                .map(|listing| {
                    listing
                        .into_iter()
                        .map(|(name, report)| server_document(name, report))
                        .collect()
                })
                .map_err(|err| describe(&err)),
        ),
        ClientEvent::SyllabusParsed { result } => {
            Msg::SyllabusParsed(result.map(syllabus_outline).map_err(|err| err.detail))
        }
        ClientEvent::AnswerReceived { result } => {
            Msg::AnswerReceived(result.map(answer).map_err(|err| err.detail))
        }
    };
    Some(msg)
}

fn describe(err: &ApiError) -> String {
    err.detail.clone().unwrap_or_else(|| err.to_string())
}

fn file_status(status: IngestStatus) -> Option<FileStatus> {
    match status {
        IngestStatus::Pending => Some(FileStatus::Pending),
        IngestStatus::Processing => Some(FileStatus::Processing),
        IngestStatus::Completed => Some(FileStatus::Completed),
        IngestStatus::Failed => Some(FileStatus::Failed),
        IngestStatus::NotFound | IngestStatus::Unknown => None,
    }
}

fn polled_status(report: StatusReport) -> PolledStatus {
    if report.status == IngestStatus::NotFound {
        return PolledStatus::NotFound;
    }
    PolledStatus::Report {
        status: file_status(report.status),
        pages: report.pages,
        chunks: report.chunks,
    }
}

fn server_document(name: String, report: StatusReport) -> ServerDocument {
    ServerDocument {
        name,
        status: report.status.as_str().to_string(),
        pages: report.pages,
        chunks: report.chunks,
    }
}

fn syllabus_outline(parsed: ParsedSyllabus) -> SyllabusOutline {
    SyllabusOutline {
        subject: parsed.subject,
        units: parsed
            .units
            .into_iter()
            .map(|unit| SyllabusUnit {
                name: unit.name,
                topics: unit.topics,
                format: unit.format,
            })
            .collect(),
    }
}

fn answer(response: AskResponse) -> Answer {
    Answer {
        content: response.answer,
        sources: response.sources.map(|sources| {
            sources
                .into_iter()
                .map(|source| Source {
                    page: source.page,
                    text: source.text,
                })
                .collect()
        }),
        error: response.error.unwrap_or(false),
    }
}

pub(crate) fn ask_request(request: QuestionRequest) -> AskRequest {
    AskRequest {
        question: request.question,
        syllabus_context: request.syllabus_context,
        marks: request.marks,
        chat_history: request.chat_history.map(|turns| {
            turns
                .into_iter()
                .map(|turn| ChatTurn {
                    role: turn.role.as_str().to_string(),
                    content: turn.content,
                })
                .collect()
        }),
    }
}
