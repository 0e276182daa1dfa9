use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ingestion state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    NotFound,
    #[serde(other)]
    Unknown,
}

impl IngestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, IngestStatus::Completed | IngestStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IngestStatus::Pending => "pending",
            IngestStatus::Processing => "processing",
            IngestStatus::Completed => "completed",
            IngestStatus::Failed => "failed",
            IngestStatus::NotFound => "not_found",
            IngestStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: IngestStatus,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub chunks: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadAccepted {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub chunks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyllabusUnit {
    pub name: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ParsedSyllabus {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub units: Vec<SyllabusUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Body of `POST /qa/ask`. Absent optionals serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub syllabus_context: Option<String>,
    pub marks: u32,
    pub chat_history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    #[serde(default)]
    pub error: Option<bool>,
}

/// Why a poll task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStop {
    Terminal(IngestStatus),
    NotFound,
    Failed(ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    UploadProgress {
        name: String,
        percent: u8,
    },
    UploadFinished {
        name: String,
        result: Result<UploadAccepted, ApiError>,
    },
    StatusPolled {
        name: String,
        report: StatusReport,
    },
    PollingStopped {
        name: String,
        reason: PollStop,
    },
    DocumentRemoved {
        name: String,
        result: Result<(), ApiError>,
    },
    DocumentsReset {
        result: Result<(), ApiError>,
    },
    StatusListed {
        result: Result<BTreeMap<String, StatusReport>, ApiError>,
    },
    SyllabusParsed {
        result: Result<ParsedSyllabus, ApiError>,
    },
    AnswerReceived {
        result: Result<AskResponse, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// Server-provided `detail` text, when the error body carried one.
    pub detail: Option<String>,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_status_values_are_tolerated() {
        let report: StatusReport =
            serde_json::from_value(json!({"status": "idle", "pages": 0})).unwrap();
        assert_eq!(report.status, IngestStatus::Unknown);
        assert_eq!(report.pages, Some(0));
        assert_eq!(report.chunks, None);
    }

    #[test]
    fn not_found_body_has_no_counts() {
        let report: StatusReport = serde_json::from_value(json!({"status": "not_found"})).unwrap();
        assert_eq!(report.status, IngestStatus::NotFound);
        assert!(!report.status.is_terminal());
    }

    #[test]
    fn first_question_serializes_absent_fields_as_null() {
        let request = AskRequest {
            question: "What is X?".to_string(),
            syllabus_context: None,
            marks: 3,
            chat_history: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "question": "What is X?",
                "syllabus_context": null,
                "marks": 3,
                "chat_history": null,
            })
        );
    }

    #[test]
    fn answer_without_sources_or_flag_decodes() {
        let response: AskResponse =
            serde_json::from_value(json!({"answer": "ok", "pages": ["1"]})).unwrap();
        assert_eq!(response.sources, None);
        assert_eq!(response.error, None);
    }
}
