use std::path::PathBuf;

use crate::{Answer, PolledStatus, ServerDocument, StudySettings, SyllabusOutline};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a document to upload.
    FileSelected(PathBuf),
    /// Transport progress for an upload in flight.
    UploadProgress { name: String, percent: u8 },
    /// Upload transport finished; `Err` carries a human-readable reason.
    UploadFinished {
        name: String,
        result: Result<(), String>,
    },
    /// A status poll answered for a tracked file.
    StatusPolled { name: String, status: PolledStatus },
    /// User asked to delete one document.
    RemoveClicked(String),
    RemoveFinished {
        name: String,
        result: Result<(), String>,
    },
    /// User asked to delete every document.
    ResetClicked,
    ResetFinished { result: Result<(), String> },
    /// User asked for the full server-side ingestion table.
    ServerStatusRequested,
    ServerStatusListed(Result<Vec<ServerDocument>, String>),
    /// User picked an answer-length tier.
    MarksChanged(u32),
    StudyModeToggled(bool),
    SyllabusTextChanged(String),
    SyllabusCleared,
    /// User picked a syllabus file; `None` means nothing was selected.
    SyllabusFileSelected(Option<PathBuf>),
    /// `Err` carries the server detail message when one was provided.
    SyllabusParsed(Result<SyllabusOutline, Option<String>>),
    /// User typed a question.
    QuestionSubmitted(String),
    /// `Err` carries the server detail message when one was provided.
    AnswerReceived(Result<Answer, Option<String>>),
    ChatCleared,
    /// Restore study settings persisted by a previous run.
    RestoreSettings(StudySettings),
}
