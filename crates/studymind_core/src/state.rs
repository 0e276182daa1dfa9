use std::path::PathBuf;

use crate::view_model::AppViewModel;

/// Longest question accepted before any request is built.
pub const MAX_QUESTION_CHARS: usize = 1000;
/// Most recent turns forwarded as chat history.
pub const MAX_HISTORY_TURNS: usize = 30;
pub const DEFAULT_MARKS: u32 = 3;
/// Answer-length tiers offered by the study panel.
pub const ANSWER_LENGTHS: [u32; 3] = [3, 5, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Uploading,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            FileStatus::Uploading | FileStatus::Pending | FileStatus::Processing
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Uploading => "uploading",
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub progress: u8,
    pub status: FileStatus,
    pub pages: Option<u32>,
    pub chunks: Option<u32>,
}

impl UploadedFile {
    fn new(name: String) -> Self {
        Self {
            name,
            progress: 0,
            status: FileStatus::Uploading,
            pages: None,
            chunks: None,
        }
    }
}

/// Result of one status request for a tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolledStatus {
    NotFound,
    /// `status` is `None` when the server reported a state the client does not know.
    Report {
        status: Option<FileStatus>,
        pages: Option<u32>,
        chunks: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub sources: Option<Vec<Source>>,
    pub error: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: None,
            error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources: None,
            error: false,
        }
    }
}

/// Answer body as returned by the question endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub content: String,
    pub sources: Option<Vec<Source>>,
    pub error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Everything the question endpoint needs, built from state at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub question: String,
    pub syllabus_context: Option<String>,
    pub marks: u32,
    pub chat_history: Option<Vec<HistoryTurn>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySettings {
    pub syllabus_text: String,
    pub marks: u32,
    pub study_mode: bool,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            syllabus_text: String::new(),
            marks: DEFAULT_MARKS,
            study_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyllabusUnit {
    pub name: String,
    pub topics: Vec<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyllabusOutline {
    pub subject: Option<String>,
    pub units: Vec<SyllabusUnit>,
}

/// One row of the server-side ingestion table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDocument {
    pub name: String,
    pub status: String,
    pub pages: Option<u32>,
    pub chunks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    files: Vec<UploadedFile>,
    messages: Vec<ChatMessage>,
    settings: StudySettings,
    asking: bool,
    /// The chat was cleared while a question was in flight; its answer is dropped.
    discard_answer: bool,
    syllabus_parsing: bool,
    upload_error: Option<String>,
    chat_error: Option<String>,
    study_error: Option<String>,
    server_documents: Option<Vec<ServerDocument>>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            files: self.files.clone(),
            file_count: self.files.len(),
            indexed: self.indexed(),
            busy: self.busy(),
            upload_error: self.upload_error.clone(),
            messages: self.messages.clone(),
            asking: self.asking,
            chat_error: self.chat_error.clone(),
            marks: self.settings.marks,
            answer_length: answer_length_label(self.settings.marks),
            study_mode: self.settings.study_mode,
            syllabus_text: self.settings.syllabus_text.clone(),
            syllabus_parsing: self.syllabus_parsing,
            study_error: self.study_error.clone(),
            server_documents: self.server_documents.clone(),
            dirty: self.dirty,
        }
    }

    /// True when at least one tracked file finished processing.
    pub fn indexed(&self) -> bool {
        self.files
            .iter()
            .any(|file| file.status == FileStatus::Completed)
    }

    pub fn busy(&self) -> bool {
        self.files.iter().any(|file| file.status.is_busy())
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.name == name)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn settings(&self) -> &StudySettings {
        &self.settings
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_asking(&self) -> bool {
        self.asking
    }

    pub(crate) fn is_parsing_syllabus(&self) -> bool {
        self.syllabus_parsing
    }

    /// Starts tracking `name`; an existing record with the same name is replaced.
    pub(crate) fn track_upload(&mut self, name: String) {
        self.upload_error = None;
        match self.files.iter_mut().find(|file| file.name == name) {
            Some(existing) => *existing = UploadedFile::new(name),
            None => self.files.push(UploadedFile::new(name)),
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_upload_progress(&mut self, name: &str, percent: u8) {
        let percent = percent.min(100);
        if let Some(file) = self.file_mut(name) {
            if file.status == FileStatus::Uploading && percent > file.progress {
                file.progress = percent;
                self.mark_dirty();
            }
        }
    }

    /// Returns true when the file is still tracked and should be polled.
    pub(crate) fn apply_upload_finished(&mut self, name: &str, ok: bool) -> bool {
        let Some(file) = self.file_mut(name) else {
            return false;
        };
        if !ok {
            file.status = FileStatus::Failed;
            self.mark_dirty();
        }
        ok
    }

    pub(crate) fn apply_polled_status(&mut self, name: &str, polled: PolledStatus) {
        let PolledStatus::Report {
            status,
            pages,
            chunks,
        } = polled
        else {
            // Tracking stops on the client side; the visible record is left untouched.
            return;
        };
        let Some(file) = self.file_mut(name) else {
            return;
        };
        if let Some(status) = status {
            file.status = status;
            if status == FileStatus::Completed {
                file.progress = 100;
            }
        }
        file.pages = pages;
        file.chunks = chunks;
        self.mark_dirty();
    }

    pub(crate) fn remove_file(&mut self, name: &str) {
        let before = self.files.len();
        self.files.retain(|file| file.name != name);
        if self.files.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn clear_files(&mut self) {
        self.files.clear();
        self.upload_error = None;
        self.mark_dirty();
    }

    pub(crate) fn set_upload_error(&mut self, message: impl Into<String>) {
        self.upload_error = Some(message.into());
        self.mark_dirty();
    }

    pub(crate) fn set_server_documents(&mut self, documents: Vec<ServerDocument>) {
        self.server_documents = Some(documents);
        self.mark_dirty();
    }

    /// Drops the previous listing so the next answer is shown even when unchanged.
    pub(crate) fn forget_server_documents(&mut self) {
        if self.server_documents.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_chat_error(&mut self, message: impl Into<String>) {
        self.chat_error = Some(message.into());
        self.mark_dirty();
    }

    /// Appends the user's turn and marks a question as in flight.
    pub(crate) fn begin_question(&mut self, question: &str) {
        self.chat_error = None;
        self.messages.push(ChatMessage::user(question));
        self.asking = true;
        self.mark_dirty();
    }

    pub(crate) fn finish_question(&mut self, reply: ChatMessage) {
        if !std::mem::take(&mut self.discard_answer) {
            self.messages.push(reply);
        }
        self.asking = false;
        self.mark_dirty();
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
        self.chat_error = None;
        self.discard_answer = self.asking;
        self.mark_dirty();
    }

    /// Prior user/assistant turns, minus error replies, capped to the most recent ones.
    pub(crate) fn history_for_request(&self) -> Option<Vec<HistoryTurn>> {
        let turns: Vec<HistoryTurn> = self
            .messages
            .iter()
            .filter(|message| !message.error)
            .map(|message| HistoryTurn {
                role: message.role,
                content: message.content.clone(),
            })
            .collect();
        if turns.is_empty() {
            return None;
        }
        let skip = turns.len().saturating_sub(MAX_HISTORY_TURNS);
        Some(turns.into_iter().skip(skip).collect())
    }

    pub(crate) fn set_marks(&mut self, marks: u32) {
        self.settings.marks = marks;
        self.study_error = None;
        self.mark_dirty();
    }

    pub(crate) fn set_study_mode(&mut self, on: bool) {
        self.settings.study_mode = on;
        if !on {
            self.settings.syllabus_text.clear();
            self.study_error = None;
        }
        self.mark_dirty();
    }

    pub(crate) fn set_syllabus_text(&mut self, text: String) {
        if !text.is_empty() {
            self.settings.study_mode = true;
        }
        self.settings.syllabus_text = text;
        self.mark_dirty();
    }

    pub(crate) fn set_syllabus_parsing(&mut self, parsing: bool) {
        self.syllabus_parsing = parsing;
        if parsing {
            self.study_error = None;
        }
        self.mark_dirty();
    }

    pub(crate) fn set_study_error(&mut self, message: impl Into<String>) {
        self.study_error = Some(message.into());
        self.mark_dirty();
    }

    pub(crate) fn restore_settings(&mut self, settings: StudySettings) {
        self.settings = settings;
        if !self.settings.study_mode {
            self.settings.syllabus_text.clear();
        }
        self.mark_dirty();
    }

    fn file_mut(&mut self, name: &str) -> Option<&mut UploadedFile> {
        self.files.iter_mut().find(|file| file.name == name)
    }
}

pub fn answer_length_label(marks: u32) -> &'static str {
    match marks {
        3 => "Short (~100 words)",
        5 => "Medium (~250 words)",
        12 => "Long (~500 words)",
        _ => "Custom",
    }
}

/// Renders a parsed syllabus as the free-text context sent with questions.
pub fn format_syllabus(outline: &SyllabusOutline) -> String {
    let mut text = match outline.subject.as_deref() {
        Some(subject) if !subject.is_empty() => format!("Subject: {subject}\n\n"),
        _ => String::new(),
    };
    for unit in &outline.units {
        text.push_str(&unit.name);
        text.push('\n');
        if !unit.topics.is_empty() {
            text.push_str("Topics: ");
            text.push_str(&unit.topics.join(", "));
            text.push('\n');
        }
        text.push('\n');
    }
    text.trim().to_string()
}

/// Display name for an upload path, `None` when no file is named.
pub fn upload_name(path: &std::path::Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
}

pub(crate) fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}
