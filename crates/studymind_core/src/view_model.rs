use crate::{ChatMessage, ServerDocument, UploadedFile};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub files: Vec<UploadedFile>,
    pub file_count: usize,
    pub indexed: bool,
    pub busy: bool,
    pub upload_error: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub asking: bool,
    pub chat_error: Option<String>,
    pub marks: u32,
    pub answer_length: &'static str,
    pub study_mode: bool,
    pub syllabus_text: String,
    pub syllabus_parsing: bool,
    pub study_error: Option<String>,
    pub server_documents: Option<Vec<ServerDocument>>,
    pub dirty: bool,
}
