//! StudyMind core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    answer_length_label, format_syllabus, upload_name, Answer, AppState, ChatMessage, FileStatus,
    HistoryTurn, PolledStatus, QuestionRequest, Role, ServerDocument, Source, StudySettings,
    SyllabusOutline, SyllabusUnit, UploadedFile, ANSWER_LENGTHS, DEFAULT_MARKS,
    MAX_HISTORY_TURNS, MAX_QUESTION_CHARS,
};
pub use update::{
    update, ANSWER_FALLBACK, DELETE_FAILED, NOT_INDEXED_PROMPT, RESET_FAILED, SYLLABUS_FALLBACK,
};
pub use view_model::AppViewModel;
