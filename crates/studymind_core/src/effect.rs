use std::path::PathBuf;

use crate::{QuestionRequest, StudySettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    UploadDocument { name: String, path: PathBuf },
    StartPolling { name: String },
    DeleteDocument { name: String },
    ResetDocuments,
    ListServerStatus,
    ParseSyllabus { path: PathBuf },
    AskQuestion { request: QuestionRequest },
    PersistSettings(StudySettings),
}
