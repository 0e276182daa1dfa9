use studymind_logging::{sm_debug, sm_info};

use crate::state::non_empty;
use crate::{
    format_syllabus, upload_name, AppState, ChatMessage, Effect, Msg, QuestionRequest,
    ANSWER_LENGTHS, MAX_QUESTION_CHARS,
};

pub const NOT_INDEXED_PROMPT: &str = "Please upload at least one PDF document first.";
pub const ANSWER_FALLBACK: &str = "Failed to get answer. Please try again.";
pub const SYLLABUS_FALLBACK: &str = "Failed to parse syllabus";
pub const DELETE_FAILED: &str = "Failed to delete PDF";
pub const RESET_FAILED: &str = "Failed to reset PDFs";
const STATUS_LIST_FAILED: &str = "Failed to fetch ingestion status";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(path) => match upload_name(&path) {
            Some(name) => {
                sm_info!("Tracking upload {}", name);
                state.track_upload(name.clone());
                vec![Effect::UploadDocument { name, path }]
            }
            None => Vec::new(),
        },
        Msg::UploadProgress { name, percent } => {
            state.apply_upload_progress(&name, percent);
            Vec::new()
        }
        Msg::UploadFinished { name, result } => {
            if let Err(reason) = &result {
                sm_info!("Upload of {} failed: {}", name, reason);
            }
            if state.apply_upload_finished(&name, result.is_ok()) {
                vec![Effect::StartPolling { name }]
            } else {
                Vec::new()
            }
        }
        Msg::StatusPolled { name, status } => {
            sm_debug!("Status for {}: {:?}", name, status);
            state.apply_polled_status(&name, status);
            Vec::new()
        }
        Msg::RemoveClicked(name) => vec![Effect::DeleteDocument { name }],
        Msg::RemoveFinished { name, result } => {
            match result {
                Ok(()) => state.remove_file(&name),
                Err(_) => state.set_upload_error(DELETE_FAILED),
            }
            Vec::new()
        }
        Msg::ResetClicked => vec![Effect::ResetDocuments],
        Msg::ResetFinished { result } => {
            match result {
                Ok(()) => state.clear_files(),
                Err(_) => state.set_upload_error(RESET_FAILED),
            }
            Vec::new()
        }
        Msg::ServerStatusRequested => {
            state.forget_server_documents();
            vec![Effect::ListServerStatus]
        }
        Msg::ServerStatusListed(result) => {
            match result {
                Ok(documents) => state.set_server_documents(documents),
                Err(_) => state.set_upload_error(STATUS_LIST_FAILED),
            }
            Vec::new()
        }
        Msg::MarksChanged(marks) => {
            if ANSWER_LENGTHS.contains(&marks) {
                state.set_marks(marks);
                vec![Effect::PersistSettings(state.settings().clone())]
            } else {
                state.set_study_error("Answer length must be 3, 5 or 12 marks");
                Vec::new()
            }
        }
        Msg::StudyModeToggled(on) => {
            if state.settings().study_mode == on {
                return (state, Vec::new());
            }
            state.set_study_mode(on);
            vec![Effect::PersistSettings(state.settings().clone())]
        }
        Msg::SyllabusTextChanged(text) => {
            state.set_syllabus_text(text);
            vec![Effect::PersistSettings(state.settings().clone())]
        }
        Msg::SyllabusCleared => {
            state.set_syllabus_text(String::new());
            vec![Effect::PersistSettings(state.settings().clone())]
        }
        Msg::SyllabusFileSelected(path) => match non_empty(path) {
            Some(_) if state.is_parsing_syllabus() => Vec::new(),
            Some(path) => {
                state.set_syllabus_parsing(true);
                vec![Effect::ParseSyllabus { path }]
            }
            None => {
                state.set_study_error("Please select a file");
                Vec::new()
            }
        },
        Msg::SyllabusParsed(result) => {
            state.set_syllabus_parsing(false);
            match result {
                Ok(outline) => {
                    state.set_syllabus_text(format_syllabus(&outline));
                    vec![Effect::PersistSettings(state.settings().clone())]
                }
                Err(detail) => {
                    state.set_study_error(detail.unwrap_or_else(|| SYLLABUS_FALLBACK.into()));
                    Vec::new()
                }
            }
        }
        Msg::QuestionSubmitted(question) => match prepare_question(&state, &question) {
            Ok(request) => {
                state.begin_question(&request.question);
                vec![Effect::AskQuestion { request }]
            }
            Err(reason) => {
                state.set_chat_error(reason);
                Vec::new()
            }
        },
        Msg::AnswerReceived(result) => {
            let reply = match result {
                Ok(answer) => ChatMessage {
                    sources: answer.sources,
                    error: answer.error,
                    ..ChatMessage::assistant(answer.content)
                },
                Err(detail) => ChatMessage {
                    error: true,
                    ..ChatMessage::assistant(format!(
                        "Error: {}",
                        detail.as_deref().unwrap_or(ANSWER_FALLBACK)
                    ))
                },
            };
            state.finish_question(reply);
            Vec::new()
        }
        Msg::ChatCleared => {
            state.clear_messages();
            Vec::new()
        }
        Msg::RestoreSettings(settings) => {
            state.restore_settings(settings);
            Vec::new()
        }
    };

    (state, effects)
}

/// Validates a question against current state and builds its request.
fn prepare_question(state: &AppState, question: &str) -> Result<QuestionRequest, &'static str> {
    if state.is_asking() {
        return Err("Waiting for the previous answer");
    }
    if !state.indexed() {
        return Err(NOT_INDEXED_PROMPT);
    }
    let question = question.trim();
    if question.is_empty() {
        return Err("Question must be a non-empty string");
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err("Question is too long (max 1000 characters)");
    }
    let settings = state.settings();
    if settings.marks == 0 {
        return Err("Marks must be a positive number");
    }
    let syllabus_context = Some(settings.syllabus_text.trim())
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned);

    Ok(QuestionRequest {
        question: question.to_string(),
        syllabus_context,
        marks: settings.marks,
        chat_history: state.history_for_request(),
    })
}
