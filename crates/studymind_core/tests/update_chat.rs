use std::path::PathBuf;
use std::sync::Once;

use pretty_assertions::assert_eq;
use studymind_core::{
    update, Answer, AppState, ChatMessage, Effect, FileStatus, HistoryTurn, Msg, PolledStatus,
    QuestionRequest, Role, Source, ANSWER_FALLBACK, NOT_INDEXED_PROMPT,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(studymind_logging::initialize_for_tests);
}

fn indexed_state() -> AppState {
    let (state, _) = update(AppState::new(), Msg::FileSelected(PathBuf::from("notes.pdf")));
    let (state, _) = update(
        state,
        Msg::StatusPolled {
            name: "notes.pdf".to_string(),
            status: PolledStatus::Report {
                status: Some(FileStatus::Completed),
                pages: Some(10),
                chunks: Some(42),
            },
        },
    );
    assert!(state.indexed());
    state
}

fn ask(state: AppState, question: &str) -> (AppState, Vec<Effect>) {
    update(state, Msg::QuestionSubmitted(question.to_string()))
}

fn answer(content: &str) -> Msg {
    Msg::AnswerReceived(Ok(Answer {
        content: content.to_string(),
        sources: Some(vec![Source {
            page: 4,
            text: "A process is a program in execution.".to_string(),
        }]),
        error: false,
    }))
}

fn asked_request(effects: &[Effect]) -> QuestionRequest {
    match effects {
        [Effect::AskQuestion { request }] => request.clone(),
        other => panic!("expected a single AskQuestion effect, got {other:?}"),
    }
}

#[test]
fn first_question_sends_absent_context_and_history() {
    init_logging();
    let (state, effects) = ask(indexed_state(), "What is X?");

    assert_eq!(
        asked_request(&effects),
        QuestionRequest {
            question: "What is X?".to_string(),
            syllabus_context: None,
            marks: 3,
            chat_history: None,
        }
    );
    assert_eq!(state.messages(), &[ChatMessage::user("What is X?")]);
    assert!(state.view().asking);
}

#[test]
fn question_is_refused_until_a_document_is_indexed() {
    init_logging();
    let (mut state, effects) = ask(AppState::new(), "What is X?");

    assert!(effects.is_empty());
    assert!(state.messages().is_empty());
    assert_eq!(state.view().chat_error.as_deref(), Some(NOT_INDEXED_PROMPT));
    assert!(state.consume_dirty());
}

#[test]
fn blank_question_is_rejected_locally() {
    init_logging();
    for question in ["", "   ", "\n\t "] {
        let (state, effects) = ask(indexed_state(), question);
        assert!(effects.is_empty());
        assert!(state.messages().is_empty());
        assert!(state.view().chat_error.is_some());
    }
}

#[test]
fn overly_long_question_is_rejected_locally() {
    init_logging();
    let question = "x".repeat(1001);
    let (state, effects) = ask(indexed_state(), &question);

    assert!(effects.is_empty());
    assert!(state.messages().is_empty());
}

#[test]
fn non_positive_marks_are_rejected_before_sending() {
    init_logging();
    let (state, _) = update(
        indexed_state(),
        Msg::RestoreSettings(studymind_core::StudySettings {
            syllabus_text: String::new(),
            marks: 0,
            study_mode: false,
        }),
    );
    let (state, effects) = ask(state, "What is X?");

    assert!(effects.is_empty());
    assert_eq!(
        state.view().chat_error.as_deref(),
        Some("Marks must be a positive number")
    );
}

#[test]
fn successful_answer_adds_exactly_two_messages() {
    init_logging();
    let state = indexed_state();
    let before = state.messages().len();

    let (state, _) = ask(state, "  What is a process?  ");
    let (state, effects) = update(state, answer("A running program."));

    assert!(effects.is_empty());
    assert_eq!(state.messages().len(), before + 2);
    let reply = &state.messages()[1];
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "A running program.");
    assert_eq!(reply.sources.as_ref().map(Vec::len), Some(1));
    assert!(!reply.error);
    assert_eq!(state.messages()[0].content, "What is a process?");
    assert!(!state.view().asking);
}

#[test]
fn failed_answer_still_adds_two_messages_with_error_flag() {
    init_logging();
    let state = indexed_state();
    let (state, _) = ask(state, "What is X?");
    let (state, _) = update(state, Msg::AnswerReceived(Err(None)));

    assert_eq!(state.messages().len(), 2);
    let reply = &state.messages()[1];
    assert!(reply.error);
    assert_eq!(reply.content, format!("Error: {ANSWER_FALLBACK}"));
}

#[test]
fn failed_answer_prefers_server_detail() {
    init_logging();
    let (state, _) = ask(indexed_state(), "What is X?");
    let (state, _) = update(
        state,
        Msg::AnswerReceived(Err(Some("Vectorstore is empty. Please upload PDFs first.".into()))),
    );

    assert_eq!(
        state.messages()[1].content,
        "Error: Vectorstore is empty. Please upload PDFs first."
    );
}

#[test]
fn server_reported_error_is_kept_verbatim() {
    init_logging();
    let (state, _) = ask(indexed_state(), "What is X?");
    let (state, _) = update(
        state,
        Msg::AnswerReceived(Ok(Answer {
            content: "Model quota exceeded".to_string(),
            sources: None,
            error: true,
        })),
    );

    let reply = &state.messages()[1];
    assert!(reply.error);
    assert_eq!(reply.content, "Model quota exceeded");
}

#[test]
fn follow_up_sends_prior_turns_without_error_replies() {
    init_logging();
    let (state, _) = ask(indexed_state(), "First?");
    let (state, _) = update(state, answer("One."));
    let (state, _) = ask(state, "Second?");
    let (state, _) = update(state, Msg::AnswerReceived(Err(None)));
    let (state, effects) = ask(state, "Third?");

    assert_eq!(
        asked_request(&effects).chat_history,
        Some(vec![
            HistoryTurn {
                role: Role::User,
                content: "First?".to_string(),
            },
            HistoryTurn {
                role: Role::Assistant,
                content: "One.".to_string(),
            },
            HistoryTurn {
                role: Role::User,
                content: "Second?".to_string(),
            },
        ])
    );
    assert_eq!(state.messages().len(), 5);
}

#[test]
fn only_one_question_in_flight() {
    init_logging();
    let (state, first) = ask(indexed_state(), "First?");
    assert_eq!(first.len(), 1);

    let (state, second) = ask(state, "Second?");
    assert!(second.is_empty());
    assert_eq!(state.messages().len(), 1);
}

#[test]
fn syllabus_text_and_marks_flow_into_request() {
    init_logging();
    let (state, _) = update(indexed_state(), Msg::MarksChanged(12));
    let (state, _) = update(
        state,
        Msg::SyllabusTextChanged("Unit I\nTopics: Paging".to_string()),
    );
    let (_, effects) = ask(state, "Explain paging");

    let request = asked_request(&effects);
    assert_eq!(request.marks, 12);
    assert_eq!(
        request.syllabus_context.as_deref(),
        Some("Unit I\nTopics: Paging")
    );
}

#[test]
fn clearing_chat_empties_history() {
    init_logging();
    let (state, _) = ask(indexed_state(), "First?");
    let (state, _) = update(state, answer("One."));
    let (state, _) = update(state, Msg::ChatCleared);

    assert!(state.messages().is_empty());
    let (_, effects) = ask(state, "Again?");
    assert_eq!(asked_request(&effects).chat_history, None);
}

#[test]
fn answer_to_a_question_cleared_in_flight_is_dropped() {
    init_logging();
    let (state, _) = ask(indexed_state(), "First?");
    let (state, _) = update(state, Msg::ChatCleared);
    assert!(state.view().asking);

    let (state, _) = ask(state, "Too early?");
    assert!(state.messages().is_empty());

    let (state, _) = update(state, answer("Late reply."));
    assert!(state.messages().is_empty());
    assert!(!state.view().asking);

    let (state, effects) = ask(state, "Fresh start?");
    assert_eq!(asked_request(&effects).chat_history, None);
    let (state, _) = update(state, answer("Kept."));
    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.messages()[1].content, "Kept.");
}
