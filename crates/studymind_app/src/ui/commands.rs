use std::path::PathBuf;

use studymind_core::Msg;

/// One line of shell input, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Msg),
    Files,
    History,
    Help,
    Tutorial,
    Quit,
    Empty,
    /// Input that looked like a command but could not be used; carries a usage hint.
    Invalid(String),
}

/// Parses a shell line. Text that is not a recognized command is asked as a question.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word.to_ascii_lowercase().as_str(), rest) {
        ("upload", "") => usage("upload <path-to-pdf>"),
        ("upload", path) => Command::Dispatch(Msg::FileSelected(PathBuf::from(path))),
        ("rm" | "remove", "") => usage("rm <filename>"),
        ("rm" | "remove", name) => Command::Dispatch(Msg::RemoveClicked(name.to_string())),
        ("reset", "") => Command::Dispatch(Msg::ResetClicked),
        ("files", "") => Command::Files,
        ("status", "") => Command::Dispatch(Msg::ServerStatusRequested),
        ("ask", question) => Command::Dispatch(Msg::QuestionSubmitted(question.to_string())),
        ("marks", value) => match value.parse::<u32>() {
            Ok(marks) => Command::Dispatch(Msg::MarksChanged(marks)),
            Err(_) => usage("marks <3|5|12>"),
        },
        ("study", mode) => match mode.to_ascii_lowercase().as_str() {
            "on" => Command::Dispatch(Msg::StudyModeToggled(true)),
            "off" => Command::Dispatch(Msg::StudyModeToggled(false)),
            _ => usage("study on|off"),
        },
        ("context", "") => usage("context <syllabus text> | context clear"),
        ("context", text) if text.eq_ignore_ascii_case("clear") => {
            Command::Dispatch(Msg::SyllabusCleared)
        }
        ("context", text) => Command::Dispatch(Msg::SyllabusTextChanged(text.to_string())),
        ("syllabus", "") => Command::Dispatch(Msg::SyllabusFileSelected(None)),
        ("syllabus", path) => {
            Command::Dispatch(Msg::SyllabusFileSelected(Some(PathBuf::from(path))))
        }
        ("history", "") => Command::History,
        ("clear", "") => Command::Dispatch(Msg::ChatCleared),
        ("help" | "?", "") => Command::Help,
        ("tutorial", "") => Command::Tutorial,
        ("quit" | "exit", "") => Command::Quit,
        _ => Command::Dispatch(Msg::QuestionSubmitted(line.to_string())),
    }
}

fn usage(text: &str) -> Command {
    Command::Invalid(format!("usage: {text}"))
}
