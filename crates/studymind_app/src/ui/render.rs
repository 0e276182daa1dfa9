//! Turns view-model changes into terminal lines.

use studymind_core::{AppViewModel, ChatMessage, Msg, Role, ServerDocument, UploadedFile};

const SNIPPET_CHARS: usize = 80;

/// Lines describing what changed between two views.
pub fn render(prev: &AppViewModel, next: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    for file in &next.files {
        if prev.files.iter().find(|old| old.name == file.name) != Some(file) {
            lines.push(file_row(file));
        }
    }
    for old in &prev.files {
        if !next.files.iter().any(|file| file.name == old.name) {
            lines.push(format!("  {} removed", old.name));
        }
    }
    if next.indexed && !prev.indexed {
        lines.push("Documents ready. Ask away.".to_string());
    }
    push_banner(&mut lines, &prev.upload_error, &next.upload_error);

    if next.messages.len() < prev.messages.len() {
        lines.push("Chat cleared.".to_string());
    }
    let seen = if next.messages.len() >= prev.messages.len() {
        prev.messages.len()
    } else {
        0
    };
    for message in &next.messages[seen..] {
        lines.extend(message_lines(message));
    }
    if next.asking && !prev.asking {
        lines.push("  thinking...".to_string());
    }
    push_banner(&mut lines, &prev.chat_error, &next.chat_error);

    if next.marks != prev.marks
        || next.study_mode != prev.study_mode
        || next.syllabus_text != prev.syllabus_text
    {
        lines.push(settings_line(next));
    }
    if next.syllabus_parsing && !prev.syllabus_parsing {
        lines.push("  parsing syllabus...".to_string());
    }
    push_banner(&mut lines, &prev.study_error, &next.study_error);

    if next.server_documents != prev.server_documents {
        if let Some(documents) = &next.server_documents {
            lines.extend(server_table(documents));
        }
    }

    lines
}

/// Clears the banner a user action may set again, so a repeated error is still shown.
pub fn forget_banners(msg: &Msg, view: &mut AppViewModel) {
    match msg {
        Msg::QuestionSubmitted(_) => view.chat_error = None,
        Msg::FileSelected(_)
        | Msg::RemoveClicked(_)
        | Msg::ResetClicked
        | Msg::ServerStatusRequested => view.upload_error = None,
        Msg::MarksChanged(_) | Msg::SyllabusFileSelected(_) => view.study_error = None,
        _ => {}
    }
}

fn push_banner(lines: &mut Vec<String>, prev: &Option<String>, next: &Option<String>) {
    if let Some(text) = next {
        if prev.as_ref() != Some(text) {
            lines.push(format!("! {text}"));
        }
    }
}

pub fn file_row(file: &UploadedFile) -> String {
    let mut row = format!("  {:<32} {:<10}", file.name, file.status.label());
    if file.status.is_busy() {
        row.push_str(&format!(" {:>3}%", file.progress));
    }
    if let Some(pages) = file.pages {
        row.push_str(&format!(" pages={pages}"));
    }
    if let Some(chunks) = file.chunks {
        row.push_str(&format!(" chunks={chunks}"));
    }
    row.trim_end().to_string()
}

pub fn file_table(view: &AppViewModel) -> Vec<String> {
    if view.files.is_empty() {
        return vec!["No documents uploaded yet.".to_string()];
    }
    let mut lines: Vec<String> = view.files.iter().map(file_row).collect();
    lines.push(format!(
        "{} file(s), {}{}",
        view.file_count,
        if view.indexed { "indexed" } else { "not indexed" },
        if view.busy { ", processing" } else { "" }
    ));
    lines
}

pub fn message_lines(message: &ChatMessage) -> Vec<String> {
    let speaker = match (message.role, message.error) {
        (Role::User, _) => "you",
        (Role::Assistant, false) => "studymind",
        (Role::Assistant, true) => "error",
    };
    let mut lines: Vec<String> = message
        .content
        .lines()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                format!("{speaker}> {line}")
            } else {
                format!("  {line}")
            }
        })
        .collect();
    if lines.is_empty() {
        lines.push(format!("{speaker}>"));
    }
    for source in message.sources.iter().flatten() {
        lines.push(format!("  [p.{}] {}", source.page, snippet(&source.text)));
    }
    lines
}

pub fn transcript(view: &AppViewModel) -> Vec<String> {
    if view.messages.is_empty() {
        return vec!["No messages yet.".to_string()];
    }
    view.messages.iter().flat_map(message_lines).collect()
}

pub fn settings_line(view: &AppViewModel) -> String {
    let context = if !view.study_mode {
        "off".to_string()
    } else if view.syllabus_text.is_empty() {
        "on, no syllabus".to_string()
    } else {
        format!("on, {} chars of syllabus", view.syllabus_text.chars().count())
    };
    format!(
        "Answer length: {} marks, {}. Study mode: {}.",
        view.marks, view.answer_length, context
    )
}

pub fn server_table(documents: &[ServerDocument]) -> Vec<String> {
    if documents.is_empty() {
        return vec!["Server has no documents.".to_string()];
    }
    documents
        .iter()
        .map(|doc| {
            format!(
                "  {:<32} {:<10} pages={} chunks={}",
                doc.name,
                doc.status,
                count(doc.pages),
                count(doc.chunks)
            )
        })
        .collect()
}

fn count(value: Option<u32>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{cut}...")
}
