use super::{
    config::DEFAULT_NOTE_TITLE,
    errors::{Outcome, ToolError},
    models::{fresh_id, Note},
};
use chrono::{DateTime, Local, NaiveDate};

/// What the note form submits. Every field may be blank.
#[derive(Clone, Debug, Default)]
pub struct NoteDraft {
    pub title: String,
    pub session_date: String,
    pub content: String,
}

pub fn parse_session_date(raw: &str) -> Result<Option<NaiveDate>, ToolError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ToolError::InvalidDate(raw.to_string()))
}

/// New notes go to the front of the list.
pub fn add_note(
    notes: &mut Vec<Note>,
    draft: NoteDraft,
    now: DateTime<Local>,
) -> Result<&Note, ToolError> {
    let session_date = parse_session_date(&draft.session_date)?
        .map(|d| d.format("%Y-%m-%d").to_string());
    let title = match draft.title.trim() {
        "" => DEFAULT_NOTE_TITLE.to_string(),
        t => t.to_string(),
    };
    let id = fresh_id(now.timestamp_millis(), notes.iter().map(|n| n.id));
    notes.insert(
        0,
        Note {
            id,
            title,
            session_date,
            content: draft.content,
            timestamp: now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        },
    );

    Ok(&notes[0])
}

pub fn find(notes: &[Note], id: i64) -> Result<&Note, ToolError> {
    notes
        .iter()
        .find(|n| n.id == id)
        .ok_or(ToolError::NotFound { kind: "note", id })
}

pub fn delete_note(
    notes: &mut Vec<Note>,
    id: i64,
    confirmed: bool,
) -> Result<(Outcome, Note), ToolError> {
    let note = find(notes, id)?.clone();
    if Outcome::gate(confirmed) == Outcome::Cancelled {
        return Ok((Outcome::Cancelled, note));
    }
    notes.retain(|n| n.id != id);

    Ok((Outcome::Applied, note))
}
