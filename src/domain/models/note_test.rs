use anyhow::Result;
use test_utils::note_fixture;

use super::Note;

#[test]
fn it_keeps_server_metadata() -> Result<()> {
    let note: Note = serde_json::from_value(note_fixture(1, "Ideas", "Hello"))?;

    assert_eq!(note.id, 1);
    assert_eq!(note.title, "Ideas");
    assert_eq!(note.metadata_str("created_at"), Some("2024-03-02T10:30:00Z"));
    assert_eq!(note.metadata.get("user_id"), Some(&serde_json::json!(7)));

    let back = serde_json::to_value(&note)?;
    assert_eq!(back, note_fixture(1, "Ideas", "Hello"));

    return Ok(());
}

#[test]
fn it_defaults_missing_text_fields() -> Result<()> {
    let note: Note = serde_json::from_str(r#"{"id": 3}"#)?;

    assert_eq!(note.title, "");
    assert_eq!(note.content, "");
    assert!(note.metadata.is_empty());

    return Ok(());
}

#[test]
fn it_summarizes_first_line() -> Result<()> {
    let note: Note = serde_json::from_value(note_fixture(
        1,
        "Long",
        "A rather long first line that keeps going\nsecond line",
    ))?;

    assert_eq!(note.summary(100), "A rather long first line that keeps going");
    assert_eq!(note.summary(10), "A rathe...");

    return Ok(());
}
