#[cfg(test)]
#[path = "note_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Map;
use serde_json::Value;

pub type NoteID = i64;

/// A note as held by the backend. Anything the server attaches beyond the
/// editable fields (owner, timestamps) is carried through untouched in
/// `metadata`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteID,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Note {
    /// Server assigned metadata field as a string, such as `created_at`.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        return self.metadata.get(key).and_then(|val| return val.as_str());
    }

    /// First line of the note content, clipped for list views.
    pub fn summary(&self, max_len: usize) -> String {
        let line = self.content.split('\n').next().unwrap_or_default().trim();
        if line.chars().count() <= max_len {
            return line.to_string();
        }

        let clipped = line
            .chars()
            .take(max_len.saturating_sub(3))
            .collect::<String>();
        return format!("{clipped}...");
    }
}

/// Body for both creating and updating a note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    pub content: String,
}

impl NoteRequest {
    pub fn new(title: &str, content: &str) -> NoteRequest {
        return NoteRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
    }
}
