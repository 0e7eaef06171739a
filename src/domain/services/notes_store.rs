#[cfg(test)]
#[path = "notes_store_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockWriteGuard;

use crate::domain::models::ApiError;
use crate::domain::models::Note;
use crate::domain::models::NoteID;
use crate::domain::models::NoteRequest;
use crate::infrastructure::api::ApiClient;

const NOTES_PATH: &str = "/api/v1/notes";

fn note_path(id: NoteID) -> String {
    return format!("{NOTES_PATH}/{id}");
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotesState {
    /// Newest first.
    pub notes: Vec<Note>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Local cache of the user's notes.
///
/// The list is eventually consistent with the backend. It is authoritative
/// only right after `fetch_notes`; create, update and delete apply a best
/// effort local projection of a write the server accepted, and nothing ever
/// reconciles beyond that. Calls are not serialized against each other, so
/// overlapping calls complete in whatever order their responses arrive.
#[derive(Clone)]
pub struct NotesStore {
    client: ApiClient,
    state: Arc<RwLock<NotesState>>,
}

impl NotesStore {
    pub fn new(client: ApiClient) -> NotesStore {
        return NotesStore {
            client,
            state: Arc::new(RwLock::new(NotesState::default())),
        };
    }

    fn state(&self) -> RwLockWriteGuard<'_, NotesState> {
        return self.state.write().unwrap_or_else(PoisonError::into_inner);
    }

    pub fn snapshot(&self) -> NotesState {
        return self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
    }

    pub fn notes(&self) -> Vec<Note> {
        return self.snapshot().notes;
    }

    pub fn loading(&self) -> bool {
        return self.snapshot().loading;
    }

    pub fn error(&self) -> Option<String> {
        return self.snapshot().error;
    }

    fn fail(&self, err: &ApiError, fallback: &str) {
        let message = err.display_message(fallback);
        if err.is_unauthorized() {
            tracing::warn!(message = %message, "Notes request was not authorized");
        } else {
            tracing::error!(
                error = %err,
                status = ?err.status(),
                message = %message,
                "Notes request failed"
            );
        }
        self.state().error = Some(message);
    }

    /// Replaces the whole list with the server's. Failures only land in
    /// `error`, the current list is kept.
    pub async fn fetch_notes(&self) {
        {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
        }

        match self.client.get::<Vec<Note>>(NOTES_PATH).await {
            Ok(notes) => {
                let notes = notes.unwrap_or_default();
                tracing::debug!(count = notes.len(), "Fetched notes");
                self.state().notes = notes;
            }
            Err(err) => {
                self.fail(&err, "Failed to fetch notes");
            }
        }

        self.state().loading = false;
    }

    /// Loads a single note and refreshes the cached copy when there is one.
    pub async fn fetch_note(&self, id: NoteID) -> Result<Note, ApiError> {
        let res = self
            .client
            .get::<Note>(&note_path(id))
            .await
            .and_then(|note| {
                return note.ok_or_else(|| return ApiError::Decode("Missing note".to_string()));
            });

        let note = match res {
            Ok(note) => note,
            Err(err) => {
                self.fail(&err, "Failed to fetch note");
                return Err(err);
            }
        };

        let mut state = self.state();
        if let Some(cached) = state.notes.iter_mut().find(|e| return e.id == note.id) {
            *cached = note.clone();
        }

        return Ok(note);
    }

    pub async fn create_note(&self, title: &str, content: &str) -> Result<Note, ApiError> {
        let req = NoteRequest::new(title, content);
        let res = self
            .client
            .post::<_, Note>(NOTES_PATH, &req)
            .await
            .and_then(|note| {
                return note
                    .ok_or_else(|| return ApiError::Decode("Missing created note".to_string()));
            });

        let note = match res {
            Ok(note) => note,
            Err(err) => {
                self.fail(&err, "Failed to create note");
                return Err(err);
            }
        };

        tracing::debug!(id = note.id, "Created note");
        self.state().notes.insert(0, note.clone());

        return Ok(note);
    }

    /// Succeeds even when the note is not cached locally; only the server's
    /// answer decides.
    pub async fn update_note(&self, id: NoteID, title: &str, content: &str) -> Result<(), ApiError> {
        let req = NoteRequest::new(title, content);
        if let Err(err) = self.client.put(&note_path(id), &req).await {
            self.fail(&err, "Failed to update note");
            return Err(err);
        }

        let mut state = self.state();
        match state.notes.iter_mut().find(|e| return e.id == id) {
            Some(note) => {
                note.title = req.title;
                note.content = req.content;
                tracing::debug!(id = id, "Updated note");
            }
            None => {
                tracing::debug!(id = id, "Updated note is not cached locally");
            }
        }

        return Ok(());
    }

    pub async fn delete_note(&self, id: NoteID) -> Result<(), ApiError> {
        if let Err(err) = self.client.delete(&note_path(id)).await {
            self.fail(&err, "Failed to delete note");
            return Err(err);
        }

        tracing::debug!(id = id, "Deleted note");
        self.state().notes.retain(|e| return e.id != id);

        return Ok(());
    }
}
