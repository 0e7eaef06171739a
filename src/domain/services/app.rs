use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::NotesStore;
use super::SessionStore;
use super::SessionTeardown;
use crate::domain::models::Event;
use crate::domain::models::SessionContext;
use crate::domain::models::StorageBox;
use crate::infrastructure::api::ApiClient;

/// Both stores wired to one HTTP client, one session context and one
/// teardown policy.
pub struct App {
    pub client: ApiClient,
    pub session: SessionStore,
    pub notes: NotesStore,
}

impl App {
    pub async fn init(
        url: &str,
        storage: StorageBox,
        tx: Option<mpsc::UnboundedSender<Event>>,
    ) -> Result<App> {
        let context = SessionContext::default();
        let teardown = SessionTeardown::new(context.clone(), storage.clone(), tx);
        let client = ApiClient::new(url, context, Arc::new(teardown))?;

        let session = SessionStore::init(client.clone(), storage).await?;
        let notes = NotesStore::new(client.clone());

        return Ok(App {
            client,
            session,
            notes,
        });
    }
}
