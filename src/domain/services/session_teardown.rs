use async_trait::async_trait;
use tokio::sync::mpsc;

use super::clear_session;
use crate::domain::models::Event;
use crate::domain::models::SessionContext;
use crate::domain::models::SessionInvalidator;
use crate::domain::models::StorageBox;

/// What happens on any 401: forget the session everywhere and, when there was
/// one, send the user back to the login entry point.
pub struct SessionTeardown {
    context: SessionContext,
    storage: StorageBox,
    tx: Option<mpsc::UnboundedSender<Event>>,
}

impl SessionTeardown {
    pub fn new(
        context: SessionContext,
        storage: StorageBox,
        tx: Option<mpsc::UnboundedSender<Event>>,
    ) -> SessionTeardown {
        return SessionTeardown {
            context,
            storage,
            tx,
        };
    }
}

#[async_trait]
impl SessionInvalidator for SessionTeardown {
    async fn invalidate(&self) {
        let had_session = self.context.is_authenticated();
        clear_session(&self.context, self.storage.as_ref()).await;

        // A rejected login has no session to expire.
        if !had_session {
            return;
        }

        if let Some(tx) = &self.tx {
            if tx.send(Event::LoginRequired).is_err() {
                tracing::debug!("Nobody is listening for login required events");
            }
        }
    }
}
