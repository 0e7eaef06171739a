#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use std::sync::PoisonError;
use std::sync::RwLock;

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::domain::models::ApiError;
use crate::domain::models::AuthResponse;
use crate::domain::models::Credentials;
use crate::domain::models::KeyValueStore;
use crate::domain::models::Session;
use crate::domain::models::SessionContext;
use crate::domain::models::StorageBox;
use crate::domain::models::StorageKey;
use crate::domain::models::User;
use crate::infrastructure::api::ApiClient;

const REGISTER_PATH: &str = "/api/v1/auth/register";
const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Drops the session from memory and from durable storage. Storage failures
/// are logged, the in-memory session is always cleared.
pub async fn clear_session(context: &SessionContext, storage: &dyn KeyValueStore) {
    context.clear();

    for key in StorageKey::iter() {
        if let Err(err) = storage.remove(key).await {
            tracing::error!(error = ?err, key = %key, "Failed to remove session key from storage");
        }
    }
}

/// Reads a previously persisted session. The token comes back as stored, the
/// user is parsed best effort and is absent when missing or unreadable.
pub async fn load_session(storage: &dyn KeyValueStore) -> Result<Session> {
    let token = storage.get(StorageKey::Token).await?;
    let user = match storage.get(StorageKey::User).await? {
        Some(payload) => match serde_json::from_str::<Option<User>>(&payload) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = ?err, "Stored user is not readable, ignoring it");
                None
            }
        },
        None => None,
    };

    return Ok(Session { token, user });
}

/// Holds the authenticated identity. The session itself lives in the
/// `SessionContext` shared with the HTTP client, so every change here is
/// immediately reflected in the `Authorization` header of later requests.
pub struct SessionStore {
    client: ApiClient,
    storage: StorageBox,
    error: RwLock<Option<String>>,
}

impl SessionStore {
    /// Seeds the session from storage. A recovered token authenticates
    /// requests straight away, without logging in again.
    pub async fn init(client: ApiClient, storage: StorageBox) -> Result<SessionStore> {
        let session = load_session(storage.as_ref()).await?;
        tracing::debug!(
            authenticated = session.is_authenticated(),
            has_user = session.user.is_some(),
            "Restored session from storage"
        );
        client.context().replace(session);

        return Ok(SessionStore {
            client,
            storage,
            error: RwLock::new(None),
        });
    }

    pub fn user(&self) -> Option<User> {
        return self.client.context().user();
    }

    pub fn is_authenticated(&self) -> bool {
        return self.client.context().is_authenticated();
    }

    /// Message of the last failed login or registration.
    pub fn error(&self) -> Option<String> {
        return self
            .error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
    }

    fn set_error(&self, error: Option<String>) {
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = error;
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        return self
            .authenticate(REGISTER_PATH, email, password, "Failed to register")
            .await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        return self
            .authenticate(LOGIN_PATH, email, password, "Failed to log in")
            .await;
    }

    /// Local only, the backend keeps no server side session to end.
    pub async fn logout(&self) {
        clear_session(self.client.context(), self.storage.as_ref()).await;
        tracing::debug!("Logged out");
    }

    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
        fallback: &str,
    ) -> Result<AuthResponse, ApiError> {
        let credentials = Credentials::new(email, password);
        let res = self
            .client
            .post::<_, AuthResponse>(path, &credentials)
            .await
            .and_then(|res| {
                return res.ok_or_else(|| {
                    return ApiError::Decode("Missing authentication response".to_string());
                });
            });

        let auth = match res {
            Ok(auth) => auth,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    status = ?err.status(),
                    path = path,
                    "Authentication failed"
                );
                self.set_error(Some(err.display_message(fallback)));
                return Err(err);
            }
        };

        self.set_error(None);
        self.set_session(&auth).await;
        tracing::debug!(user_id = auth.user.id, "Authenticated");

        return Ok(auth);
    }

    /// Commits a fresh session to memory, the client's header and storage.
    /// The session is usable for this process even if persisting it fails.
    async fn set_session(&self, auth: &AuthResponse) {
        self.client
            .context()
            .set(&auth.token, Some(auth.user.clone()));

        if let Err(err) = self.storage.set(StorageKey::Token, &auth.token).await {
            tracing::error!(error = ?err, "Failed to persist token");
        }

        match serde_json::to_string(&auth.user) {
            Ok(payload) => {
                if let Err(err) = self.storage.set(StorageKey::User, &payload).await {
                    tracing::error!(error = ?err, "Failed to persist user");
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to serialize user");
            }
        }
    }
}
