#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Profile of the logged in user. The client trusts whatever the server sent
/// and keeps unknown fields around so they survive a round trip through
/// storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Credentials {
        return Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
    }
}

/// Successful response of both the register and login endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        return self
            .token
            .as_ref()
            .map(|token| return !token.is_empty())
            .unwrap_or(false);
    }
}

/// Shared handle on the current session. The HTTP client reads the bearer
/// token from here when it dispatches a request, the session store and the
/// teardown policy write to it. Cloning shares the same underlying session.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Session>>,
}

impl SessionContext {
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        return self.inner.read().unwrap_or_else(PoisonError::into_inner);
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        return self.inner.write().unwrap_or_else(PoisonError::into_inner);
    }

    pub fn token(&self) -> Option<String> {
        return self.read().token.clone();
    }

    pub fn user(&self) -> Option<User> {
        return self.read().user.clone();
    }

    pub fn is_authenticated(&self) -> bool {
        return self.read().is_authenticated();
    }

    /// Value for the `Authorization` header, present only while authenticated.
    pub fn authorization(&self) -> Option<String> {
        let session = self.read();
        if !session.is_authenticated() {
            return None;
        }

        return session
            .token
            .as_ref()
            .map(|token| return format!("Bearer {token}"));
    }

    pub fn replace(&self, session: Session) {
        *self.write() = session;
    }

    pub fn set(&self, token: &str, user: Option<User>) {
        let mut session = self.write();
        session.token = Some(token.to_string());
        session.user = user;
    }

    pub fn clear(&self) {
        let mut session = self.write();
        session.token = None;
        session.user = None;
    }
}
