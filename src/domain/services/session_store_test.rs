use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;
use test_utils::auth_response_fixture;
use test_utils::error_fixture;
use test_utils::user_fixture;
use tokio::sync::mpsc;

use crate::domain::models::Event;
use crate::domain::models::KeyValueStore;
use crate::domain::models::StorageKey;
use crate::domain::models::User;
use crate::domain::services::App;
use crate::infrastructure::storage::MemoryStore;

async fn app(url: &str, storage: Arc<MemoryStore>) -> Result<(App, mpsc::UnboundedReceiver<Event>)> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let app = App::init(url, storage, Some(tx)).await?;
    return Ok((app, rx));
}

async fn seeded_storage(token: &str) -> Result<Arc<MemoryStore>> {
    let storage = Arc::new(MemoryStore::default());
    storage.set(StorageKey::Token, token).await?;
    storage
        .set(StorageKey::User, &user_fixture().to_string())
        .await?;
    return Ok(storage);
}

#[tokio::test]
async fn it_logs_in_and_persists_the_session() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let login_mock = server
        .mock("POST", "/api/v1/auth/login")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({
            "email": "ada@example.com",
            "password": "hunter22"
        })))
        .with_status(200)
        .with_body(auth_response_fixture("tok"))
        .create_async()
        .await;
    let notes_mock = server
        .mock("GET", "/api/v1/notes")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let storage = Arc::new(MemoryStore::default());
    let (app, _rx) = app(&server.url(), storage.clone()).await?;
    assert!(!app.session.is_authenticated());

    let res = app.session.login("ada@example.com", "hunter22").await?;
    let user: User = serde_json::from_value(user_fixture())?;

    assert_eq!(res.token, "tok");
    assert_eq!(res.user, user);
    assert!(app.session.is_authenticated());
    assert_eq!(app.client.context().token(), Some("tok".to_string()));
    assert_eq!(app.session.user(), Some(user.clone()));
    assert_eq!(app.session.error(), None);

    assert_eq!(storage.get(StorageKey::Token).await?, Some("tok".to_string()));
    let stored_user = storage.get(StorageKey::User).await?.unwrap();
    assert_eq!(serde_json::from_str::<User>(&stored_user)?, user);

    app.notes.fetch_notes().await;

    login_mock.assert_async().await;
    notes_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_registers_and_persists_the_session() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/auth/register")
        .match_body(Matcher::Json(json!({
            "email": "ada@example.com",
            "password": "hunter22"
        })))
        .with_status(201)
        .with_body(auth_response_fixture("fresh"))
        .create_async()
        .await;

    let storage = Arc::new(MemoryStore::default());
    let (app, _rx) = app(&server.url(), storage.clone()).await?;

    let res = app.session.register("ada@example.com", "hunter22").await?;

    assert_eq!(res.token, "fresh");
    assert!(app.session.is_authenticated());
    assert_eq!(storage.get(StorageKey::Token).await?, Some("fresh".to_string()));
    assert!(storage.get(StorageKey::User).await?.is_some());
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_keeps_the_prior_session_when_registration_fails() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/auth/register")
        .with_status(409)
        .with_body(error_fixture(
            "conflict",
            "User with this email already exists",
        ))
        .create_async()
        .await;

    let storage = seeded_storage("old").await?;
    let (app, _rx) = app(&server.url(), storage.clone()).await?;

    let err = app
        .session
        .register("ada@example.com", "hunter22")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(
        app.session.error(),
        Some("User with this email already exists".to_string())
    );
    assert_eq!(app.client.context().token(), Some("old".to_string()));
    assert_eq!(storage.get(StorageKey::Token).await?, Some("old".to_string()));

    return Ok(());
}

#[tokio::test]
async fn it_uses_a_fallback_message_when_the_backend_is_unreachable() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}", listener.local_addr()?);
    drop(listener);

    let (app, _rx) = app(&url, Arc::new(MemoryStore::default())).await?;
    let res = app.session.login("ada@example.com", "hunter22").await;

    assert!(res.is_err());
    assert_eq!(app.session.error(), Some("Failed to log in".to_string()));
    assert!(!app.session.is_authenticated());

    return Ok(());
}

#[tokio::test]
async fn it_tears_down_the_session_when_login_is_rejected() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/auth/login")
        .with_status(401)
        .with_body(error_fixture("unauthorized", "Invalid email or password"))
        .create_async()
        .await;

    let storage = seeded_storage("old").await?;
    let (app, mut rx) = app(&server.url(), storage.clone()).await?;

    let err = app
        .session
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(
        app.session.error(),
        Some("Invalid email or password".to_string())
    );
    assert!(!app.session.is_authenticated());
    assert_eq!(storage.get(StorageKey::Token).await?, None);
    assert_eq!(storage.get(StorageKey::User).await?, None);
    assert_eq!(rx.try_recv()?, Event::LoginRequired);

    return Ok(());
}

#[tokio::test]
async fn it_does_not_report_an_expired_session_for_a_rejected_first_login() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/auth/login")
        .with_status(401)
        .with_body(error_fixture("unauthorized", "Invalid email or password"))
        .create_async()
        .await;

    let storage = Arc::new(MemoryStore::default());
    let (app, mut rx) = app(&server.url(), storage.clone()).await?;

    let err = app
        .session
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(
        app.session.error(),
        Some("Invalid email or password".to_string())
    );
    assert!(!app.session.is_authenticated());
    assert_eq!(storage.get(StorageKey::Token).await?, None);
    assert!(rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test]
async fn it_logs_out_without_a_network_call() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let notes_mock = server
        .mock("GET", "/api/v1/notes")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let storage = seeded_storage("abc").await?;
    let (app, mut rx) = app(&server.url(), storage.clone()).await?;
    assert!(app.session.is_authenticated());

    app.session.logout().await;

    assert!(!app.session.is_authenticated());
    assert_eq!(app.client.context().token(), None);
    assert_eq!(app.session.user(), None);
    assert_eq!(storage.get(StorageKey::Token).await?, None);
    assert_eq!(storage.get(StorageKey::User).await?, None);
    assert!(rx.try_recv().is_err());

    app.notes.fetch_notes().await;
    notes_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_logs_out_when_already_logged_out() -> Result<()> {
    let storage = Arc::new(MemoryStore::default());
    let (app, _rx) = app("http://localhost:8080", storage.clone()).await?;

    app.session.logout().await;

    assert!(!app.session.is_authenticated());
    assert_eq!(storage.get(StorageKey::Token).await?, None);

    return Ok(());
}

#[tokio::test]
async fn it_restores_the_session_from_storage() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let notes_mock = server
        .mock("GET", "/api/v1/notes")
        .match_header("authorization", "Bearer abc")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let storage = seeded_storage("abc").await?;
    let (app, _rx) = app(&server.url(), storage).await?;

    assert!(app.session.is_authenticated());
    assert_eq!(app.client.context().token(), Some("abc".to_string()));
    assert_eq!(
        app.session.user().map(|user| return user.email),
        Some("ada@example.com".to_string())
    );

    app.notes.fetch_notes().await;
    notes_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_ignores_an_unreadable_stored_user() -> Result<()> {
    let storage = Arc::new(MemoryStore::default());
    storage.set(StorageKey::Token, "abc").await?;
    storage.set(StorageKey::User, "{broken").await?;

    let (app, _rx) = app("http://localhost:8080", storage).await?;

    assert!(app.session.is_authenticated());
    assert_eq!(app.session.user(), None);

    return Ok(());
}
