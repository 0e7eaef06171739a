use std::env;

use serde_json::json;
use serde_json::Value;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

/// User record as returned by the backend's auth endpoints.
pub fn user_fixture() -> Value {
    return json!({
        "id": 7,
        "email": "ada@example.com",
        "created_at": "2024-03-01T09:00:00Z",
        "updated_at": "2024-03-01T09:00:00Z"
    });
}

pub fn auth_response_fixture(token: &str) -> String {
    return json!({
        "token": token,
        "user": user_fixture()
    })
    .to_string();
}

pub fn note_fixture(id: i64, title: &str, content: &str) -> Value {
    return json!({
        "id": id,
        "user_id": 7,
        "title": title,
        "content": content,
        "created_at": "2024-03-02T10:30:00Z",
        "updated_at": "2024-03-02T10:30:00Z"
    });
}

pub fn notes_fixture() -> String {
    return Value::Array(vec![
        note_fixture(2, "Groceries", "Milk and eggs"),
        note_fixture(1, "Ideas", "Write a terminal notes client"),
    ])
    .to_string();
}

pub fn error_fixture(error: &str, message: &str) -> String {
    return json!({
        "error": error,
        "message": message
    })
    .to_string();
}
