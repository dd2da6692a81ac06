#![allow(dead_code)]

use serde_json::{json, Value};

/// Build one event object. `user` is `(id, username)`, `app` is
/// `(name, display_label)`.
pub fn event(
    success: bool,
    timestamp: Option<&str>,
    user: Option<(&str, &str)>,
    app: Option<(&str, Option<&str>)>,
) -> Value {
    let mut obj = json!({ "sso_token_success": success });
    if let Some(ts) = timestamp {
        obj["timestamp"] = json!(ts);
    }
    if let Some((id, username)) = user {
        obj["initiated_by"] = json!({ "id": id, "username": username });
    }
    if let Some((name, label)) = app {
        obj["application"] = match label {
            Some(label) => json!({ "name": name, "display_label": label }),
            None => json!({ "name": name }),
        };
    }
    obj
}

pub fn as_jsonl(events: &[Value]) -> String {
    events
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn as_array(events: &[Value]) -> String {
    Value::Array(events.to_vec()).to_string()
}

/// Three-record reference dataset: two successes for alice on different
/// days and applications, one failed attempt for bob a day later.
pub fn reference_dataset() -> Vec<Value> {
    vec![
        event(
            true,
            Some("2024-01-01T10:00:00Z"),
            Some(("u1", "alice")),
            Some(("app-a", None)),
        ),
        event(
            true,
            Some("2024-01-02T10:00:00Z"),
            Some(("u1", "alice")),
            Some(("app-b", None)),
        ),
        event(
            false,
            Some("2024-01-03T10:00:00Z"),
            Some(("u2", "bob")),
            Some(("app-a", None)),
        ),
    ]
}
