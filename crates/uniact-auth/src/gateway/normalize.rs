//! Pure helpers: login/refresh body normalization (no HTTP, no status logic).
//!
//! The portal API is inconsistent about where it puts the user and the token.
//! Observed shapes:
//!
//! ```text
//! { "user": {...}, "token": "..." }
//! { "user": {...}, "accessToken": "...", "refreshToken": "..." }
//! { "data": { "user": {...}, "token": "..." } }
//! { "data": { "_id": 12, "studentId": 65015368, ... } }
//! { "user": {...} }                      # no token at all
//! ```

use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};
use crate::types::{Identity, Role};

const TOKEN_FIELDS: &[&str] = &["token", "accessToken", "access_token"];
const REFRESH_FIELDS: &[&str] = &["refreshToken", "refresh_token"];
const ID_FIELDS: &[&str] = &["id", "_id", "userId", "user_id"];
const STUDENT_ID_FIELDS: &[&str] = &["studentId", "student_id"];

/// Normalized login/refresh response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenPayload {
    pub identity: Option<Identity>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Read a field as a string, coercing numbers. Empty strings count as absent.
fn string_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match obj.get(*name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn user_object(body: &Value) -> Option<&Map<String, Value>> {
    if let Some(user) = body.get("user").and_then(Value::as_object) {
        return Some(user);
    }
    let data = body.get("data")?;
    if let Some(user) = data.get("user").and_then(Value::as_object) {
        return Some(user);
    }
    data.as_object()
        .filter(|obj| string_field(obj, ID_FIELDS).is_some())
}

/// Look in the top level first, then under `data`.
fn token_field(body: &Value, names: &[&str]) -> Option<String> {
    let top = body.as_object().and_then(|obj| string_field(obj, names));
    top.or_else(|| {
        body.get("data")
            .and_then(Value::as_object)
            .and_then(|obj| string_field(obj, names))
    })
}

/// Decode a user object into an [`Identity`].
///
/// `fallback_student_id` fills a missing student number (the one used to log
/// in). A user without any id is rejected.
pub(crate) fn identity_from_user(
    user: &Map<String, Value>,
    fallback_student_id: Option<&str>,
) -> AuthResult<Identity> {
    let id = string_field(user, ID_FIELDS).ok_or_else(|| AuthError::InvalidResponse {
        message: "user object has no id".to_string(),
    })?;

    let student_id = string_field(user, STUDENT_ID_FIELDS)
        .or_else(|| fallback_student_id.map(String::from))
        .unwrap_or_default();

    let role = Role::parse_lenient(user.get("role").and_then(Value::as_str));

    Ok(Identity {
        id,
        student_id,
        role,
        email: string_field(user, &["email"]),
        first_name: string_field(user, &["firstName", "first_name"]),
        last_name: string_field(user, &["lastName", "last_name"]),
    })
}

/// Normalize a token-bearing response body.
pub(crate) fn parse_token_body(
    body: &Value,
    fallback_student_id: Option<&str>,
) -> AuthResult<TokenPayload> {
    if !body.is_object() {
        return Err(AuthError::InvalidResponse {
            message: "expected a JSON object".to_string(),
        });
    }

    let identity = match user_object(body) {
        Some(user) => Some(identity_from_user(user, fallback_student_id)?),
        None => None,
    };

    Ok(TokenPayload {
        identity,
        token: token_field(body, TOKEN_FIELDS),
        refresh_token: token_field(body, REFRESH_FIELDS),
    })
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": ...}`, `{"error": ...}`, `{"error": {"message": ...}}`
/// or a short plain-text body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let direct = ["message", "error", "msg"]
                .iter()
                .find_map(|k| json.get(*k).and_then(Value::as_str))
                .filter(|s| !s.trim().is_empty());
            direct
                .or_else(|| {
                    json.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(Value::as_str)
                })
                .map(String::from)
        }
        Err(_) if !body.starts_with('<') => Some(body.chars().take(200).collect()),
        Err(_) => None,
    }
}

/// Placeholder bearer token for responses that carry none.
pub(crate) fn synthesize_token() -> String {
    format!("local-{}", uuid::Uuid::new_v4())
}
