//! Request validation for profile submissions and chat turns.
//!
//! Validators take the raw JSON body so every failing field can be reported at
//! once, instead of stopping at the first serde error. Unknown fields are ignored.
//! Text is trimmed; whitespace-only counts as empty.

use crate::chat::ChatRequest;
use crate::profile::NewPetProfile;
use serde::Serialize;
use serde_json::{Map, Value};

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Malformed or incomplete request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {subject}: {}", summarize(.errors))]
pub struct ValidationError {
    /// What was being validated ("pet profile", "chat message").
    pub subject: &'static str,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Names of the failing fields, in check order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

const PROFILE: &str = "pet profile";
const CHAT: &str = "chat message";

/// Checks a profile submission: `name`, `age`, `breed` required; `size` optional.
pub fn validate_profile(input: &Value) -> Result<NewPetProfile, ValidationError> {
    let obj = as_object(input, PROFILE)?;
    let mut errors = Vec::new();

    let name = required_text(obj, "name", "Name", &mut errors);
    let age = required_text(obj, "age", "Age", &mut errors);
    let breed = required_text(obj, "breed", "Breed", &mut errors);
    let size = optional_text(obj, "size", "Size", &mut errors);

    match (name, age, breed) {
        (Some(name), Some(age), Some(breed)) if errors.is_empty() => Ok(NewPetProfile {
            name,
            age,
            breed,
            size,
        }),
        _ => Err(ValidationError {
            subject: PROFILE,
            errors,
        }),
    }
}

/// Checks a chat turn: `message` and `sessionId` required; `petContext` optional.
pub fn validate_chat_request(input: &Value) -> Result<ChatRequest, ValidationError> {
    let obj = as_object(input, CHAT)?;
    let mut errors = Vec::new();

    let message = required_text(obj, "message", "Message", &mut errors);
    let session_id = required_text(obj, "sessionId", "Session id", &mut errors);
    let pet_context = optional_text(obj, "petContext", "Pet context", &mut errors);

    match (message, session_id) {
        (Some(message), Some(session_id)) if errors.is_empty() => Ok(ChatRequest {
            message,
            session_id,
            pet_context,
        }),
        _ => Err(ValidationError {
            subject: CHAT,
            errors,
        }),
    }
}

fn as_object<'a>(input: &'a Value, subject: &'static str) -> Result<&'a Map<String, Value>, ValidationError> {
    input.as_object().ok_or_else(|| ValidationError {
        subject,
        errors: vec![FieldError::new("body", "Expected a JSON object")],
    })
}

fn required_text(
    obj: &Map<String, Value>,
    field: &str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, format!("{} is required", label)));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(FieldError::new(field, format!("{} is required", label)));
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.push(FieldError::new(field, format!("{} must be text", label)));
            None
        }
    }
}

/// Absent, null and blank all mean "not specified".
fn optional_text(
    obj: &Map<String, Value>,
    field: &str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.push(FieldError::new(field, format!("{} must be text", label)));
            None
        }
    }
}
