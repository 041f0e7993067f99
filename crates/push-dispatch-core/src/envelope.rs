//! Inbound message envelope and payload shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type name routed to the user notification handler.
pub const USER_MESSAGE: &str = "userMessage";

/// Type name routed to the remote execution handler.
pub const JS_CODE: &str = "jsCode";

/// Message delivered by the push channel.
///
/// The payload stays opaque until the handler registered for `type`
/// decodes it into its own shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Name of the handler this message is routed to.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Handler-specific payload.
    #[serde(default)]
    pub message: Value,
}

impl Envelope {
    /// Create an envelope from a type name and payload.
    #[must_use]
    pub fn new(message_type: impl Into<String>, message: Value) -> Self {
        Self {
            message_type: message_type.into(),
            message,
        }
    }

    /// Parse an envelope from its JSON wire form.
    ///
    /// # Errors
    /// Returns error if the text is not a JSON object with a string `type`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Typed view of this envelope.
    ///
    /// Returns `Ok(None)` for type names this crate does not know about.
    ///
    /// # Errors
    /// Returns error if the type is known but the payload has the wrong shape.
    pub fn to_typed(&self) -> Result<Option<PushMessage>, serde_json::Error> {
        let typed = match self.message_type.as_str() {
            USER_MESSAGE => PushMessage::UserMessage(NotifyPayload::decode(&self.message)?),
            JS_CODE => PushMessage::JsCode(ExecutePayload::decode(&self.message)?),
            _ => return Ok(None),
        };
        Ok(Some(typed))
    }
}

/// Payload of a `userMessage`: the exact text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifyPayload(pub String);

impl NotifyPayload {
    /// Decode from a raw payload value.
    ///
    /// # Errors
    /// Returns error if the payload is not a string.
    pub fn decode(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// The text to display.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }
}

/// Payload of a `jsCode` message.
///
/// Unknown fields are ignored; only `code` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutePayload {
    /// Instructions executed verbatim in the client's script context.
    pub code: String,
}

impl ExecutePayload {
    /// Create a payload carrying `code`.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Decode from a raw payload value.
    ///
    /// # Errors
    /// Returns error if the payload is not an object with a string `code`.
    pub fn decode(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Statically typed form of the two recognised messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PushMessage {
    /// Show text to the user.
    #[serde(rename = "userMessage")]
    UserMessage(NotifyPayload),
    /// Execute client-side instructions.
    #[serde(rename = "jsCode")]
    JsCode(ExecutePayload),
}

impl From<PushMessage> for Envelope {
    fn from(msg: PushMessage) -> Self {
        match msg {
            PushMessage::UserMessage(payload) => Self::new(USER_MESSAGE, Value::String(payload.0)),
            PushMessage::JsCode(payload) => {
                Self::new(JS_CODE, serde_json::json!({ "code": payload.code }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_user_message() {
        let env = Envelope::from_json(r#"{"type":"userMessage","message":"hello"}"#).unwrap();
        assert_eq!(env.message_type, USER_MESSAGE);
        assert_eq!(
            env.to_typed().unwrap(),
            Some(PushMessage::UserMessage(NotifyPayload("hello".into())))
        );
    }

    #[test]
    fn test_parse_js_code_ignores_extra_fields() {
        let env = Envelope::from_json(
            r#"{"type":"jsCode","message":{"code":"x=1+1","origin":"server"}}"#,
        )
        .unwrap();
        assert_eq!(
            env.to_typed().unwrap(),
            Some(PushMessage::JsCode(ExecutePayload::new("x=1+1")))
        );
    }

    #[test]
    fn test_missing_code_names_field() {
        let err = ExecutePayload::decode(&json!({ "script": "x=1" })).unwrap_err();
        assert!(err.to_string().contains("missing field `code`"));
    }

    #[test]
    fn test_unknown_type_has_no_typed_view() {
        let env = Envelope::new("somethingElse", json!(42));
        assert_eq!(env.to_typed().unwrap(), None);
    }

    #[test]
    fn test_missing_message_defaults_to_null() {
        let env = Envelope::from_json(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(env.message, Value::Null);
    }

    #[test]
    fn test_typed_message_matches_wire_form() {
        let msg = PushMessage::JsCode(ExecutePayload::new("alert(1)"));
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire, json!({ "type": "jsCode", "message": { "code": "alert(1)" } }));

        let env: Envelope = msg.into();
        assert_eq!(serde_json::to_value(&env).unwrap(), wire);
    }
}
