//! Inbound frames of the streaming chat sub-protocol.
//!
//! ```text
//! {"token": "He"}
//! {"done": true, "user_message_id": 7, "assistant_message_id": 8,
//!  "input_tokens": 12, "output_tokens": 3}
//! {"error": "rate limited"}
//! ```

use serde_json::Value;

/// One decoded stream frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamFrame {
    /// Next fragment of the reply.
    Token(String),
    /// The reply is complete and both messages are stored.
    Done {
        /// Confirmed id of the user's message.
        user_message_id: i64,
        /// Id of the assistant's reply.
        assistant_message_id: i64,
        /// Prompt tokens billed.
        input_tokens: Option<u32>,
        /// Completion tokens billed.
        output_tokens: Option<u32>,
    },
    /// The server declined the request.
    Error(String),
    /// Anything else, including undecodable text.
    Ignored,
}

impl StreamFrame {
    /// Decode a raw text frame. Error wins over done, done over token.
    pub fn parse(raw: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Self::Ignored;
        };
        Self::from_value(&value)
    }

    /// Decode an already-parsed frame.
    pub fn from_value(value: &Value) -> Self {
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Self::Error(error.to_string());
        }
        if value.get("done").and_then(Value::as_bool) == Some(true) {
            let id = |key: &str| value.get(key).and_then(Value::as_i64);
            let count = |key: &str| {
                value
                    .get(key)
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
            };
            if let (Some(user_message_id), Some(assistant_message_id)) =
                (id("user_message_id"), id("assistant_message_id"))
            {
                return Self::Done {
                    user_message_id,
                    assistant_message_id,
                    input_tokens: count("input_tokens"),
                    output_tokens: count("output_tokens"),
                };
            }
            return Self::Ignored;
        }
        if let Some(token) = value.get("token").and_then(Value::as_str) {
            return Self::Token(token.to_string());
        }
        Self::Ignored
    }
}
