//! One request/response cycle.

use pulse_core::{ChatMessage, ConversationId, MessageId, MessagePair, Role};

/// Where an exchange is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Request sent, nothing received yet.
    Pending,
    /// Fragments arriving.
    Streaming,
    /// Finalized with a confirmed pair.
    Done,
    /// Ended without a reply from the stream.
    Errored,
}

/// Accumulator for one streamed reply.
///
/// The text only ever grows until [`finish`](Self::finish) consumes the
/// exchange.
#[derive(Debug)]
pub struct StreamingExchange {
    conversation: ConversationId,
    content: String,
    provisional: ChatMessage,
    accumulated: String,
    phase: ExchangePhase,
}

impl StreamingExchange {
    /// Start an exchange for `content` in `conversation`.
    pub fn new(conversation: ConversationId, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            conversation,
            provisional: ChatMessage::provisional(content.clone()),
            content,
            accumulated: String::new(),
            phase: ExchangePhase::Pending,
        }
    }

    /// Conversation the request belongs to.
    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    /// The user's text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The pending user message shown until confirmation.
    pub fn provisional(&self) -> &ChatMessage {
        &self.provisional
    }

    /// Id of the pending user message.
    pub fn provisional_id(&self) -> &MessageId {
        &self.provisional.id
    }

    /// Reply text so far.
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// Current phase.
    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// Append a fragment and return the text so far.
    pub fn push_token(&mut self, token: &str) -> &str {
        self.accumulated.push_str(token);
        self.phase = ExchangePhase::Streaming;
        &self.accumulated
    }

    /// Record that the stream ended without a reply.
    pub fn fail(&mut self) {
        self.phase = ExchangePhase::Errored;
    }

    /// Build the confirmed pair from the server ids and the accumulated text.
    pub fn finish(
        &mut self,
        user_message_id: i64,
        assistant_message_id: i64,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
    ) -> MessagePair {
        self.phase = ExchangePhase::Done;
        let assistant = ChatMessage::confirmed(
            assistant_message_id,
            Role::Assistant,
            std::mem::take(&mut self.accumulated),
        )
        .with_usage(input_tokens, output_tokens);
        MessagePair {
            user_message: ChatMessage::confirmed(user_message_id, Role::User, self.content.clone()),
            assistant_message: assistant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_tokens() {
        let mut exchange = StreamingExchange::new(ConversationId::new(1), "Hello");
        assert_eq!(exchange.phase(), ExchangePhase::Pending);
        assert!(exchange.provisional().pending);
        assert!(exchange.provisional_id().is_provisional());

        assert_eq!(exchange.push_token("He"), "He");
        assert_eq!(exchange.push_token("llo"), "Hello");
        assert_eq!(exchange.push_token("!"), "Hello!");
        assert_eq!(exchange.phase(), ExchangePhase::Streaming);
    }

    #[test]
    fn finish_builds_confirmed_pair() {
        let mut exchange = StreamingExchange::new(ConversationId::new(1), "Hello");
        let _ = exchange.push_token("Hi there");
        let pair = exchange.finish(7, 8, Some(10), Some(2));

        assert_eq!(exchange.phase(), ExchangePhase::Done);
        assert_eq!(pair.user_message.id, MessageId::Confirmed(7));
        assert_eq!(pair.user_message.content, "Hello");
        assert!(!pair.user_message.pending);
        assert_eq!(pair.assistant_message.id, MessageId::Confirmed(8));
        assert_eq!(pair.assistant_message.role, Role::Assistant);
        assert_eq!(pair.assistant_message.content, "Hi there");
        assert_eq!(pair.assistant_message.input_tokens, Some(10));
        assert_eq!(pair.assistant_message.output_tokens, Some(2));
        assert_eq!(pair.user_message.input_tokens, None);
        assert_eq!(exchange.text(), "");
    }

    #[test]
    fn finish_without_usage_leaves_tokens_unset() {
        let mut exchange = StreamingExchange::new(ConversationId::new(1), "Hello");
        let pair = exchange.finish(7, 8, None, Some(4));
        assert_eq!(pair.assistant_message.input_tokens, None);
        assert_eq!(pair.assistant_message.output_tokens, Some(4));
        assert_eq!(pair.assistant_message.content, "");
    }
}
