//! Streaming request coordinator.
//!
//! Each send opens its own channel at `/ws/chat/{conversation}`, streams the
//! reply token by token, and falls back once to the HTTP endpoint when the
//! stream cannot complete. An explicit server error is surfaced as-is.
//!
//! ```text
//! opening ──▶ streaming ──done──▶ done
//!    │            │
//!    │         error frame ─────▶ failed
//!    ▼            ▼
//!  transport failure ──▶ fallback ──▶ done | failed
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pulse_api::ChatApi;
use pulse_core::{ChatMessage, ConversationId, MessageId, MessagePair};
use pulse_settings::PulseSettings;
use pulse_transport::{Transport, endpoint};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::errors::ChatError;
use crate::exchange::StreamingExchange;
use crate::frame::StreamFrame;

const EVENT_CAPACITY: usize = 256;

/// Coordinator configuration.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Page origin the chat channel URL is derived from.
    pub origin: String,
    /// Ask the server to use retrieval augmentation.
    pub use_rag: bool,
    /// Silence on the stream after which the exchange falls back.
    pub stream_idle_timeout: Duration,
}

impl ChatConfig {
    /// Config for `origin` with default chat settings.
    pub fn new(origin: impl Into<String>) -> Self {
        let defaults = pulse_settings::ChatSettings::default();
        Self {
            origin: origin.into(),
            use_rag: defaults.use_rag,
            stream_idle_timeout: defaults.stream_idle_timeout(),
        }
    }

    /// Config from loaded settings.
    pub fn from_settings(settings: &PulseSettings) -> Self {
        Self {
            origin: settings.connection.origin.clone(),
            use_rag: settings.chat.use_rag,
            stream_idle_timeout: settings.chat.stream_idle_timeout(),
        }
    }
}

/// Which path produced the reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The streaming channel.
    Stream,
    /// The HTTP fallback.
    Fallback,
}

/// Why a send was not started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Content was empty or whitespace.
    EmptyContent,
    /// No conversation is open.
    NoConversation,
    /// Another exchange is still running.
    InFlight,
}

/// Result of [`ChatCoordinator::send_streaming`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The exchange finished with a confirmed pair.
    Completed {
        /// User message and reply.
        pair: MessagePair,
        /// Path that produced it.
        via: Delivery,
    },
    /// Nothing was sent.
    Rejected(RejectReason),
}

/// Progress of the running exchange, for live rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    /// The provisional user message was added.
    Pending(ChatMessage),
    /// Reply text so far.
    Delta {
        /// Accumulated text.
        text: String,
    },
    /// The exchange finished.
    Completed {
        /// Confirmed user message.
        user: ChatMessage,
        /// Assistant reply.
        assistant: ChatMessage,
        /// Path that produced it.
        via: Delivery,
    },
    /// The exchange ended without a reply.
    Failed {
        /// User-facing error text.
        error: String,
    },
}

struct Conversation {
    id: ConversationId,
    messages: Vec<ChatMessage>,
}

enum StreamEnd {
    Done(MessagePair),
    ServerError(String),
    TransportFailure(String),
}

/// Runs chat exchanges for the open conversation.
pub struct ChatCoordinator {
    config: ChatConfig,
    transport: Arc<dyn Transport>,
    api: Arc<dyn ChatApi>,
    conversation: Mutex<Option<Conversation>>,
    in_flight: AtomicBool,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatCoordinator {
    /// Coordinator using `transport` for streams and `api` for fallback.
    pub fn new(config: ChatConfig, transport: Arc<dyn Transport>, api: Arc<dyn ChatApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            transport,
            api,
            conversation: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            events,
        }
    }

    /// Make `id` the active conversation with its existing transcript.
    pub fn open_conversation(&self, id: ConversationId, history: Vec<ChatMessage>) {
        *self.conversation.lock() = Some(Conversation {
            id,
            messages: history,
        });
        debug!(%id, "conversation opened");
    }

    /// Forget the active conversation.
    pub fn close_conversation(&self) {
        *self.conversation.lock() = None;
    }

    /// The active conversation, if any.
    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.conversation.lock().as_ref().map(|c| c.id)
    }

    /// Snapshot of the active transcript.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation
            .lock()
            .as_ref()
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    /// Whether an exchange is running.
    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Receive progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Send `content` and stream the reply.
    ///
    /// Rejected without side effects if the content is blank, no
    /// conversation is open, or an exchange is already running. Dropping the
    /// returned future abandons the exchange and removes the pending message.
    pub async fn send_streaming(&self, content: &str) -> Result<SendOutcome, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(SendOutcome::Rejected(RejectReason::EmptyContent));
        }
        let Some(conversation) = self.active_conversation() else {
            return Ok(SendOutcome::Rejected(RejectReason::NoConversation));
        };
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SendOutcome::Rejected(RejectReason::InFlight));
        }

        let mut exchange = StreamingExchange::new(conversation, content);
        let mut guard = InFlightGuard {
            coordinator: self,
            conversation,
            provisional: exchange.provisional_id().clone(),
            settled: false,
            released: false,
        };
        self.with_messages(conversation, |messages| {
            messages.push(exchange.provisional().clone());
        });
        self.emit(ChatEvent::Pending(exchange.provisional().clone()));

        let (pair, via) = match self.stream(&mut exchange).await {
            StreamEnd::Done(pair) => (pair, Delivery::Stream),
            StreamEnd::ServerError(message) => {
                warn!(%conversation, error = %message, "server rejected chat request");
                guard.fail(message.clone());
                return Err(ChatError::Server(message));
            }
            StreamEnd::TransportFailure(reason) => {
                exchange.fail();
                info!(%conversation, %reason, "stream failed, falling back to HTTP");
                match self.api.send_message(conversation, content).await {
                    Ok(pair) => (pair, Delivery::Fallback),
                    Err(e) => {
                        let err = ChatError::from(e);
                        warn!(%conversation, error = %err, "chat fallback failed");
                        guard.fail(err.user_message());
                        return Err(err);
                    }
                }
            }
        };

        guard.settle(&pair);
        self.emit(ChatEvent::Completed {
            user: pair.user_message.clone(),
            assistant: pair.assistant_message.clone(),
            via,
        });
        debug!(%conversation, ?via, "exchange completed");
        Ok(SendOutcome::Completed { pair, via })
    }

    /// Run the streaming path. The channel closes when this returns.
    async fn stream(&self, exchange: &mut StreamingExchange) -> StreamEnd {
        let url = match endpoint::chat_channel_url(&self.config.origin, exchange.conversation()) {
            Ok(url) => url,
            Err(e) => return StreamEnd::TransportFailure(e.to_string()),
        };
        let mut channel = match self.transport.open(url.as_str()).await {
            Ok(channel) => channel,
            Err(e) => return StreamEnd::TransportFailure(e.to_string()),
        };
        let request = json!({
            "content": exchange.content(),
            "use_rag": self.config.use_rag,
        });
        if let Err(e) = channel.sender.send_json(&request).await {
            return StreamEnd::TransportFailure(e.to_string());
        }

        loop {
            let raw = match time::timeout(self.config.stream_idle_timeout, channel.receiver.recv())
                .await
            {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    return StreamEnd::TransportFailure("stream closed before completion".into());
                }
                Err(_) => return StreamEnd::TransportFailure("stream went idle".into()),
            };
            match StreamFrame::parse(&raw) {
                StreamFrame::Token(token) => {
                    let text = exchange.push_token(&token).to_string();
                    self.emit(ChatEvent::Delta { text });
                }
                StreamFrame::Done {
                    user_message_id,
                    assistant_message_id,
                    input_tokens,
                    output_tokens,
                } => {
                    return StreamEnd::Done(exchange.finish(
                        user_message_id,
                        assistant_message_id,
                        input_tokens,
                        output_tokens,
                    ));
                }
                StreamFrame::Error(message) => {
                    exchange.fail();
                    return StreamEnd::ServerError(message);
                }
                StreamFrame::Ignored => trace!("ignoring stream frame"),
            }
        }
    }

    fn with_messages(&self, conversation: ConversationId, f: impl FnOnce(&mut Vec<ChatMessage>)) {
        let mut guard = self.conversation.lock();
        if let Some(active) = guard.as_mut().filter(|c| c.id == conversation) {
            f(&mut active.messages);
        }
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }
}

/// Releases the single-flight slot and cleans up the pending message on
/// every exit path, including cancellation.
///
/// Terminal events are emitted only after the transcript and the slot are
/// final, so listeners never observe a stale pending message.
struct InFlightGuard<'a> {
    coordinator: &'a ChatCoordinator,
    conversation: ConversationId,
    provisional: MessageId,
    settled: bool,
    released: bool,
}

impl InFlightGuard<'_> {
    /// Replace the pending message with the confirmed pair.
    fn settle(&mut self, pair: &MessagePair) {
        self.settled = true;
        let provisional = &self.provisional;
        self.coordinator
            .with_messages(self.conversation, |messages| {
                messages.retain(|m| &m.id != provisional);
                messages.push(pair.user_message.clone());
                messages.push(pair.assistant_message.clone());
            });
        self.release();
    }

    /// Drop the pending message, free the slot, then report `error`.
    fn fail(&mut self, error: String) {
        self.settled = true;
        self.discard();
        self.release();
        self.coordinator.emit(ChatEvent::Failed { error });
    }

    fn discard(&self) {
        let provisional = &self.provisional;
        self.coordinator
            .with_messages(self.conversation, |messages| {
                messages.retain(|m| &m.id != provisional);
            });
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.coordinator.in_flight.store(false, Ordering::Release);
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.discard();
        }
        self.release();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use mockall::mock;
    use pulse_api::ApiError;
    use pulse_core::Role;
    use pulse_transport::{Channel, TransportError};

    mock! {
        Api {}

        #[async_trait]
        impl ChatApi for Api {
            async fn send_message(
                &self,
                conversation: ConversationId,
                content: &str,
            ) -> Result<MessagePair, ApiError>;
        }
    }

    #[derive(Clone)]
    enum Script {
        Refuse,
        /// Send these frames after the request, then either close or hang.
        Frames { frames: Vec<&'static str>, close: bool },
    }

    struct ScriptedTransport {
        script: Script,
        opens: AtomicUsize,
        urls: Mutex<Vec<String>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                opens: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
                requests: Arc::new(Mutex::new(Vec::new())),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn open(&self, url: &str) -> Result<Channel, TransportError> {
            let _ = self.opens.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().push(url.to_string());
            let Script::Frames { frames, close } = self.script.clone() else {
                return Err(TransportError::Connect("refused".into()));
            };
            let (channel, mut peer) = Channel::pair(16);
            let requests = Arc::clone(&self.requests);
            let _ = tokio::spawn(async move {
                if let Some(request) = peer.outbound.recv().await {
                    requests.lock().push(request);
                }
                for frame in frames {
                    if peer.inbound.send(frame.to_string()).await.is_err() {
                        return;
                    }
                }
                if !close {
                    while peer.outbound.recv().await.is_some() {}
                }
            });
            Ok(channel)
        }
    }

    const HELLO_FRAMES: [&str; 4] = [
        r#"{"token":"He"}"#,
        r#"{"token":"llo"}"#,
        r#"{"token":"!"}"#,
        r#"{"done":true,"user_message_id":7,"assistant_message_id":8,"input_tokens":5,"output_tokens":3}"#,
    ];

    fn pair(user: i64, assistant: i64, reply: &str) -> MessagePair {
        MessagePair {
            user_message: ChatMessage::confirmed(user, Role::User, "Hello"),
            assistant_message: ChatMessage::confirmed(assistant, Role::Assistant, reply),
        }
    }

    fn coordinator(transport: Arc<ScriptedTransport>, api: MockApi) -> ChatCoordinator {
        let coordinator = ChatCoordinator::new(
            ChatConfig::new("http://localhost:8000"),
            transport,
            Arc::new(api),
        );
        coordinator.open_conversation(ConversationId::new(42), Vec::new());
        coordinator
    }

    fn no_fallback() -> MockApi {
        let mut api = MockApi::new();
        api.expect_send_message().times(0);
        api
    }

    #[tokio::test]
    async fn streams_reply_to_completion() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: HELLO_FRAMES.to_vec(),
            close: false,
        });
        let c = coordinator(Arc::clone(&transport), no_fallback());
        let mut events = c.subscribe();

        let outcome = c.send_streaming("Hello").await.unwrap();
        let SendOutcome::Completed { pair, via } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(via, Delivery::Stream);
        assert_eq!(pair.assistant_message.content, "Hello!");
        assert_eq!(pair.assistant_message.input_tokens, Some(5));

        let messages = c.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, MessageId::Confirmed(7));
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].id, MessageId::Confirmed(8));
        assert_eq!(messages[1].content, "Hello!");
        assert!(messages.iter().all(|m| !m.pending));
        assert!(!c.is_sending());

        assert_matches!(events.recv().await.unwrap(), ChatEvent::Pending(m) if m.pending);
        let deltas: Vec<String> = (0..3)
            .map(|_| match events.try_recv().unwrap() {
                ChatEvent::Delta { text } => text,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(deltas, vec!["He", "Hello", "Hello!"]);
        assert_matches!(
            events.try_recv().unwrap(),
            ChatEvent::Completed { via: Delivery::Stream, .. }
        );
    }

    #[tokio::test]
    async fn sends_request_on_conversation_channel() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: HELLO_FRAMES.to_vec(),
            close: false,
        });
        let c = coordinator(Arc::clone(&transport), no_fallback());
        let _ = c.send_streaming("  Hello \n").await.unwrap();

        assert_eq!(*transport.urls.lock(), vec!["ws://localhost:8000/ws/chat/42"]);
        let request: serde_json::Value =
            serde_json::from_str(&transport.requests.lock()[0]).unwrap();
        assert_eq!(request, json!({"content": "Hello", "use_rag": true}));
    }

    #[tokio::test]
    async fn open_failure_falls_back() {
        let transport = ScriptedTransport::new(Script::Refuse);
        let mut api = MockApi::new();
        api.expect_send_message()
            .times(1)
            .returning(|_, _| Ok(pair(11, 12, "From HTTP")));
        let c = coordinator(transport, api);

        let outcome = c.send_streaming("Hello").await.unwrap();
        assert_matches!(outcome, SendOutcome::Completed { via: Delivery::Fallback, .. });

        let messages = c.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, MessageId::Confirmed(11));
        assert_eq!(messages[1].content, "From HTTP");
        assert!(!messages.iter().any(|m| m.id.is_provisional()));
    }

    #[tokio::test]
    async fn early_close_falls_back() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: vec![r#"{"token":"He"}"#],
            close: true,
        });
        let mut api = MockApi::new();
        api.expect_send_message()
            .times(1)
            .returning(|_, _| Ok(pair(1, 2, "Hello!")));
        let c = coordinator(transport, api);

        let outcome = c.send_streaming("Hello").await.unwrap();
        assert_matches!(outcome, SendOutcome::Completed { via: Delivery::Fallback, .. });
        assert_eq!(c.messages().len(), 2);
    }

    #[tokio::test]
    async fn server_error_does_not_fall_back() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: vec![r#"{"token":"He"}"#, r#"{"error":"rate limited"}"#],
            close: false,
        });
        let c = coordinator(transport, no_fallback());
        let mut events = c.subscribe();

        let err = c.send_streaming("Hello").await.unwrap_err();
        assert_matches!(err, ChatError::Server(ref m) if m == "rate limited");
        assert!(c.messages().is_empty());
        assert!(!c.is_sending());

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(ChatEvent::Failed {
                error: "rate limited".into()
            })
        );
    }

    #[tokio::test]
    async fn failed_fallback_removes_pending_message() {
        let transport = ScriptedTransport::new(Script::Refuse);
        let mut api = MockApi::new();
        api.expect_send_message().times(1).returning(|_, _| {
            Err(ApiError::Status {
                status: 500,
                body: String::new(),
            })
        });
        let c = coordinator(transport, api);
        c.open_conversation(
            ConversationId::new(42),
            vec![ChatMessage::confirmed(1, Role::User, "earlier")],
        );

        let err = c.send_streaming("Hello").await.unwrap_err();
        assert_matches!(err, ChatError::Fallback(ApiError::Status { status: 500, .. }));
        let messages = c.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "earlier");
        assert!(!c.is_sending());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_stream_falls_back() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: vec![r#"{"token":"He"}"#],
            close: false,
        });
        let mut api = MockApi::new();
        api.expect_send_message()
            .times(1)
            .returning(|_, _| Ok(pair(3, 4, "Hello!")));
        let c = coordinator(transport, api);

        let started = time::Instant::now();
        let outcome = c.send_streaming("Hello").await.unwrap();
        assert_matches!(outcome, SendOutcome::Completed { via: Delivery::Fallback, .. });
        assert!(started.elapsed() >= Duration::from_secs(120));
    }

    #[tokio::test]
    async fn rejects_blank_content_and_missing_conversation() {
        let transport = ScriptedTransport::new(Script::Refuse);
        let c = coordinator(Arc::clone(&transport), no_fallback());

        assert_eq!(
            c.send_streaming("   ").await.unwrap(),
            SendOutcome::Rejected(RejectReason::EmptyContent)
        );
        c.close_conversation();
        assert_eq!(
            c.send_streaming("Hello").await.unwrap(),
            SendOutcome::Rejected(RejectReason::NoConversation)
        );
        assert_eq!(transport.opens.load(Ordering::SeqCst), 0);
        assert!(c.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_second_send_while_in_flight() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: Vec::new(),
            close: false,
        });
        let mut api = MockApi::new();
        api.expect_send_message()
            .times(1)
            .returning(|_, _| Ok(pair(1, 2, "late")));
        let c = coordinator(Arc::clone(&transport), api);

        let first = c.send_streaming("Hello");
        let second = async {
            time::sleep(Duration::from_secs(1)).await;
            assert!(c.is_sending());
            assert_eq!(c.messages().len(), 1);
            c.send_streaming("Again").await
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(second.unwrap(), SendOutcome::Rejected(RejectReason::InFlight));
        assert_matches!(first.unwrap(), SendOutcome::Completed { .. });
        assert_eq!(transport.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_reported_after_cleanup() {
        let c = coordinator(ScriptedTransport::new(Script::Refuse), no_fallback());
        let mut events = c.subscribe();
        let pending = ChatMessage::provisional("Hello");
        c.in_flight.store(true, Ordering::Release);
        c.with_messages(ConversationId::new(42), |messages| messages.push(pending.clone()));

        let mut guard = InFlightGuard {
            coordinator: &c,
            conversation: ConversationId::new(42),
            provisional: pending.id.clone(),
            settled: false,
            released: false,
        };
        guard.fail("rate limited".into());

        // guard still alive: the listener's view must already be final
        assert_eq!(
            events.try_recv().unwrap(),
            ChatEvent::Failed {
                error: "rate limited".into()
            }
        );
        assert!(c.messages().is_empty());
        assert!(!c.is_sending());
        drop(guard);
        assert!(!c.is_sending());
    }

    #[tokio::test]
    async fn completion_is_reported_after_transcript_update() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: HELLO_FRAMES.to_vec(),
            close: false,
        });
        let c = Arc::new(coordinator(transport, no_fallback()));
        let mut events = c.subscribe();
        let listener = Arc::clone(&c);
        let observed = tokio::spawn(async move {
            loop {
                if let Ok(ChatEvent::Completed { .. }) = events.recv().await {
                    return (listener.messages().len(), listener.is_sending());
                }
            }
        });

        let _ = c.send_streaming("Hello").await.unwrap();
        assert_eq!(observed.await.unwrap(), (2, false));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_send_releases_guard() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: vec![r#"{"token":"He"}"#],
            close: false,
        });
        let c = coordinator(transport, no_fallback());

        let abandoned = time::timeout(Duration::from_secs(5), c.send_streaming("Hello")).await;
        assert!(abandoned.is_err());
        assert!(!c.is_sending());
        assert!(c.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn switching_conversation_leaves_new_transcript_alone() {
        let transport = ScriptedTransport::new(Script::Frames {
            frames: Vec::new(),
            close: false,
        });
        let mut api = MockApi::new();
        api.expect_send_message()
            .times(1)
            .returning(|_, _| Ok(pair(1, 2, "reply")));
        let c = Arc::new(coordinator(transport, api));

        let mut events = c.subscribe();
        let sender = Arc::clone(&c);
        let task = tokio::spawn(async move { sender.send_streaming("Hello").await });
        assert_matches!(events.recv().await.unwrap(), ChatEvent::Pending(_));
        c.open_conversation(ConversationId::new(99), Vec::new());

        let outcome = task.await.unwrap().unwrap();
        assert_matches!(outcome, SendOutcome::Completed { .. });
        assert!(c.messages().is_empty());
        assert_eq!(c.active_conversation(), Some(ConversationId::new(99)));
    }
}
