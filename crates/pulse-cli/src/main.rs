//! # pulse-cli
//!
//! Terminal client for the Pulse real-time layer.
//!
//! `pulse listen` prints routed server events as JSON lines on stdout and
//! notifications as toasts on stderr. `pulse chat` sends one message to a
//! conversation and streams the reply.

#![deny(unsafe_code)]

mod terminal;

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pulse_api::RestClient;
use pulse_chat::{ChatConfig, ChatCoordinator, ChatEvent, Delivery, SendOutcome};
use pulse_core::{ClientMessage, ConnectionStatus, ConversationId, EventKind, ServerEvent};
use pulse_events::{RealtimeHub, Subscription};
use pulse_settings::PulseSettings;
use pulse_transport::{Transport, WebSocketTransport};
use tokio::sync::broadcast;

use crate::terminal::{NoDesktop, TerminalToasts};

#[derive(Parser, Debug)]
#[command(name = "pulse", about = "Pulse real-time client")]
struct Cli {
    /// Server origin, e.g. `https://workflows.example.com`.
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Settings file. Defaults to `~/.pulse/settings.json` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overridden by `RUST_LOG`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print server events until interrupted.
    Listen {
        /// Only print events of this kind. Repeatable; all kinds if omitted.
        #[arg(long = "kind")]
        kinds: Vec<String>,

        /// Server channel to subscribe to after each connect. Repeatable.
        #[arg(long = "channel")]
        channels: Vec<String>,
    },
    /// Send a chat message and stream the reply.
    Chat {
        /// Conversation to post to.
        #[arg(long)]
        conversation: i64,

        /// Disable retrieval augmentation for this message.
        #[arg(long)]
        no_rag: bool,

        /// Message text.
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    pulse_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    match cli.command {
        Command::Listen { kinds, channels } => listen(&settings, kinds, channels).await,
        Command::Chat {
            conversation,
            no_rag,
            text,
        } => chat(&settings, ConversationId::new(conversation), !no_rag, &text).await,
    }
}

fn resolve_settings(cli: &Cli) -> Result<PulseSettings> {
    let mut settings = match &cli.config {
        Some(path) => pulse_settings::load_required_settings(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => pulse_settings::load_settings().context("Failed to load settings")?,
    };
    if let Some(origin) = &cli.origin {
        settings.connection.origin.clone_from(origin);
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level.clone_from(level);
    }
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn rest_client(settings: &PulseSettings) -> Result<Arc<RestClient>> {
    let client = RestClient::new(&settings.connection.origin, settings.chat.request_timeout())
        .context("Failed to build REST client")?;
    Ok(Arc::new(client))
}

fn transport(settings: &PulseSettings) -> Arc<dyn Transport> {
    Arc::new(WebSocketTransport::new(settings.connection.channel_capacity))
}

// ─────────────────────────────────────────────────────────────────────────────
// listen
// ─────────────────────────────────────────────────────────────────────────────

fn print_event(event: &ServerEvent) {
    match serde_json::to_string(event) {
        Ok(line) => {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{line}");
        }
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    }
}

async fn listen(settings: &PulseSettings, kinds: Vec<String>, channels: Vec<String>) -> Result<()> {
    let hub = RealtimeHub::new(
        settings,
        transport(settings),
        rest_client(settings)?,
        Arc::new(TerminalToasts),
        Arc::new(NoDesktop),
    )
    .context("Failed to set up realtime hub")?;

    let subscriptions: Vec<Subscription> = if kinds.is_empty() {
        vec![hub.router().subscribe_all(print_event)]
    } else {
        kinds
            .into_iter()
            .map(|kind| hub.subscribe(EventKind::from(kind.as_str()), print_event))
            .collect()
    };

    let interrupted = async {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")
    };
    let result = run_listener(&hub, &channels, interrupted).await;

    for subscription in &subscriptions {
        subscription.unsubscribe();
    }
    hub.shutdown();
    result
}

/// Start `hub` and follow its status until `shutdown` resolves or the
/// manager gives up. Channel subscriptions are re-sent on every connect.
async fn run_listener(
    hub: &RealtimeHub,
    channels: &[String],
    shutdown: impl Future<Output = Result<()>>,
) -> Result<()> {
    // watch before starting so the first Connected is not missed
    let mut status = hub.watch_status();
    hub.start().await;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                tracing::info!("Shutting down...");
                return Ok(());
            }
            changed = status.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = *status.borrow_and_update();
                tracing::info!(status = %current, "connection status");
                match current {
                    ConnectionStatus::Connected => {
                        for channel in channels {
                            let message = ClientMessage::Subscribe { channel: channel.clone() };
                            if !hub.send(&message) {
                                tracing::warn!(channel, "subscribe not sent");
                            }
                        }
                    }
                    ConnectionStatus::Failed => {
                        bail!("Gave up connecting to {}", hub.manager().url());
                    }
                    _ => {}
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// chat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks the reply text already written to the terminal.
#[derive(Default)]
struct DeltaPrinter {
    shown: String,
}

impl DeltaPrinter {
    /// What to write so the terminal shows `text`.
    fn tail(&mut self, text: &str) -> String {
        let tail = text.strip_prefix(self.shown.as_str()).unwrap_or(text).to_owned();
        self.shown = text.to_owned();
        tail
    }

    /// What to write for a reply that arrived over HTTP after a partial
    /// stream. Repeats nothing already shown; a diverging reply starts on a
    /// fresh line.
    fn fallback(&self, reply: &str) -> String {
        match reply.strip_prefix(self.shown.as_str()) {
            Some(rest) => rest.to_owned(),
            None => format!("\n{reply}"),
        }
    }
}

async fn print_chat_events(mut events: broadcast::Receiver<ChatEvent>) -> DeltaPrinter {
    let mut printer = DeltaPrinter::default();
    loop {
        match events.recv().await {
            Ok(ChatEvent::Delta { text }) => {
                let mut out = std::io::stdout().lock();
                let _ = write!(out, "{}", printer.tail(&text));
                let _ = out.flush();
            }
            Ok(ChatEvent::Completed { .. } | ChatEvent::Failed { .. })
            | Err(broadcast::error::RecvError::Closed) => break,
            Ok(ChatEvent::Pending(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "chat printer lagged");
            }
        }
    }
    printer
}

async fn chat(
    settings: &PulseSettings,
    conversation: ConversationId,
    use_rag: bool,
    text: &str,
) -> Result<()> {
    let mut config = ChatConfig::from_settings(settings);
    config.use_rag = config.use_rag && use_rag;
    let coordinator = ChatCoordinator::new(config, transport(settings), rest_client(settings)?);
    coordinator.open_conversation(conversation, Vec::new());

    let printer = tokio::spawn(print_chat_events(coordinator.subscribe()));
    let outcome = coordinator.send_streaming(text).await;
    // closes the event channel so the printer drains and exits
    drop(coordinator);
    let printer = printer.await.unwrap_or_default();

    match outcome {
        Ok(SendOutcome::Completed { pair, via }) => {
            let mut out = std::io::stdout().lock();
            if via == Delivery::Fallback {
                let _ = write!(out, "{}", printer.fallback(&pair.assistant_message.content));
            }
            let _ = writeln!(out);
            tracing::debug!(?via, user = %pair.user_message.id, "chat exchange completed");
            Ok(())
        }
        Ok(SendOutcome::Rejected(reason)) => bail!("Message not sent: {reason:?}"),
        Err(e) => bail!("Chat failed: {}", e.user_message()),
    }
}
