//! # pulse-chat
//!
//! Token-streamed chat over a dedicated per-request channel, with a one-shot
//! HTTP fallback when the stream cannot complete.
//!
//! - [`ChatCoordinator`]: conversation transcript and the send state machine
//! - [`StreamingExchange`]: accumulator for one request/response cycle
//! - [`StreamFrame`]: the inbound frames of the streaming sub-protocol

#![deny(unsafe_code)]

pub mod coordinator;
pub mod errors;
pub mod exchange;
pub mod frame;

pub use coordinator::{
    ChatConfig, ChatCoordinator, ChatEvent, Delivery, RejectReason, SendOutcome,
};
pub use errors::ChatError;
pub use exchange::{ExchangePhase, StreamingExchange};
pub use frame::StreamFrame;
