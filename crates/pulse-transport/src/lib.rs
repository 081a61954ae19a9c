//! # pulse-transport
//!
//! The long-lived bidirectional channel to the backend.
//!
//! - [`Transport`] opens a [`Channel`]; [`WebSocketTransport`] is the real one
//! - [`ConnectionManager`] keeps a single channel alive with keep-alive pings
//!   and bounded constant-interval reconnects
//! - [`endpoint`] derives `ws(s)://` URLs from the page origin

#![deny(unsafe_code)]

pub mod channel;
pub mod endpoint;
pub mod errors;
pub mod keepalive;
pub mod manager;
pub mod websocket;

pub use channel::{Channel, ChannelPeer, ChannelSender, Transport};
pub use errors::TransportError;
pub use manager::{ConnectionManager, InboundHandler, ManagerConfig};
pub use websocket::WebSocketTransport;
