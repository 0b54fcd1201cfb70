//! Ably Rust SDK Core Library
//! 
//! This crate provides the core functionality for the Ably Rust SDK,
//! including REST and Realtime clients, authentication, and transport layers.

pub mod auth;
pub mod channel;
pub mod client;
pub mod error;
pub mod http;
pub mod logging;
pub mod protocol;
pub mod retry;
pub mod room;
pub mod transport;

pub fn version() -> &'static str {
    "0.1.0"
}
