//! slproxy - Straylight IRC Proxy core.
//!
//! Tracks the state of an upstream IRC network from the lines that pass
//! through the proxy, logs every line so the state can be rebuilt at any
//! earlier point, and brings downstream clients up to date by synthesising
//! the lines a server would have sent them.

pub mod client;
pub mod config;
pub mod error;
pub mod linestack;
pub mod query;
pub mod session;
pub mod state;
pub mod telemetry;

pub use slproxy_proto as proto;
