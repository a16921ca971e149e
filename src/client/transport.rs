//! The seam between the sync engine and a client connection.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use slproxy_proto::Line;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// A connection lines can be written to.
///
/// Socket handling, TLS and framing live behind this trait; the core only
/// writes whole lines.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one line. An error means the line was not delivered.
    async fn send_line(&self, line: &Line) -> Result<(), TransportError>;

    /// Whether writes can currently succeed.
    fn is_connected(&self) -> bool;

    /// Start accepting reads from the peer.
    async fn activate(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Transport that forwards lines into a tokio channel.
///
/// Used to hand lines to a connection task, and by tests to capture output.
pub struct ChannelTransport {
    tx: mpsc::Sender<Line>,
    connected: AtomicBool,
    active: AtomicBool,
}

impl ChannelTransport {
    /// Create a transport and the receiving end of its queue.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Line>) {
        let (tx, rx) = mpsc::channel(capacity);
        let transport = Self {
            tx,
            connected: AtomicBool::new(true),
            active: AtomicBool::new(false),
        };
        (transport, rx)
    }

    /// Mark the transport closed; later writes fail.
    pub fn close(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_line(&self, line: &Line) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        self.tx
            .send(line.clone())
            .await
            .map_err(|_| TransportError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    async fn activate(&self) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        self.active.store(true, Ordering::Release);
        Ok(())
    }
}
