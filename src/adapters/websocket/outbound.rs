//! Outbound queues for live sockets.
//!
//! Each accepted socket gets an unbounded queue whose receiver is drained
//! by that socket's writer task. Any task may push into any queue.

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::domain::foundation::ConnectionId;
use crate::ports::ConnectionSink;

/// Map of connection id to its outbound queue.
#[derive(Debug, Default)]
pub struct OutboundConnections {
    queues: DashMap<ConnectionId, mpsc::UnboundedSender<String>>,
}

impl OutboundConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a queue for a connection. Replaces any previous queue.
    pub fn attach(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.queues.insert(connection, tx);
        rx
    }

    /// Drop a connection's queue. Pending frames are discarded.
    pub fn detach(&self, connection: ConnectionId) {
        self.queues.remove(&connection);
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl ConnectionSink for OutboundConnections {
    fn attach(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<String> {
        OutboundConnections::attach(self, connection)
    }

    fn detach(&self, connection: ConnectionId) {
        OutboundConnections::detach(self, connection)
    }

    fn is_live(&self, connection: ConnectionId) -> bool {
        self.queues
            .get(&connection)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    fn push(&self, connection: ConnectionId, frame: String) -> bool {
        match self.queues.get(&connection) {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }
}
