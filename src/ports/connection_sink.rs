//! ConnectionSink port - Outbound delivery to live sockets.
//!
//! Pushes are fire-and-forget. The socket task owning a connection drains
//! its queue, so a slow peer never blocks the caller.

use tokio::sync::mpsc;

use crate::domain::foundation::ConnectionId;

pub trait ConnectionSink: Send + Sync {
    /// Open the outbound queue for a newly accepted socket.
    fn attach(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<String>;

    /// Close a socket's queue. Unknown ids are ignored.
    fn detach(&self, connection: ConnectionId);

    /// Whether the connection still has an open outbound queue.
    fn is_live(&self, connection: ConnectionId) -> bool;

    /// Queue a text frame. Returns false when the connection is gone.
    fn push(&self, connection: ConnectionId, frame: String) -> bool;
}
