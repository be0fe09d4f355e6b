//! Error types for the monitor

use thiserror::Error;

/// Errors that end a monitoring session
///
/// None of these are fatal to the process: the monitor reports them on the
/// log channel, returns to `Stopped`, and can be started again.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Failed to create the netlink socket
    #[error("failed to create netlink socket: {0}")]
    SocketCreate(#[source] std::io::Error),

    /// Failed to bind to the kernel hotplug group
    #[error("failed to bind netlink socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// Waiting for or reading a datagram failed
    #[error("netlink receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// The event source was already closed
    #[error("event source is closed")]
    Closed,

    /// Failed to start the worker thread
    #[error("failed to spawn monitor worker: {0}")]
    Spawn(#[source] std::io::Error),
}
