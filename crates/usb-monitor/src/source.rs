//! Kernel event sources
//!
//! [`NetlinkSource`] listens on the kernel hotplug multicast group and yields
//! raw uevent datagrams. [`ReplaySource`] plays back datagrams pushed through
//! a [`ReplayFeed`], so the monitor loop can run without a kernel socket.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netlink_sys::{protocols::NETLINK_KOBJECT_UEVENT, Socket, SocketAddr};
use tokio::io::unix::AsyncFd;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, trace, warn};

use crate::error::MonitorError;

/// Multicast group the kernel broadcasts uevents on
pub const KERNEL_UEVENT_GROUP: u32 = 1;

/// A blocking source of raw uevent datagrams
pub trait EventSource: Send {
    /// Wait up to `timeout` for one datagram
    ///
    /// Returns `Ok(None)` if nothing arrived in time. Interrupted waits are
    /// retried internally and never reported.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, MonitorError>;

    /// Release the source. Safe to call more than once.
    fn close(&mut self);
}

/// Netlink socket bound to the kernel hotplug group
///
/// The socket is non-blocking and registered with a current-thread tokio
/// runtime, which bounds each wait with a timer.
pub struct NetlinkSource {
    // Declared before `runtime` so it deregisters while the reactor is alive
    socket: Option<AsyncFd<Socket>>,
    runtime: Runtime,
    buffer: Vec<u8>,
}

impl NetlinkSource {
    /// Open a `NETLINK_KOBJECT_UEVENT` socket bound to this process
    pub fn open(buffer_size: usize) -> Result<Self, MonitorError> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(MonitorError::SocketCreate)?;

        let mut socket = Socket::new(NETLINK_KOBJECT_UEVENT).map_err(MonitorError::SocketCreate)?;
        let addr = SocketAddr::new(std::process::id(), KERNEL_UEVENT_GROUP);
        socket.bind(&addr).map_err(MonitorError::SocketBind)?;
        socket
            .set_non_blocking(true)
            .map_err(MonitorError::SocketCreate)?;

        let socket = {
            let _guard = runtime.enter();
            AsyncFd::new(socket).map_err(MonitorError::SocketCreate)?
        };

        debug!(
            "Bound netlink socket (pid {}, group {})",
            addr.port_number(),
            KERNEL_UEVENT_GROUP
        );

        Ok(Self {
            socket: Some(socket),
            runtime,
            buffer: Vec::with_capacity(buffer_size.max(1)),
        })
    }

    /// True until `close()` is called
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}

/// Ignore receive errors that only mean "no data this time"
fn ignore_benign(err: io::Error) -> Result<(), MonitorError> {
    match err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(()),
        _ if err.raw_os_error() == Some(libc::ENOBUFS) => {
            warn!("Kernel dropped uevents: receive buffer overrun");
            Ok(())
        }
        _ => Err(MonitorError::Receive(err)),
    }
}

impl EventSource for NetlinkSource {
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, MonitorError> {
        let socket = self.socket.as_ref().ok_or(MonitorError::Closed)?;
        let buffer = &mut self.buffer;
        buffer.clear();

        let received = self.runtime.block_on(async {
            let mut guard = match tokio::time::timeout(timeout, socket.readable()).await {
                Err(_elapsed) => return Ok(None),
                Ok(Err(err)) => return Err(MonitorError::Receive(err)),
                Ok(Ok(guard)) => guard,
            };

            match guard.try_io(|inner| inner.get_ref().recv_from(buffer, 0)) {
                Ok(Ok((len, sender))) => Ok(Some((len, sender.port_number()))),
                Ok(Err(err)) => ignore_benign(err).map(|()| None),
                // Spurious wakeup; readiness has been cleared
                Err(_would_block) => Ok(None),
            }
        })?;

        let Some((len, sender_pid)) = received else {
            return Ok(None);
        };

        if len == 0 {
            return Ok(None);
        }

        if sender_pid != 0 {
            debug!("Dropping uevent from non-kernel sender (pid {})", sender_pid);
            return Ok(None);
        }

        let len = len.min(self.buffer.len());
        trace!("Received {} byte uevent", len);
        Ok(Some(self.buffer[..len].to_vec()))
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("Closed netlink socket");
        }
    }
}

/// Item queued on a replay feed
#[derive(Debug)]
enum ReplayItem {
    Datagram(Vec<u8>),
    Fail(String),
}

/// Producer side of a [`ReplaySource`]
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    tx: Sender<ReplayItem>,
}

impl ReplayFeed {
    /// Queue a datagram
    pub fn push(&self, datagram: impl Into<Vec<u8>>) {
        let _ = self.tx.send(ReplayItem::Datagram(datagram.into()));
    }

    /// Queue a receive failure
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.tx.send(ReplayItem::Fail(message.into()));
    }
}

/// Event source fed from memory
///
/// Clones share one queue, so a source can be reopened across monitoring
/// sessions while the same feed keeps supplying datagrams.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    rx: Arc<Mutex<Receiver<ReplayItem>>>,
    closed: bool,
}

impl ReplaySource {
    /// Create a connected feed and source
    pub fn channel() -> (ReplayFeed, ReplaySource) {
        let (tx, rx) = mpsc::channel();
        (
            ReplayFeed { tx },
            ReplaySource {
                rx: Arc::new(Mutex::new(rx)),
                closed: false,
            },
        )
    }

    /// Create a source preloaded with datagrams
    pub fn from_datagrams<I, D>(datagrams: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Vec<u8>>,
    {
        let (feed, source) = Self::channel();
        for datagram in datagrams {
            feed.push(datagram);
        }
        source
    }
}

impl EventSource for ReplaySource {
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, MonitorError> {
        if self.closed {
            return Err(MonitorError::Closed);
        }

        let result = {
            let rx = self.rx.lock().map_err(|_| MonitorError::Closed)?;
            rx.recv_timeout(timeout)
        };

        match result {
            Ok(ReplayItem::Datagram(data)) => Ok(Some(data)),
            Ok(ReplayItem::Fail(message)) => Err(MonitorError::Receive(io::Error::other(message))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                // Feed is gone; behave like an idle socket.
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_replay_yields_datagrams_in_order() {
        let mut source = ReplaySource::from_datagrams([b"A=1\0".to_vec(), b"B=2\0".to_vec()]);
        assert_eq!(source.receive(TICK).unwrap(), Some(b"A=1\0".to_vec()));
        assert_eq!(source.receive(TICK).unwrap(), Some(b"B=2\0".to_vec()));
        assert_eq!(source.receive(TICK).unwrap(), None);
    }

    #[test]
    fn test_replay_times_out_when_idle() {
        let (_feed, mut source) = ReplaySource::channel();
        assert_eq!(source.receive(TICK).unwrap(), None);
    }

    #[test]
    fn test_replay_failure() {
        let (feed, mut source) = ReplaySource::channel();
        feed.fail("unplugged");
        assert!(matches!(source.receive(TICK), Err(MonitorError::Receive(_))));
    }

    #[test]
    fn test_replay_close_is_idempotent() {
        let mut source = ReplaySource::from_datagrams([b"A=1\0".to_vec()]);
        source.close();
        source.close();
        assert!(matches!(source.receive(TICK), Err(MonitorError::Closed)));
    }

    #[test]
    fn test_replay_clones_share_queue() {
        let (feed, source) = ReplaySource::channel();
        let mut first = source.clone();
        let mut second = source;

        feed.push(b"A=1\0".to_vec());
        first.close();
        feed.push(b"B=2\0".to_vec());

        assert_eq!(second.receive(TICK).unwrap(), Some(b"A=1\0".to_vec()));
        assert_eq!(second.receive(TICK).unwrap(), Some(b"B=2\0".to_vec()));
    }

    #[test]
    fn test_benign_receive_errors() {
        assert!(ignore_benign(io::Error::from_raw_os_error(libc::ENOBUFS)).is_ok());
        assert!(ignore_benign(io::Error::from(io::ErrorKind::WouldBlock)).is_ok());
        assert!(ignore_benign(io::Error::from(io::ErrorKind::Interrupted)).is_ok());
        assert!(matches!(
            ignore_benign(io::Error::from_raw_os_error(libc::EBADF)),
            Err(MonitorError::Receive(_))
        ));
    }

    #[test]
    #[ignore = "needs a Linux host that permits netlink sockets"]
    fn test_netlink_open_and_close() {
        let mut source = NetlinkSource::open(4096).unwrap();
        assert!(source.is_open());
        assert!(source.receive(TICK).is_ok());
        source.close();
        source.close();
        assert!(!source.is_open());
        assert!(matches!(source.receive(TICK), Err(MonitorError::Closed)));
    }
}
