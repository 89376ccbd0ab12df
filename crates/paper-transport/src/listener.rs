//! Per-port UDP listeners
//!
//! Each registered port owns one receive task:
//! - Bound with address reuse so a restart can rebind immediately
//! - Reads one datagram at a time, decodes it and hands it to the handler
//! - Wakes at least once per [`RECEIVE_TIMEOUT`] to re-check cancellation
//!
//! Teardown cancels every task, then waits for each with a bounded join. A
//! task that does not finish in time is aborted, which drops its socket.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use paper_core::{OscFraming, PaperError, PaperResult};
use paper_wire::{decode, OscMessage, MAX_DATAGRAM_SIZE};

/// Longest a receive waits before re-checking cancellation
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest teardown waits for one receive task
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Consumer of decoded messages
///
/// Called on the receive task, in arrival order, for successfully decoded
/// datagrams only.
pub trait OscHandler: Send + Sync + 'static {
    fn handle(&self, message: OscMessage);
}

impl<F> OscHandler for F
where
    F: Fn(OscMessage) + Send + Sync + 'static,
{
    fn handle(&self, message: OscMessage) {
        self(message)
    }
}

/// Lifecycle of one port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Bound,
    Listening,
    ShuttingDown,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListenerState::Idle => "idle",
            ListenerState::Bound => "bound",
            ListenerState::Listening => "listening",
            ListenerState::ShuttingDown => "shutting down",
        };
        f.write_str(s)
    }
}

struct Listener {
    local_addr: SocketAddr,
    state: ListenerState,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// All listeners of one manager, keyed by port
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<u16, Listener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `addr` and start its receive task.
    ///
    /// Must be called from within a Tokio runtime. Returns the bound address,
    /// which differs from `addr` when port 0 was requested.
    pub fn start(
        &mut self,
        addr: SocketAddr,
        framing: OscFraming,
        handler: Arc<dyn OscHandler>,
    ) -> PaperResult<SocketAddr> {
        if addr.port() != 0 && self.listeners.contains_key(&addr.port()) {
            tracing::error!("Listener already registered on port {}", addr.port());
            return Err(PaperError::ListenerExists(addr.port()));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PaperError::TransportError(e.to_string()))?;

        let socket = {
            let _enter = runtime.enter();
            bind_reusable(addr)?
        };
        let local_addr = socket
            .local_addr()
            .map_err(|e| PaperError::TransportError(e.to_string()))?;
        if self.listeners.contains_key(&local_addr.port()) {
            return Err(PaperError::ListenerExists(local_addr.port()));
        }

        let (cancel, cancelled) = watch::channel(false);
        let mut listener = Listener {
            local_addr,
            state: ListenerState::Bound,
            cancel,
            handle: runtime.spawn(receive_loop(socket, cancelled, framing, handler)),
        };
        listener.state = ListenerState::Listening;
        self.listeners.insert(local_addr.port(), listener);

        tracing::info!("Started OSC listener on {}", local_addr);
        Ok(local_addr)
    }

    /// Stop one listener with the same bounded join as [`tear_down`](Self::tear_down)
    pub async fn stop(&mut self, port: u16) -> bool {
        match self.listeners.remove(&port) {
            Some(mut listener) => {
                let _ = listener.cancel.send(true);
                listener.state = ListenerState::ShuttingDown;
                join_bounded(port, listener).await;
                true
            }
            None => false,
        }
    }

    /// Cancel every listener, wait for each, then forget them all
    pub async fn tear_down(&mut self) {
        if self.listeners.is_empty() {
            return;
        }

        for listener in self.listeners.values_mut() {
            let _ = listener.cancel.send(true);
            listener.state = ListenerState::ShuttingDown;
        }

        for (port, listener) in self.listeners.drain() {
            join_bounded(port, listener).await;
        }

        tracing::info!("OSC listeners shut down");
    }

    pub fn state(&self, port: u16) -> ListenerState {
        self.listeners
            .get(&port)
            .map(|l| l.state)
            .unwrap_or(ListenerState::Idle)
    }

    pub fn local_addr(&self, port: u16) -> Option<SocketAddr> {
        self.listeners.get(&port).map(|l| l.local_addr)
    }

    pub fn ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.listeners.keys().copied().collect();
        ports.sort_unstable();
        ports
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("ports", &self.ports())
            .finish()
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        for listener in self.listeners.values() {
            let _ = listener.cancel.send(true);
            listener.handle.abort();
        }
    }
}

async fn join_bounded(port: u16, mut listener: Listener) {
    match tokio::time::timeout(JOIN_TIMEOUT, &mut listener.handle).await {
        Ok(Ok(())) => tracing::debug!("Listener on port {} stopped", port),
        Ok(Err(e)) => tracing::warn!("Listener on port {} ended abnormally: {}", port, e),
        Err(_) => {
            tracing::warn!(
                "Listener on port {} did not stop within {:?}, abandoning it",
                port,
                JOIN_TIMEOUT
            );
            listener.handle.abort();
        }
    }
}

/// Bind a non-blocking UDP socket with address reuse enabled
fn bind_reusable(addr: SocketAddr) -> PaperResult<UdpSocket> {
    let bind_error = |e: io::Error| {
        if e.kind() == io::ErrorKind::AddrInUse {
            tracing::error!("Failed to start OSC listener on {}: address in use", addr);
            PaperError::AddressInUse(addr)
        } else {
            tracing::error!("Failed to start OSC listener on {}: {}", addr, e);
            PaperError::BindFailed {
                addr,
                reason: e.to_string(),
            }
        }
    };

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(bind_error)?;
    socket.set_reuse_address(true).map_err(bind_error)?;
    socket.set_nonblocking(true).map_err(bind_error)?;
    socket.bind(&addr.into()).map_err(bind_error)?;

    UdpSocket::from_std(socket.into()).map_err(bind_error)
}

async fn receive_loop(
    socket: UdpSocket,
    mut cancelled: watch::Receiver<bool>,
    framing: OscFraming,
    handler: Arc<dyn OscHandler>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        if *cancelled.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = cancelled.changed() => {
                // A dropped sender also means stop
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }

            received = tokio::time::timeout(RECEIVE_TIMEOUT, socket.recv_from(&mut buf)) => {
                match received {
                    Err(_) => continue,
                    Ok(Ok((len, from))) => {
                        let message = decode(&buf[..len], framing);
                        if message.success {
                            handler.handle(message);
                        } else {
                            tracing::trace!("Dropped undecodable datagram ({} bytes) from {}", len, from);
                        }
                    }
                    Ok(Err(e)) => {
                        if *cancelled.borrow() {
                            break;
                        }
                        tracing::debug!("UDP receive error: {}", e);
                    }
                }
            }
        }
    }

    tracing::debug!(
        "Receive loop on {} exiting",
        socket
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "?".into())
    );
}
