use super::connection::Connection;
use super::processor::{self, Outcome};
use super::registry::Registry;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::net::{TcpListener, TcpStream};
use crate::protocol::RequestLog;
use crate::reactor::{Event, Interest, Poller};

use std::io;
use std::mem;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

/// Where the loop currently is in its poll/dispatch cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Blocked inside [`Poller::poll`].
    AwaitingEvents,

    /// Draining the batch returned by the last poll.
    Dispatching,
}

/// Counters describing what the loop has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Poll calls that returned at least one event.
    pub batches: u64,

    /// Connections accepted and registered.
    pub accepted: u64,

    /// Events handed to a registered connection.
    pub dispatched: u64,

    /// Events naming a descriptor absent from the registry.
    pub discarded: u64,

    /// Connections torn down, for any reason.
    pub closed: u64,

    /// Failed accept calls, `EAGAIN` and `EINTR` excluded.
    pub accept_errors: u64,
}

/// Single-threaded readiness-driven server.
///
/// The server owns the listener, the poller, the connection registry and
/// the request log. Nothing here is shared with another thread except the
/// shutdown flag, so no locking is involved.
///
/// Every event from a batch is handled to completion before the next one,
/// so a slow connection delays every other connection in the batch.
pub struct Server {
    config: Config,
    listener: TcpListener,
    poller: Poller,
    registry: Registry,
    log: RequestLog,
    events: Vec<Event>,
    state: LoopState,
    stats: LoopStats,
    shutdown: Arc<AtomicBool>,

    /// Consecutive accept failures since the last successful accept.
    accept_failures: u64,
}

impl Server {
    /// Binds the listener, creates the poller and opens the request log.
    ///
    /// # Errors
    ///
    /// Every failure here is fatal: an invalid configuration, a port that
    /// cannot be bound or a readiness queue that cannot be created.
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)
            .map_err(|e| Error::setup("bind listener", e))?;

        let poller =
            Poller::new(config.batch_size).map_err(|e| Error::setup("create poller", e))?;

        poller
            .register(listener.as_raw_fd(), Interest::READABLE)
            .map_err(|e| Error::setup("register listener", e))?;

        let log = match &config.log_path {
            Some(path) => RequestLog::open(path),
            None => RequestLog::disabled(),
        };

        Ok(Self {
            events: Vec::with_capacity(config.batch_size),
            config,
            listener,
            poller,
            registry: Registry::new(),
            log,
            state: LoopState::AwaitingEvents,
            stats: LoopStats::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
            accept_failures: 0,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Descriptor of the listening socket.
    pub fn listener_fd(&self) -> RawFd {
        self.listener.as_raw_fd()
    }

    /// Flag that stops [`run`](Self::run) once set.
    ///
    /// The loop notices the flag after the current poll returns, so the
    /// latency is bounded by the configured poll timeout.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the loop until the shutdown flag is set.
    ///
    /// Only a failing poll call ends the loop early; per-connection
    /// failures are logged and absorbed.
    pub fn run(&mut self) -> Result<()> {
        let addr = self.listener.local_addr().map_err(Error::Io)?;
        info!(
            %addr,
            poll_timeout = ?self.config.poll_timeout,
            batch_size = self.config.batch_size,
            "listening"
        );

        let timeout = self.config.poll_timeout;
        let result = loop {
            if self.shutdown.load(Ordering::Acquire) {
                break Ok(());
            }

            if let Err(e) = self.turn(timeout) {
                break Err(e);
            }
        };

        self.close_all();
        info!(stats = ?self.stats, "event loop stopped");

        result
    }

    /// Performs one poll call and dispatches the resulting batch.
    ///
    /// Returns the number of events in the batch; `0` means the poll timed
    /// out and nothing was dispatched.
    pub fn turn(&mut self, timeout: Duration) -> Result<usize> {
        self.state = LoopState::AwaitingEvents;

        let mut events = mem::take(&mut self.events);
        if let Err(e) = self.poller.poll(&mut events, Some(timeout)) {
            self.events = events;
            return Err(Error::Poll(e));
        }

        let n = events.len();
        if n > 0 {
            self.stats.batches += 1;
            trace!(events = n, "poll returned");
            self.dispatch(&events);
        }

        self.events = events;
        Ok(n)
    }

    /// Dispatches a batch of events, in order.
    ///
    /// Events for the listener accept pending connections; events for a
    /// registered connection run the request processor; anything else is
    /// dropped.
    pub fn dispatch(&mut self, events: &[Event]) {
        self.state = LoopState::Dispatching;

        let listener_fd = self.listener.as_raw_fd();
        for event in events {
            if event.fd == listener_fd {
                self.accept_pending();
            } else {
                self.connection_ready(*event);
            }
        }

        self.state = LoopState::AwaitingEvents;
    }

    /// Accepts connections until the backlog is empty.
    ///
    /// Bounded by the batch size so a connection flood cannot starve
    /// already-registered clients.
    ///
    /// A persistent failure such as `EMFILE` leaves the listener readable,
    /// so it repeats on every poll. Only the first failure of a streak and
    /// then every power of two are logged at `warn`.
    fn accept_pending(&mut self) {
        for _ in 0..self.config.batch_size {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if self.accept_failures > 0 {
                        info!(failures = self.accept_failures, "accept recovered");
                        self.accept_failures = 0;
                    }
                    self.admit(stream, peer);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.stats.accept_errors += 1;
                    self.accept_failures += 1;

                    let error = Error::Accept(e);
                    let failures = self.accept_failures;
                    if should_report(failures) {
                        warn!(%error, failures, "accept failed, continuing");
                    } else {
                        debug!(%error, failures, "accept failed, continuing");
                    }
                    break;
                }
            }
        }
    }

    fn admit(&mut self, stream: TcpStream, peer: SocketAddr) {
        let fd = stream.as_raw_fd();

        if let Err(source) = self.poller.register(fd, Interest::READABLE) {
            let error = Error::Registration { fd, source };
            warn!(%peer, %error, "dropping connection");
            return;
        }

        let connection = Connection::new(stream, peer, self.config.read_buffer_size);
        if self.registry.insert(fd, connection).is_some() {
            warn!(fd, "replaced a stale registry entry");
        }

        self.stats.accepted += 1;
        debug!(%peer, fd, "connection accepted");
    }

    fn connection_ready(&mut self, event: Event) {
        let fd = event.fd;

        let Some(connection) = self.registry.get_mut(fd) else {
            self.stats.discarded += 1;
            trace!(fd, "discarding event for unknown descriptor");
            return;
        };

        self.stats.dispatched += 1;
        let peer = connection.peer;

        let mut result = Ok(Outcome::Open);

        if event.writable && connection.has_pending_output() {
            result = connection
                .flush()
                .map(|_| Outcome::Open)
                .map_err(|source| Error::Write { peer, source });
        }

        if event.readable && matches!(result, Ok(Outcome::Open)) {
            result = processor::process(connection, &mut self.log);
        }

        match result {
            Ok(Outcome::Open) => self.sync_interest(fd),
            Ok(Outcome::Closed) => {
                debug!(%peer, fd, "peer closed connection");
                self.close(fd);
            }
            Err(error) => {
                warn!(%peer, %error, "closing connection");
                self.close(fd);
            }
        }
    }

    /// Watches for writability only while responses are queued.
    fn sync_interest(&mut self, fd: RawFd) {
        let Some(connection) = self.registry.get_mut(fd) else {
            return;
        };

        let wants_write = connection.has_pending_output();
        if wants_write == connection.write_interest {
            return;
        }

        let interest = if wants_write {
            Interest::READ_WRITE
        } else {
            Interest::READABLE
        };

        match self.poller.reregister(fd, interest) {
            Ok(()) => connection.write_interest = wants_write,
            Err(source) => {
                let error = Error::Registration { fd, source };
                warn!(peer = %connection.peer, %error, "closing connection");
                self.close(fd);
            }
        }
    }

    /// Tears a connection down: deregister, forget, close.
    fn close(&mut self, fd: RawFd) {
        if let Err(error) = self.poller.deregister(fd) {
            debug!(fd, %error, "deregister failed");
        }

        // Dropping the connection closes its socket.
        if self.registry.remove(fd).is_some() {
            self.stats.closed += 1;
        }
    }

    fn close_all(&mut self) {
        for fd in self.registry.fds() {
            self.close(fd);
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn should_report(streak: u64) -> bool {
    streak.is_power_of_two()
}
