//! UDP receive loop for eye tracking packets.
//!
//! The receiver owns one socket and one background thread. Each accepted
//! datagram replaces both eye positions in the shared [`EyeState`] in a single
//! publish; anything the parser rejects is counted and dropped.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parallax_core::{parse_packet, EyeState};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::metrics;
use crate::stats::TrackerStats;

const THREAD_NAME: &str = "parallax-tracker";
const WAKE_PAYLOAD: &[u8] = b"<Wake/>";

/// Lifecycle of an [`EyeTrackingReceiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverState {
    /// Created, not yet started.
    Idle,
    /// Socket bound and receive thread running.
    Running,
    /// Stopped. Terminal.
    Stopped,
}

/// Receives eye positions over UDP and publishes them to an [`EyeState`].
///
/// ```no_run
/// use parallax_core::EyeState;
/// use parallax_tracker::{EyeTrackingReceiver, TrackerConfig};
///
/// let eyes = EyeState::new();
/// let mut receiver = EyeTrackingReceiver::new(TrackerConfig::default(), eyes.clone());
/// receiver.start()?;
/// let _pair = eyes.snapshot();
/// receiver.stop();
/// # Ok::<(), parallax_tracker::TrackerError>(())
/// ```
#[derive(Debug)]
pub struct EyeTrackingReceiver {
    config: TrackerConfig,
    eyes: EyeState,
    stats: Arc<TrackerStats>,
    state: ReceiverState,
    local_addr: Option<SocketAddr>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl EyeTrackingReceiver {
    /// Create an idle receiver that will publish into `eyes`.
    #[must_use]
    pub fn new(config: TrackerConfig, eyes: EyeState) -> Self {
        Self {
            config,
            eyes,
            stats: Arc::new(TrackerStats::new()),
            state: ReceiverState::Idle,
            local_addr: None,
            shutdown: None,
            worker: None,
        }
    }

    /// Bind the socket and start the receive thread.
    ///
    /// Returns the address actually bound, which differs from the configured
    /// one when port 0 was requested.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::InvalidState`] unless the receiver is idle
    /// - [`TrackerError::Config`] if the configuration fails validation
    /// - [`TrackerError::Bind`] if the endpoint is unavailable
    /// - [`TrackerError::Socket`] or [`TrackerError::Spawn`] on OS failures
    pub fn start(&mut self) -> TrackerResult<SocketAddr> {
        if self.state != ReceiverState::Idle {
            return Err(TrackerError::InvalidState {
                expected: ReceiverState::Idle,
                actual: self.state,
            });
        }
        self.config.validate()?;

        let socket = UdpSocket::bind(self.config.bind_addr).map_err(|source| TrackerError::Bind {
            addr: self.config.bind_addr,
            source,
        })?;
        socket
            .set_read_timeout(Some(self.config.read_timeout()))
            .map_err(TrackerError::Socket)?;
        let local_addr = socket.local_addr().map_err(TrackerError::Socket)?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let worker = Worker {
            socket: Some(socket),
            addr: local_addr,
            config: self.config.clone(),
            eyes: self.eyes.clone(),
            stats: Arc::clone(&self.stats),
            shutdown: shutdown_rx,
            last_valid: Instant::now(),
        };

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .map_err(TrackerError::Spawn)?;

        self.local_addr = Some(local_addr);
        self.shutdown = Some(shutdown_tx);
        self.worker = Some(handle);
        self.state = ReceiverState::Running;

        info!(addr = %local_addr, "Eye tracking receiver started");
        Ok(local_addr)
    }

    /// Stop the receive thread and release the socket.
    ///
    /// Idempotent. A receiver stopped before it was started goes straight to
    /// [`ReceiverState::Stopped`].
    pub fn stop(&mut self) {
        match self.state {
            ReceiverState::Stopped => return,
            ReceiverState::Idle => {
                self.state = ReceiverState::Stopped;
                return;
            }
            ReceiverState::Running => {}
        }

        // Dropping the sender closes the channel the worker polls.
        drop(self.shutdown.take());

        if let Some(addr) = self.local_addr {
            if let Err(e) = send_wake(addr) {
                debug!(error = %e, "Wake datagram not sent; worker exits on read timeout");
            }
        }

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Eye tracking receive thread panicked");
            }
        }

        self.state = ReceiverState::Stopped;
        info!("Eye tracking receiver stopped");
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ReceiverState {
        self.state
    }

    /// Address the socket is bound to, once started.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Live counters.
    #[must_use]
    pub fn stats(&self) -> &TrackerStats {
        &self.stats
    }

    /// Shared handle to the live counters.
    #[must_use]
    pub fn stats_handle(&self) -> Arc<TrackerStats> {
        Arc::clone(&self.stats)
    }

    /// The eye state this receiver publishes to.
    #[must_use]
    pub const fn eye_state(&self) -> &EyeState {
        &self.eyes
    }

    /// Receiver configuration.
    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

impl Drop for EyeTrackingReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Where to send the wake datagram for a socket bound to `addr`.
fn wake_target(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

fn send_wake(addr: SocketAddr) -> io::Result<()> {
    let target = wake_target(addr);
    let local: SocketAddr = match target {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local)?;
    socket.send_to(WAKE_PAYLOAD, target)?;
    Ok(())
}

/// Receive errors that leave the socket usable: read timeouts and signals.
fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

fn bind_socket(addr: SocketAddr, read_timeout: Duration) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(addr)?;
    socket.set_read_timeout(Some(read_timeout))?;
    Ok(socket)
}

/// State owned by the receive thread.
struct Worker {
    socket: Option<UdpSocket>,
    addr: SocketAddr,
    config: TrackerConfig,
    eyes: EyeState,
    stats: Arc<TrackerStats>,
    shutdown: Receiver<()>,
    last_valid: Instant,
}

impl Worker {
    fn run(mut self) {
        let mut buf = vec![0u8; self.config.buffer_size];
        debug!(addr = %self.addr, buffer = buf.len(), "Receive loop running");

        loop {
            if self.shutdown_requested() {
                break;
            }

            let Some(socket) = self.socket.as_ref() else {
                if self.rebind() {
                    continue;
                }
                break;
            };

            match socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    // The wake datagram lands here too.
                    if self.shutdown_requested() {
                        break;
                    }
                    self.stats.record_datagram();
                    if self.handle_datagram(&buf[..len], from) {
                        if let Some(delay) = self.config.packet_delay() {
                            if self.wait(delay) {
                                break;
                            }
                        }
                    }
                }
                Err(e) if is_transient(e.kind()) => {}
                Err(e) => {
                    if self.shutdown_requested() {
                        break;
                    }
                    warn!(addr = %self.addr, error = %e, "Eye tracking socket error, rebinding");
                    self.stats.record_socket_error();
                    metrics::record_socket_error();
                    self.socket = None;
                }
            }

            self.check_silence();
        }

        debug!(addr = %self.addr, "Receive loop exited");
    }

    /// Parse and publish one datagram. Returns whether it was accepted.
    fn handle_datagram(&mut self, bytes: &[u8], from: SocketAddr) -> bool {
        match parse_packet(bytes) {
            Ok(packet) => {
                let sequence = self.eyes.publish(packet.left, packet.right);
                self.last_valid = Instant::now();
                self.stats.record_accepted();
                metrics::record_packet_accepted();
                debug!(
                    sequence,
                    left = %packet.left,
                    right = %packet.right,
                    %from,
                    "Eye positions updated"
                );

                if self.stats.set_stale(false) {
                    info!("Eye tracker data resumed");
                    metrics::set_tracker_stale(false);
                }
                true
            }
            Err(e) => {
                self.stats.record_rejected();
                metrics::record_packet_rejected(e.reason());
                warn!(
                    %from,
                    len = bytes.len(),
                    reason = e.reason(),
                    error = %e,
                    "Rejected eye tracking packet"
                );
                false
            }
        }
    }

    fn check_silence(&self) {
        let silent_for = self.last_valid.elapsed();
        if silent_for >= self.config.silence_timeout() && !self.stats.set_stale(true) {
            warn!(
                silent_ms = u64::try_from(silent_for.as_millis()).unwrap_or(u64::MAX),
                "No eye tracking data received, keeping last known positions"
            );
            metrics::set_tracker_stale(true);
        }
    }

    /// Rebind after a socket fault. Returns `false` if the worker should exit.
    fn rebind(&mut self) -> bool {
        let retry = self.config.retry.clone();
        let mut attempt = 0u32;

        loop {
            if !retry.allows(attempt) {
                error!(addr = %self.addr, attempts = attempt, "Giving up on eye tracking socket");
                self.stats.set_failed();
                return false;
            }

            let delay = retry.delay_for_attempt(attempt);
            debug!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "Rebinding");
            if self.wait(delay) {
                return false;
            }

            match bind_socket(self.addr, self.config.read_timeout()) {
                Ok(socket) => {
                    self.socket = Some(socket);
                    self.stats.record_reconnect();
                    metrics::record_reconnect();
                    info!(addr = %self.addr, attempt, "Eye tracking socket rebound");
                    return true;
                }
                Err(e) => {
                    warn!(addr = %self.addr, attempt, error = %e, "Rebind failed");
                    self.stats.record_socket_error();
                    metrics::record_socket_error();
                    attempt = attempt.saturating_add(1);
                }
            }

            self.check_silence();
        }
    }

    fn shutdown_requested(&self) -> bool {
        matches!(self.shutdown.try_recv(), Ok(()) | Err(TryRecvError::Disconnected))
    }

    /// Sleep for `delay` unless shutdown arrives first. Returns `true` on shutdown.
    fn wait(&self, delay: Duration) -> bool {
        match self.shutdown.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;

    fn loopback_config() -> TrackerConfig {
        TrackerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            read_timeout_ms: 20,
            ..TrackerConfig::default()
        }
    }

    fn test_worker(retry: RetryConfig) -> (Worker, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let config = TrackerConfig {
            retry,
            ..loopback_config()
        };
        let worker = Worker {
            socket: None,
            addr: "127.0.0.1:0".parse().unwrap(),
            config,
            eyes: EyeState::new(),
            stats: Arc::new(TrackerStats::new()),
            shutdown: rx,
            last_valid: Instant::now(),
        };
        (worker, tx)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[test]
    fn test_new_receiver_is_idle() {
        let receiver = EyeTrackingReceiver::new(loopback_config(), EyeState::new());
        assert_eq!(receiver.state(), ReceiverState::Idle);
        assert!(receiver.local_addr().is_none());
    }

    #[test]
    fn test_stop_before_start_is_terminal() {
        let mut receiver = EyeTrackingReceiver::new(loopback_config(), EyeState::new());
        receiver.stop();
        assert_eq!(receiver.state(), ReceiverState::Stopped);

        let err = receiver.start().unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidState {
                expected: ReceiverState::Idle,
                actual: ReceiverState::Stopped
            }
        ));
    }

    #[test]
    fn test_start_reports_bound_port() {
        let mut receiver = EyeTrackingReceiver::new(loopback_config(), EyeState::new());
        let addr = receiver.start().unwrap();

        assert_ne!(addr.port(), 0);
        assert_eq!(receiver.local_addr(), Some(addr));
        assert_eq!(receiver.state(), ReceiverState::Running);

        receiver.stop();
        receiver.stop();
        assert_eq!(receiver.state(), ReceiverState::Stopped);
    }

    #[test]
    fn test_invalid_config_is_rejected_at_start() {
        let config = TrackerConfig {
            buffer_size: 0,
            ..loopback_config()
        };
        let mut receiver = EyeTrackingReceiver::new(config, EyeState::new());

        assert!(matches!(receiver.start(), Err(TrackerError::Config(_))));
        assert_eq!(receiver.state(), ReceiverState::Idle);
    }

    // ========================================================================
    // Receive errors
    // ========================================================================

    #[test]
    fn test_timeouts_and_signals_keep_the_socket() {
        assert!(is_transient(io::ErrorKind::WouldBlock));
        assert!(is_transient(io::ErrorKind::TimedOut));
        assert!(is_transient(io::ErrorKind::Interrupted));

        assert!(!is_transient(io::ErrorKind::ConnectionReset));
        assert!(!is_transient(io::ErrorKind::Other));
    }

    // ========================================================================
    // Wake target
    // ========================================================================

    #[test]
    fn test_wake_target_maps_unspecified_to_loopback() {
        let v4: SocketAddr = "0.0.0.0:6768".parse().unwrap();
        assert_eq!(wake_target(v4), "127.0.0.1:6768".parse().unwrap());

        let v6: SocketAddr = "[::]:6768".parse().unwrap();
        assert_eq!(wake_target(v6), "[::1]:6768".parse().unwrap());

        let concrete: SocketAddr = "192.168.1.5:6768".parse().unwrap();
        assert_eq!(wake_target(concrete), concrete);
    }

    // ========================================================================
    // Worker internals
    // ========================================================================

    #[test]
    fn test_wait_returns_on_closed_channel() {
        let (worker, tx) = test_worker(RetryConfig::default());
        drop(tx);

        let started = Instant::now();
        assert!(worker.wait(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_times_out_while_running() {
        let (worker, _tx) = test_worker(RetryConfig::default());
        assert!(!worker.wait(Duration::from_millis(5)));
        assert!(!worker.shutdown_requested());
    }

    #[test]
    fn test_handle_datagram_publishes_and_rejects() {
        let (mut worker, _tx) = test_worker(RetryConfig::default());
        let from: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        assert!(worker.handle_datagram(
            b"<PositionLeft>30,0,1600</PositionLeft><PositionRight>-30,0,1600</PositionRight>",
            from
        ));
        assert_eq!(worker.eyes.sequence(), 1);

        assert!(!worker.handle_datagram(b"<PositionLeft>1,2,3</PositionLeft>", from));
        assert_eq!(worker.eyes.sequence(), 1);
        assert_eq!(worker.stats.accepted(), 1);
        assert_eq!(worker.stats.rejected(), 1);
    }

    #[test]
    fn test_check_silence_flags_stale_once() {
        let (mut worker, _tx) = test_worker(RetryConfig::default());
        worker.config.silence_timeout_ms = 1;
        worker.last_valid = Instant::now().checked_sub(Duration::from_millis(50)).unwrap();

        worker.check_silence();
        assert!(worker.stats.is_stale());
        worker.check_silence();
        assert!(worker.stats.is_stale());
    }

    #[test]
    fn test_rebind_gives_up_after_max_attempts() {
        // Occupy a port so every rebind attempt fails.
        let blocker = UdpSocket::bind("127.0.0.1:0").unwrap();
        let (mut worker, _tx) = test_worker(RetryConfig::new(Some(2), 1, 2, 2.0));
        worker.addr = blocker.local_addr().unwrap();

        assert!(!worker.rebind());
        assert!(worker.stats.has_failed());
        assert_eq!(worker.stats.socket_errors(), 2);
        assert!(worker.socket.is_none());
    }

    #[test]
    fn test_rebind_succeeds_on_free_address() {
        let (mut worker, _tx) = test_worker(RetryConfig::new(Some(3), 1, 2, 2.0));

        assert!(worker.rebind());
        assert!(worker.socket.is_some());
        assert_eq!(worker.stats.reconnects(), 1);
    }
}
