//! Diagnostic counters shared between the receive thread and its owner.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Live receiver counters. Written by the receive thread, read from anywhere.
#[derive(Debug, Default)]
pub struct TrackerStats {
    datagrams: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    socket_errors: AtomicU64,
    reconnects: AtomicU64,
    stale: AtomicBool,
    failed: AtomicBool,
}

impl TrackerStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_datagram(&self) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_socket_error(&self) {
        self.socket_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the stale flag, returning the previous value.
    pub(crate) fn set_stale(&self, stale: bool) -> bool {
        self.stale.swap(stale, Ordering::AcqRel)
    }

    pub(crate) fn set_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Datagrams read from the socket, valid or not.
    #[must_use]
    pub fn datagrams(&self) -> u64 {
        self.datagrams.load(Ordering::Relaxed)
    }

    /// Packets parsed and published.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Packets discarded by the parser.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Receive and rebind failures.
    #[must_use]
    pub fn socket_errors(&self) -> u64 {
        self.socket_errors.load(Ordering::Relaxed)
    }

    /// Successful rebinds after a fault.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Whether no valid packet has arrived within the silence timeout.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Whether the receive thread gave up after exhausting its retries.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Copy the counters into a plain value.
    #[must_use]
    pub fn snapshot(&self) -> TrackerStatsSnapshot {
        TrackerStatsSnapshot {
            datagrams: self.datagrams(),
            accepted: self.accepted(),
            rejected: self.rejected(),
            socket_errors: self.socket_errors(),
            reconnects: self.reconnects(),
            stale: self.is_stale(),
            failed: self.has_failed(),
        }
    }
}

/// Point-in-time copy of [`TrackerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStatsSnapshot {
    /// Datagrams read from the socket.
    pub datagrams: u64,
    /// Packets parsed and published.
    pub accepted: u64,
    /// Packets discarded by the parser.
    pub rejected: u64,
    /// Receive and rebind failures.
    pub socket_errors: u64,
    /// Successful rebinds.
    pub reconnects: u64,
    /// No recent valid packet.
    pub stale: bool,
    /// Receive thread gave up.
    pub failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = TrackerStats::new();
        assert_eq!(stats.snapshot(), TrackerStatsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let stats = TrackerStats::new();
        stats.record_datagram();
        stats.record_datagram();
        stats.record_accepted();
        stats.record_rejected();
        stats.record_socket_error();
        stats.record_reconnect();

        let snap = stats.snapshot();
        assert_eq!(snap.datagrams, 2);
        assert_eq!(snap.accepted, 1);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.socket_errors, 1);
        assert_eq!(snap.reconnects, 1);
    }

    #[test]
    fn test_stale_swap_reports_transition() {
        let stats = TrackerStats::new();
        assert!(!stats.set_stale(true));
        assert!(stats.set_stale(true));
        assert!(stats.is_stale());
        assert!(stats.set_stale(false));
        assert!(!stats.is_stale());
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = TrackerStats::new();
        stats.record_accepted();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["accepted"], 1);
        assert_eq!(json["stale"], false);
    }
}
