//! Metrics emitted by the receive thread.
//!
//! These go through the `metrics` facade and are no-ops until the host
//! installs a recorder.

use metrics::{counter, gauge};

const PACKETS_ACCEPTED_TOTAL: &str = "parallax_packets_accepted_total";
const PACKETS_REJECTED_TOTAL: &str = "parallax_packets_rejected_total";
const SOCKET_ERRORS_TOTAL: &str = "parallax_socket_errors_total";
const RECONNECTS_TOTAL: &str = "parallax_reconnects_total";
const TRACKER_STALE: &str = "parallax_tracker_stale";

/// Record an accepted packet.
pub fn record_packet_accepted() {
    counter!(PACKETS_ACCEPTED_TOTAL).increment(1);
}

/// Record a rejected packet.
///
/// # Arguments
///
/// * `reason` - Short label from `ProtocolError::reason`
pub fn record_packet_rejected(reason: &'static str) {
    counter!(PACKETS_REJECTED_TOTAL, "reason" => reason).increment(1);
}

/// Record a receive or rebind failure.
pub fn record_socket_error() {
    counter!(SOCKET_ERRORS_TOTAL).increment(1);
}

/// Record a successful rebind.
pub fn record_reconnect() {
    counter!(RECONNECTS_TOTAL).increment(1);
}

/// Set the stale gauge (1 = no recent packets, 0 = tracking).
pub fn set_tracker_stale(stale: bool) {
    gauge!(TRACKER_STALE).set(if stale { 1.0 } else { 0.0 });
}
