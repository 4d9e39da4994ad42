//! Shared robot state.
//!
//! One critical section guards everything the engine and the application
//! exchange: the latest poses, the pending correction, the statistics
//! aggregate, and the peer address staged for the send path. There is no
//! reader-writer split because every access is a short copy; the engine's
//! per-datagram update happens under a single lock acquisition, so an
//! observer sees either the whole new snapshot or the whole old one for a
//! given IPOC.

use crate::types::{CartesianCorrection, CartesianPosition, JointPosition, Statistics};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;

/// Responses slower than this count as late (the robot's cycle budget).
pub(crate) const LATE_RESPONSE_THRESHOLD_MS: f64 = 4.0;

/// Everything behind the endpoint's single mutex.
#[derive(Debug, Default)]
pub(crate) struct RobotState {
    pub cartesian: CartesianPosition,
    pub joints: JointPosition,
    pub correction: CartesianCorrection,
    pub stats: Statistics,
    /// Source address of the last datagram; responses go back here.
    pub peer: Option<SocketAddr>,
}

pub(crate) type SharedState = Arc<Mutex<RobotState>>;

pub(crate) fn new_shared() -> SharedState {
    Arc::new(Mutex::new(RobotState::default()))
}

impl RobotState {
    /// Record the connection as alive. True on the false→true transition,
    /// which is when the connection callback fires.
    pub fn mark_connected(&mut self) -> bool {
        if self.stats.is_connected {
            false
        } else {
            self.stats.is_connected = true;
            true
        }
    }

    /// Per-response statistics update. Returns true when the response blew
    /// the cycle budget.
    pub fn record_response(&mut self, elapsed_us: u64, sent: bool) -> bool {
        let elapsed_ms = elapsed_us as f64 / 1000.0;

        self.stats.packets_received += 1;
        if sent {
            self.stats.packets_sent += 1;
        }

        let n = self.stats.packets_received as f64;
        self.stats.avg_response_time_ms =
            (self.stats.avg_response_time_ms * (n - 1.0) + elapsed_ms) / n;

        if elapsed_ms < self.stats.min_response_time_ms {
            self.stats.min_response_time_ms = elapsed_ms;
        }
        if elapsed_ms > self.stats.max_response_time_ms {
            self.stats.max_response_time_ms = elapsed_ms;
        }

        let late = elapsed_ms > LATE_RESPONSE_THRESHOLD_MS;
        if late {
            self.stats.late_responses += 1;
        }
        late
    }

    /// Liveness check, run once per engine iteration.
    ///
    /// True when the timeout fired on this call: the connection flag falls
    /// and the loss counter increments exactly once per disconnect. Armed
    /// only while connected, so it cannot re-fire until a datagram
    /// re-establishes the link.
    pub fn watchdog_expired(&mut self, now_us: u64, timeout_ms: u32) -> bool {
        if timeout_ms == 0 || !self.stats.is_connected {
            return false;
        }

        let silent_us = now_us.saturating_sub(self.stats.last_packet_timestamp_us);
        if silent_us > u64::from(timeout_ms) * 1000 {
            self.stats.is_connected = false;
            self.stats.connection_lost_count += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MIN_RESPONSE_TIME_SEED_MS;

    #[test]
    fn test_mark_connected_reports_transition_once() {
        let mut state = RobotState::default();
        assert!(state.mark_connected());
        assert!(!state.mark_connected());
        assert!(state.stats.is_connected);
    }

    #[test]
    fn test_correction_persists_until_overwritten() {
        let mut state = RobotState::default();
        state.correction = CartesianCorrection {
            x: 1.5,
            y: -0.25,
            ..Default::default()
        };
        // The send path only reads the correction; nothing clears it.
        for _ in 0..5 {
            assert_eq!(state.correction.x, 1.5);
            assert_eq!(state.correction.y, -0.25);
        }
    }

    #[test]
    fn test_record_response_counters() {
        let mut state = RobotState::default();
        assert!(!state.record_response(500, true));
        assert_eq!(state.stats.packets_received, 1);
        assert_eq!(state.stats.packets_sent, 1);

        assert!(!state.record_response(1500, false));
        assert_eq!(state.stats.packets_received, 2);
        assert_eq!(state.stats.packets_sent, 1);
        assert_eq!(state.stats.avg_response_time_ms, 1.0);
    }

    #[test]
    fn test_min_seed_replaced_by_first_measurement() {
        let mut state = RobotState::default();
        assert_eq!(state.stats.min_response_time_ms, MIN_RESPONSE_TIME_SEED_MS);
        state.record_response(800, true);
        assert_eq!(state.stats.min_response_time_ms, 0.8);
        state.record_response(2000, true);
        assert_eq!(state.stats.min_response_time_ms, 0.8);
        assert_eq!(state.stats.max_response_time_ms, 2.0);
    }

    #[test]
    fn test_late_response_counted() {
        let mut state = RobotState::default();
        assert!(state.record_response(4500, true));
        assert_eq!(state.stats.late_responses, 1);
        assert!(!state.record_response(3900, true));
        assert_eq!(state.stats.late_responses, 1);
    }

    #[test]
    fn test_watchdog_fires_exactly_once() {
        let mut state = RobotState::default();
        state.mark_connected();
        state.stats.last_packet_timestamp_us = 1_000_000;

        // Still within the window.
        assert!(!state.watchdog_expired(1_050_000, 100));
        // Expired: fires once...
        assert!(state.watchdog_expired(1_200_000, 100));
        assert!(!state.stats.is_connected);
        assert_eq!(state.stats.connection_lost_count, 1);
        // ...and stays quiet until reconnected.
        assert!(!state.watchdog_expired(9_000_000, 100));
        assert_eq!(state.stats.connection_lost_count, 1);
    }

    #[test]
    fn test_watchdog_disabled_by_zero_timeout() {
        let mut state = RobotState::default();
        state.mark_connected();
        state.stats.last_packet_timestamp_us = 0;
        assert!(!state.watchdog_expired(u64::MAX, 0));
        assert!(state.stats.is_connected);
    }

    #[test]
    fn test_watchdog_unarmed_before_first_packet() {
        let mut state = RobotState::default();
        assert!(!state.watchdog_expired(u64::MAX, 100));
        assert_eq!(state.stats.connection_lost_count, 0);
    }
}
