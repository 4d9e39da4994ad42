//! The real-time I/O engine.
//!
//! One dedicated thread runs the receive/parse/respond loop. Per
//! iteration it drains at most one datagram, answers it, runs the
//! liveness watchdog, and yields the CPU cooperatively. It busy-polls
//! instead of sleeping: the robot's cadence is at most 4 ms and scheduler
//! wake-up latency after a sleep can eat most of that budget. The
//! non-blocking receive is what lets the watchdog run even when no
//! datagrams arrive.
//!
//! Lock discipline: the per-datagram state update (parse, IPOC imprint,
//! response formatting, peer snapshot) is one critical section; callbacks
//! and the `sendto` happen after it is released.

use crate::clock;
use crate::endpoint::Callbacks;
use crate::protocol::{self, MAX_DATAGRAM_SIZE, RESPONSE_BUFFER_SIZE};
use crate::rt;
use crate::state::SharedState;
use crate::transport::RsiSocket;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Receive buffer aligned to a cache line.
#[repr(align(64))]
struct RecvBuffer([u8; MAX_DATAGRAM_SIZE]);

pub(crate) struct Engine {
    socket: RsiSocket,
    state: SharedState,
    callbacks: Arc<Mutex<Callbacks>>,
    shutdown: Arc<AtomicBool>,
    timeout_ms: u32,
    verbose: bool,
}

impl Engine {
    pub fn new(
        socket: RsiSocket,
        state: SharedState,
        callbacks: Arc<Mutex<Callbacks>>,
        shutdown: Arc<AtomicBool>,
        timeout_ms: u32,
        verbose: bool,
    ) -> Self {
        Self {
            socket,
            state,
            callbacks,
            shutdown,
            timeout_ms,
            verbose,
        }
    }

    /// The hot loop. Runs until the exit flag is raised; the socket closes
    /// when the loop exits and the engine is dropped.
    pub fn run(self) {
        rt::promote_current_thread(self.verbose);
        if self.verbose {
            log::info!("Engine thread started");
        }

        let mut recv_buf = RecvBuffer([0u8; MAX_DATAGRAM_SIZE]);
        let mut response = String::with_capacity(RESPONSE_BUFFER_SIZE);

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.socket.try_recv(&mut recv_buf.0) {
                Ok(Some((len, peer))) => {
                    self.process_datagram(&recv_buf.0[..len], peer, &mut response)
                }
                Ok(None) => {}
                Err(e) => log::debug!("Receive error: {}", e),
            }

            self.check_timeout();

            thread::yield_now();
        }

        if self.verbose {
            log::info!("Engine thread exiting");
        }
    }

    /// Parse one datagram, latch the new state, and answer it.
    fn process_datagram(&self, data: &[u8], peer: SocketAddr, response: &mut String) {
        let start_us = clock::monotonic_us();

        // Robot datagrams are ASCII XML; anything else is malformed.
        let Ok(xml) = std::str::from_utf8(data) else {
            return;
        };

        // No IPOC, no reply: the counter is the proof of freshness the
        // robot requires, and a datagram without one is unanswerable.
        let Some(ipoc) = protocol::extract_ipoc(xml) else {
            return;
        };

        if self.state.lock().mark_connected() {
            log::info!("Robot connected from {}", peer);
            self.invoke_connection_callback(true);
        }

        let (cartesian, joints, fully_parsed, response_ok, target) = {
            let mut state = self.state.lock();

            let parsed_cartesian = protocol::parse_cartesian(xml);
            let parsed_joints = protocol::parse_joints(xml);
            let fully_parsed = parsed_cartesian.is_some() && parsed_joints.is_some();
            if let Some(cartesian) = parsed_cartesian {
                state.cartesian = cartesian;
            }
            if let Some(joints) = parsed_joints {
                state.joints = joints;
            }
            // The counter stamps both records even when a fragment is
            // absent: readers correlate the two snapshots by IPOC alone.
            state.cartesian.ipoc = ipoc.value;
            state.joints.ipoc = ipoc.value;
            state.stats.last_packet_timestamp_us = start_us;
            state.peer = Some(peer);

            let response_ok =
                protocol::format_response(response, &state.correction, ipoc.text).is_ok();

            (
                state.cartesian,
                state.joints,
                fully_parsed,
                response_ok,
                state.peer,
            )
        };

        if fully_parsed {
            let mut callbacks = self.callbacks.lock();
            if let Some(cb) = callbacks.data.as_mut() {
                cb(&cartesian, &joints);
            }
        }

        // Best-effort: a lost reply just means the robot interpolates one
        // cycle, and the next datagram gives us another chance.
        let mut sent = false;
        if response_ok {
            if let Some(target) = target {
                if let Err(e) = self.socket.send_to(response.as_bytes(), target) {
                    log::trace!("Send failed: {}", e);
                }
                sent = true;
            }
        }

        let elapsed_us = clock::monotonic_us() - start_us;
        let late = self.state.lock().record_response(elapsed_us, sent);
        if late && self.verbose {
            log::warn!("Slow response: {:.3} ms", elapsed_us as f64 / 1000.0);
        }
    }

    /// Declare the connection lost when the robot has gone silent.
    fn check_timeout(&self) {
        let now_us = clock::monotonic_us();
        if self.state.lock().watchdog_expired(now_us, self.timeout_ms) {
            if self.verbose {
                log::warn!("Connection timeout after {} ms", self.timeout_ms);
            }
            self.invoke_connection_callback(false);
        }
    }

    fn invoke_connection_callback(&self, connected: bool) {
        let mut callbacks = self.callbacks.lock();
        if let Some(cb) = callbacks.connection.as_mut() {
            cb(connected);
        }
    }
}
