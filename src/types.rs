//! Robot state value types.
//!
//! Everything here is plain copyable data: accessors hand out snapshots,
//! never references into the shared store.

/// Cartesian pose reported by the robot.
///
/// Positions are millimeters, orientations are degrees, matching the
/// controller's `<RIst>` attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartesianPosition {
    /// X position in mm.
    pub x: f64,
    /// Y position in mm.
    pub y: f64,
    /// Z position in mm.
    pub z: f64,
    /// A rotation in degrees.
    pub a: f64,
    /// B rotation in degrees.
    pub b: f64,
    /// C rotation in degrees.
    pub c: f64,
    /// Host timestamp of the parse, monotonic microseconds.
    pub timestamp_us: u64,
    /// Correlation counter of the datagram this pose came from.
    pub ipoc: u32,
}

/// Joint pose reported by the robot (`<AIPos>` attributes A1..A6).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointPosition {
    /// Joint angles A1..A6 in degrees.
    pub axis: [f64; 6],
    /// Host timestamp of the parse, monotonic microseconds.
    pub timestamp_us: u64,
    /// Correlation counter of the datagram this pose came from.
    pub ipoc: u32,
}

/// Cartesian deltas the robot superimposes on its trajectory.
///
/// The pending correction goes out in every response until it is
/// overwritten; the send path never clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartesianCorrection {
    /// X correction in mm.
    pub x: f64,
    /// Y correction in mm.
    pub y: f64,
    /// Z correction in mm.
    pub z: f64,
    /// A correction in degrees.
    pub a: f64,
    /// B correction in degrees.
    pub b: f64,
    /// C correction in degrees.
    pub c: f64,
}

/// Communication statistics, updated only by the engine thread.
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
    /// Datagrams whose IPOC was extracted and that were processed.
    pub packets_received: u64,
    /// Responses for which a transmit was attempted.
    pub packets_sent: u64,
    /// Rolling mean processing time per datagram.
    pub avg_response_time_ms: f64,
    /// Fastest processing time observed since init.
    pub min_response_time_ms: f64,
    /// Slowest processing time observed since init.
    pub max_response_time_ms: f64,
    /// Responses that exceeded the robot's 4 ms cycle budget.
    pub late_responses: u64,
    /// Watchdog fires since init.
    pub connection_lost_count: u64,
    /// Whether a robot is currently talking to us.
    pub is_connected: bool,
    /// Monotonic timestamp of the last processed datagram.
    pub last_packet_timestamp_us: u64,
}

/// Seed for the minimum response time; the first measured value replaces it.
pub(crate) const MIN_RESPONSE_TIME_SEED_MS: f64 = 9999.0;

impl Default for Statistics {
    fn default() -> Self {
        Self {
            packets_received: 0,
            packets_sent: 0,
            avg_response_time_ms: 0.0,
            min_response_time_ms: MIN_RESPONSE_TIME_SEED_MS,
            max_response_time_ms: 0.0,
            late_responses: 0,
            connection_lost_count: 0,
            is_connected: false,
            last_packet_timestamp_us: 0,
        }
    }
}
