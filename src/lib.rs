//! rsi-io - host-side endpoint for the KUKA Robot Sensor Interface (RSI).
//!
//! The robot controller sends a UDP datagram every control cycle
//! (nominally 4 ms) carrying its Cartesian pose, joint angles, and an
//! IPOC correlation counter; the host must answer with a Cartesian
//! correction echoing that counter before the next cycle begins, or the
//! robot decelerates and aborts motion. This crate runs that exchange on
//! a dedicated high-priority thread and exposes the latest robot state,
//! the pending correction, and timing statistics to the application.
//!
//! # Quick Start
//!
//! ```no_run
//! use rsi_io as rsi;
//! use rsi_io::CartesianCorrection;
//!
//! fn main() -> rsi_io::Result<()> {
//!     rsi::init(None)?; // defaults: 0.0.0.0:59152, 1 s watchdog
//!     rsi::set_callbacks(
//!         None,
//!         Some(Box::new(|connected| {
//!             println!("robot {}", if connected { "online" } else { "lost" });
//!         })),
//!     )?;
//!     rsi::start()?;
//!
//!     rsi::set_cartesian_correction(CartesianCorrection {
//!         x: 0.5,
//!         ..Default::default()
//!     })?;
//!     let pose = rsi::cartesian_position()?;
//!     println!("ipoc {} at x={:.1}", pose.ipoc, pose.x);
//!
//!     rsi::stop()?;
//!     rsi::cleanup()
//! }
//! ```

pub mod clock;
pub mod config;
mod endpoint;
mod engine;
pub mod error;
pub mod protocol;
mod rt;
mod state;
mod transport;
pub mod types;

// Re-export commonly used types and the endpoint API
pub use config::RsiConfig;
pub use endpoint::{
    cartesian_position, cleanup, init, joint_position, set_callbacks, set_cartesian_correction,
    start, statistics, stop, ConnectionCallback, DataCallback,
};
pub use error::{Error, Result};
pub use types::{CartesianCorrection, CartesianPosition, JointPosition, Statistics};
