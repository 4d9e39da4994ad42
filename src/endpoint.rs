//! Endpoint lifecycle and the application-facing API.
//!
//! Exactly one endpoint lives in a process, because the scheduling
//! elevation and socket tuning it performs are process-scoped. The public
//! API is therefore a set of free functions over a lazily created
//! instance. Legal transitions:
//!
//! ```text
//! Uninitialized ──init──▶ Initialized ──start──▶ Running
//!       ▲                   ▲      │                │
//!       └──── cleanup ──────┘      └◀──── stop ◀────┘
//! ```
//!
//! Illegal transitions return a dedicated error and leave the state
//! unchanged. `set_callbacks` is legal only while `Initialized`.
//!
//! # Callbacks
//!
//! Callbacks execute on the engine thread between receive and respond.
//! They must not block, allocate unboundedly, or call back into the
//! lifecycle operations ([`start`]/[`stop`]/[`cleanup`]); the state
//! accessors and [`set_cartesian_correction`] are safe to call from a
//! callback.

use crate::config::RsiConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::state::{self, SharedState};
use crate::transport::RsiSocket;
use crate::types::{CartesianCorrection, CartesianPosition, JointPosition, Statistics};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Invoked after every fully parsed datagram with the freshly latched pose
/// records. Runs on the engine thread; keep it fast.
pub type DataCallback = Box<dyn FnMut(&CartesianPosition, &JointPosition) + Send>;

/// Invoked on connection transitions: `true` when the first datagram after
/// start (or after a watchdog fire) is answered, `false` when the watchdog
/// declares the robot gone.
pub type ConnectionCallback = Box<dyn FnMut(bool) + Send>;

/// The registered callback pair, shared with the engine thread.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub data: Option<DataCallback>,
    pub connection: Option<ConnectionCallback>,
}

/// How long `stop` waits for the engine thread before detaching it.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Lifecycle position of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Initialized,
    Running,
}

pub(crate) struct RsiEndpoint {
    state: EngineState,
    config: RsiConfig,
    shared: SharedState,
    callbacks: Arc<Mutex<Callbacks>>,
    shutdown: Arc<AtomicBool>,
    engine_thread: Option<JoinHandle<()>>,
}

impl RsiEndpoint {
    fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            config: RsiConfig::default(),
            shared: state::new_shared(),
            callbacks: Arc::new(Mutex::new(Callbacks::default())),
            shutdown: Arc::new(AtomicBool::new(false)),
            engine_thread: None,
        }
    }

    fn init(&mut self, config: Option<RsiConfig>) -> Result<()> {
        if self.state != EngineState::Uninitialized {
            return Err(Error::AlreadyRunning);
        }

        let config = config.unwrap_or_default();
        config.validate()?;

        // Fresh store: statistics restart from their seeds on every init.
        self.shared = state::new_shared();
        self.config = config;
        self.state = EngineState::Initialized;
        log::debug!(
            "RSI endpoint initialized for {}:{}",
            self.config.bind_address,
            self.config.port
        );
        Ok(())
    }

    fn set_callbacks(
        &mut self,
        data: Option<DataCallback>,
        connection: Option<ConnectionCallback>,
    ) -> Result<()> {
        match self.state {
            EngineState::Uninitialized => Err(Error::InitFailed),
            EngineState::Running => Err(Error::AlreadyRunning),
            EngineState::Initialized => {
                let mut callbacks = self.callbacks.lock();
                callbacks.data = data;
                callbacks.connection = connection;
                Ok(())
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        match self.state {
            EngineState::Uninitialized => return Err(Error::InitFailed),
            EngineState::Running => return Err(Error::AlreadyRunning),
            EngineState::Initialized => {}
        }

        // Socket first: a bind failure must not leave a thread behind.
        let socket = RsiSocket::open(&self.config)?;

        self.shutdown.store(false, Ordering::Relaxed);
        // The watchdog re-arms on the first datagram after this start.
        self.shared.lock().stats.is_connected = false;

        let engine = Engine::new(
            socket,
            Arc::clone(&self.shared),
            Arc::clone(&self.callbacks),
            Arc::clone(&self.shutdown),
            self.config.timeout_ms,
            self.config.verbose,
        );

        let handle = thread::Builder::new()
            .name("rsi-engine".to_string())
            .spawn(move || engine.run())
            .map_err(|e| {
                log::error!("Failed to spawn engine thread: {}", e);
                Error::ThreadFailed
            })?;

        self.engine_thread = Some(handle);
        self.state = EngineState::Running;
        log::info!(
            "RSI endpoint listening on {}:{}",
            self.config.bind_address,
            self.config.port
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        match self.state {
            EngineState::Uninitialized => return Err(Error::InitFailed),
            EngineState::Initialized => return Err(Error::NotRunning),
            EngineState::Running => {}
        }

        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.engine_thread.take() {
            // The loop re-checks the exit flag every iteration, so this is
            // normally immediate; the bounded wait keeps a wedged engine
            // from hanging the caller.
            let deadline = Instant::now() + STOP_JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            if handle.is_finished() {
                if handle.join().is_err() {
                    log::error!("Engine thread panicked");
                }
            } else {
                log::warn!(
                    "Engine thread did not exit within {:?}; detaching",
                    STOP_JOIN_TIMEOUT
                );
            }
        }

        self.state = EngineState::Initialized;
        if self.config.verbose {
            log::info!("RSI endpoint stopped");
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.state == EngineState::Uninitialized {
            return Err(Error::InitFailed);
        }
        if self.state == EngineState::Running {
            self.stop()?;
        }
        *self.callbacks.lock() = Callbacks::default();
        self.state = EngineState::Uninitialized;
        Ok(())
    }

    fn require_running(&self) -> Result<()> {
        match self.state {
            EngineState::Uninitialized => Err(Error::InitFailed),
            EngineState::Initialized => Err(Error::NotRunning),
            EngineState::Running => Ok(()),
        }
    }

    fn cartesian_position(&self) -> Result<CartesianPosition> {
        self.require_running()?;
        Ok(self.shared.lock().cartesian)
    }

    fn joint_position(&self) -> Result<JointPosition> {
        self.require_running()?;
        Ok(self.shared.lock().joints)
    }

    fn set_cartesian_correction(&self, correction: CartesianCorrection) -> Result<()> {
        self.require_running()?;
        self.shared.lock().correction = correction;
        Ok(())
    }

    fn statistics(&self) -> Result<Statistics> {
        if self.state == EngineState::Uninitialized {
            return Err(Error::InitFailed);
        }
        Ok(self.shared.lock().stats)
    }
}

// ============================================================================
// Process-wide instance and the public free-function API
// ============================================================================

static ENDPOINT: OnceLock<Mutex<RsiEndpoint>> = OnceLock::new();

fn instance() -> &'static Mutex<RsiEndpoint> {
    ENDPOINT.get_or_init(|| Mutex::new(RsiEndpoint::new()))
}

/// Configure and arm the endpoint.
///
/// `None` means the defaults: bind 0.0.0.0:59152, 1000 ms watchdog,
/// non-verbose. Valid only from the uninitialized state.
pub fn init(config: Option<RsiConfig>) -> Result<()> {
    instance().lock().init(config)
}

/// Register the data and connection callbacks.
///
/// Either may be `None`. Valid only between [`init`] and [`start`];
/// registering again replaces both.
pub fn set_callbacks(
    data: Option<DataCallback>,
    connection: Option<ConnectionCallback>,
) -> Result<()> {
    instance().lock().set_callbacks(data, connection)
}

/// Bind the socket and spawn the engine thread.
pub fn start() -> Result<()> {
    instance().lock().start()
}

/// Signal the engine to exit, join it (bounded), and close the socket.
pub fn stop() -> Result<()> {
    instance().lock().stop()
}

/// Tear the endpoint down, stopping first if it is still running.
pub fn cleanup() -> Result<()> {
    instance().lock().cleanup()
}

/// Snapshot of the latest Cartesian pose. Valid only while running.
pub fn cartesian_position() -> Result<CartesianPosition> {
    instance().lock().cartesian_position()
}

/// Snapshot of the latest joint pose. Valid only while running.
pub fn joint_position() -> Result<JointPosition> {
    instance().lock().joint_position()
}

/// Replace the pending correction.
///
/// The new value goes out with the next response and every one after it
/// until overwritten.
pub fn set_cartesian_correction(correction: CartesianCorrection) -> Result<()> {
    instance().lock().set_cartesian_correction(correction)
}

/// Snapshot of the communication statistics. Valid once initialized.
pub fn statistics() -> Result<Statistics> {
    instance().lock().statistics()
}
