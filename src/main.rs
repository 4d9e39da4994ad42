//! rsi-io - RSI endpoint monitor daemon.
//!
//! Arms the endpoint, then prints a state line whenever the robot's IPOC
//! advances. Usage: `rsi-io [config.toml]`.

use rsi_io as rsi;
use rsi_io::RsiConfig;
use std::env;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => {
            log::info!("Using config: {}", path);
            match RsiConfig::load(&path) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Config error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => RsiConfig::default(),
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    }) {
        log::error!("Error setting Ctrl-C handler: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = run(config, &running) {
        log::error!("RSI monitor failed: {}", e);
        let _ = rsi::cleanup();
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(config: RsiConfig, running: &AtomicBool) -> rsi::Result<()> {
    log::info!(
        "RSI monitor starting on {}:{} (watchdog {} ms)",
        config.bind_address,
        config.port,
        config.timeout_ms
    );

    rsi::init(Some(config))?;
    rsi::set_callbacks(
        None,
        Some(Box::new(|connected| {
            if connected {
                log::info!("Robot connected");
            } else {
                log::warn!("Robot connection lost");
            }
        })),
    )?;
    rsi::start()?;
    log::info!("RSI monitor ready (Ctrl-C to quit)");

    let mut last_ipoc = 0u32;
    while running.load(Ordering::Relaxed) {
        if let (Ok(cart), Ok(joints), Ok(stats)) = (
            rsi::cartesian_position(),
            rsi::joint_position(),
            rsi::statistics(),
        ) {
            if cart.ipoc != last_ipoc {
                last_ipoc = cart.ipoc;
                log::info!(
                    "IPOC {:>6} | XYZ {:.1} {:.1} {:.1} mm | ABC {:.1} {:.1} {:.1} deg | \
                     A {:.1} {:.1} {:.1} {:.1} {:.1} {:.1} deg | rx {} late>4ms {}",
                    cart.ipoc,
                    cart.x,
                    cart.y,
                    cart.z,
                    cart.a,
                    cart.b,
                    cart.c,
                    joints.axis[0],
                    joints.axis[1],
                    joints.axis[2],
                    joints.axis[3],
                    joints.axis[4],
                    joints.axis[5],
                    stats.packets_received,
                    stats.late_responses
                );
            }
        }

        thread::sleep(Duration::from_millis(10));
    }

    log::info!("Stopping");
    rsi::stop()?;
    rsi::cleanup()?;
    log::info!("RSI monitor stopped");
    Ok(())
}
