//! OS shims for real-time scheduling.
//!
//! The engine thread asks for the highest scheduling class the platform
//! allows. Refusal is tolerated: without CAP_SYS_NICE (or root) the
//! endpoint still answers every datagram, it just competes with the rest
//! of the system for the CPU and the late-response counter shows the cost.

/// Elevate the current thread to SCHED_FIFO at maximum priority.
#[cfg(target_os = "linux")]
pub(crate) fn promote_current_thread(verbose: bool) {
    let max = unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) };
    if max < 0 {
        log::warn!(
            "sched_get_priority_max(SCHED_FIFO) failed: {}",
            std::io::Error::last_os_error()
        );
        return;
    }

    let param = libc::sched_param {
        sched_priority: max,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        log::warn!(
            "sched_setscheduler(SCHED_FIFO, {}) failed: {} (running at default priority)",
            max,
            std::io::Error::last_os_error()
        );
    } else if verbose {
        log::info!("Engine thread promoted to SCHED_FIFO priority {}", max);
    }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn promote_current_thread(_verbose: bool) {
    log::debug!("Real-time promotion not available on this platform; running at default priority");
}
