//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall).

use crate::cli::RtLock;

#[cfg(target_os = "linux")]
/// Capacity of cpu_set_t in CPU indices (bits).
const MAX_CPUSET_BITS: usize = std::mem::size_of::<libc::cpu_set_t>() * 8;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock, rt_cpu: Option<usize>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        match apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "RT: mlockall failed"),
        }
        match apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(prio = p, "RT: SCHED_FIFO enabled"),
            Err(err) => tracing::warn!(error = %err, "RT: sched_setscheduler failed"),
        }
        if let Err(err) = apply_affinity(rt_cpu.unwrap_or(0)) {
            tracing::warn!(error = %err, "RT: affinity not applied");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, _lock: RtLock, _rt_cpu: Option<usize>) {
    if rt {
        tracing::warn!("RT mode is only supported on Linux; ignoring --rt");
    }
}

#[cfg(target_os = "linux")]
fn apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    let rc = unsafe { mlockall(flags) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    // All failed for lack of privilege or memory: settle for current pages.
    let retryable = matches!(err.raw_os_error(), Some(c) if c == libc::EPERM || c == libc::ENOMEM);
    if lock == RtLock::All && retryable && unsafe { mlockall(MCL_CURRENT) } == 0 {
        tracing::warn!(error = %err, "RT: mlockall(current|future) failed, locked current pages only");
        return Ok(());
    }
    let mut msg = format!("mlockall failed: {err}");
    if retryable {
        msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
    }
    Err(eyre::eyre!(msg))
}

#[cfg(target_os = "linux")]
fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    let (min, max) = unsafe {
        let min = sched_get_priority_min(SCHED_FIFO);
        let max = sched_get_priority_max(SCHED_FIFO);
        if min < 0 || max < 0 { (1, 99) } else { (min, max) }
    };
    let prio_val = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio_val,
    };
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        eyre::bail!("{err}; hint: needs CAP_SYS_NICE or root");
    }
    Ok(prio_val)
}

#[cfg(target_os = "linux")]
fn apply_affinity(target: usize) -> eyre::Result<()> {
    use libc::{CPU_ISSET, CPU_SET, CPU_ZERO, cpu_set_t};

    if target >= MAX_CPUSET_BITS {
        eyre::bail!("requested CPU {target} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
    }
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online < 1 || target as libc::c_long >= online {
        eyre::bail!("requested CPU {target} >= online {online}");
    }
    let mut allowed: cpu_set_t = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::sched_getaffinity(0, std::mem::size_of::<cpu_set_t>(), &mut allowed) };
    if rc != 0 {
        eyre::bail!("sched_getaffinity: {}", std::io::Error::last_os_error());
    }
    if !unsafe { CPU_ISSET(target, &allowed) } {
        eyre::bail!("CPU {target} not permitted by current affinity mask");
    }
    let mut desired: cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        CPU_ZERO(&mut desired);
        CPU_SET(target, &mut desired);
    }
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &desired) };
    if rc != 0 {
        eyre::bail!("sched_setaffinity: {}", std::io::Error::last_os_error());
    }
    Ok(())
}
