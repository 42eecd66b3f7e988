//! Memory Monitor
//!
//! Samples the current process's resident set size and compares it against
//! the configured ceiling. The runtime's maintenance loop consults the
//! monitor to decide when to sweep the cache stores, and the pipeline
//! consults it at admission.

use std::sync::Mutex;

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Process memory sampler with a fixed ceiling.
pub struct MemoryMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    limit_bytes: u64,
}

impl MemoryMonitor {
    pub fn new(limit_mb: u64) -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            tracing::warn!("cannot resolve current pid, memory monitoring disabled");
        }
        Self {
            system: Mutex::new(System::new()),
            pid,
            limit_bytes: limit_mb * 1024 * 1024,
        }
    }

    /// Current resident set size in bytes. Zero when sampling is
    /// unavailable on this platform.
    pub fn current_bytes(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let Ok(mut system) = self.system.lock() else {
            return 0;
        };
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    /// Whether the process currently exceeds the configured ceiling.
    pub fn over_ceiling(&self) -> bool {
        let current = self.current_bytes();
        if current > self.limit_bytes {
            tracing::warn!(
                current_mb = current / (1024 * 1024),
                limit_mb = self.limit_bytes / (1024 * 1024),
                "memory ceiling exceeded"
            );
            true
        } else {
            false
        }
    }
}
