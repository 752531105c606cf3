use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::session::{Session, Shared};

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub memory_usage_mb: f32,
    pub credential_configured: bool,
    pub analysis_in_flight: bool,
    pub analysis_runs: u32,
    pub analysis_failures: u32,
    pub last_analysis: Option<LastRun>,
    pub proposals_tracked: u32,
    pub timers_scheduled: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastRun {
    pub status: String, // completed, failed
    pub duration_ms: u64,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    credential_configured: bool,
    runs: Arc<AtomicU32>,
    failures: Arc<AtomicU32>,
    last_run: Arc<Mutex<Option<LastRun>>>,
}

impl HealthTracker {
    pub fn new(credential_configured: bool) -> Self {
        Self {
            start_time: Instant::now(),
            credential_configured,
            runs: Arc::new(AtomicU32::new(0)),
            failures: Arc::new(AtomicU32::new(0)),
            last_run: Arc::new(Mutex::new(None)),
        }
    }

    pub fn record_run(&self, succeeded: bool, elapsed: Duration) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_run.lock() = Some(LastRun {
            status: if succeeded { "completed" } else { "failed" }.to_string(),
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    pub fn get_health(&self, session: &Shared<Session>) -> KernelHealth {
        let (in_flight, proposals, timers) = {
            let s = session.lock();
            (
                s.is_analyzing(),
                s.proposals.proposals().len() as u32,
                s.proposals.scheduled() as u32,
            )
        };

        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            memory_usage_mb: get_memory_usage_mb(),
            credential_configured: self.credential_configured,
            analysis_in_flight: in_flight,
            analysis_runs: self.runs.load(Ordering::Relaxed),
            analysis_failures: self.failures.load(Ordering::Relaxed),
            last_analysis: self.last_run.lock().clone(),
            proposals_tracked: proposals,
            timers_scheduled: timers,
        }
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    if let Some(kb) = line.split_whitespace().nth(1).and_then(|s| s.parse::<u64>().ok()) {
                        return (kb as f32) / 1024.0; // KB -> MB
                    }
                }
            }
        }
    }

    // Pas de /proc : valeur inconnue
    0.0
}
