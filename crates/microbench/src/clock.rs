// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CPU time sources.
//!
//! Process CPU time sums user and system time over every thread of the
//! process, so work done by a backend's worker pool is charged to the
//! benchmark. Thread CPU time only covers the calling thread.

use std::time::Duration;

/// Which CPU clock a benchmark reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuClock {
    /// All threads of the process (`getrusage(RUSAGE_SELF)`).
    Process,
    /// The calling thread only (`CLOCK_THREAD_CPUTIME_ID`).
    Thread,
}

impl CpuClock {
    pub fn now(self) -> Duration {
        match self {
            CpuClock::Process => process_cpu_time(),
            CpuClock::Thread => thread_cpu_time(),
        }
    }
}

/// Cumulative user + system CPU time of the whole process.
#[cfg(unix)]
pub fn process_cpu_time() -> Duration {
    // SAFETY: rusage is plain-old-data; all-zero bytes are a valid value.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage only writes into the struct we own.
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        tracing::warn!("getrusage failed; reporting zero CPU time");
        return Duration::ZERO;
    }
    timeval_to_duration(usage.ru_utime) + timeval_to_duration(usage.ru_stime)
}

/// CPU time consumed by the calling thread.
#[cfg(unix)]
pub fn thread_cpu_time() -> Duration {
    // SAFETY: timespec is plain-old-data; all-zero bytes are a valid value.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: clock_gettime only writes into the struct we own.
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
    if ret != 0 {
        tracing::warn!("clock_gettime(CLOCK_THREAD_CPUTIME_ID) failed; reporting zero CPU time");
        return Duration::ZERO;
    }
    Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
}

#[cfg(unix)]
fn timeval_to_duration(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec as u64) + Duration::from_micros(tv.tv_usec as u64)
}

#[cfg(not(unix))]
pub fn process_cpu_time() -> Duration {
    Duration::ZERO
}

#[cfg(not(unix))]
pub fn thread_cpu_time() -> Duration {
    Duration::ZERO
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn spin(d: Duration) {
        let start = std::time::Instant::now();
        let mut x = 0u64;
        while start.elapsed() < d {
            x = std::hint::black_box(x.wrapping_add(1));
        }
    }

    #[test]
    fn test_process_clock_advances() {
        let before = process_cpu_time();
        spin(Duration::from_millis(30));
        assert!(process_cpu_time() > before);
    }

    #[test]
    fn test_process_clock_counts_other_threads() {
        let before = process_cpu_time();
        std::thread::spawn(|| spin(Duration::from_millis(50)))
            .join()
            .unwrap();
        // The calling thread slept in join(); the worker's time still counts.
        assert!(process_cpu_time() - before >= Duration::from_millis(20));
    }

    #[test]
    fn test_thread_clock_advances() {
        let before = CpuClock::Thread.now();
        spin(Duration::from_millis(30));
        assert!(CpuClock::Thread.now() > before);
    }
}
