// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for a device allocator.

/// Cumulative statistics about device allocator usage.
///
/// In a benchmark run the interesting figures are `reused` versus `fresh`:
/// a steady-state loop should be served almost entirely from the free list.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AllocationStats {
    /// Allocation requests, including ones rejected by the budget.
    pub requests: u64,
    /// Allocations served from the free list.
    pub reused: u64,
    /// Allocations that required a fresh host allocation.
    pub fresh: u64,
    /// Requests rejected because they would exceed the budget.
    pub oom_count: u64,
    /// High-water mark of live bytes.
    pub peak_live_bytes: usize,
    /// Buffers returned to the allocator.
    pub released: u64,
}

impl AllocationStats {
    /// Fraction of successful allocations served from the free list.
    pub fn reuse_ratio(&self) -> f64 {
        let served = self.reused + self.fresh;
        if served == 0 {
            return 0.0;
        }
        self.reused as f64 / served as f64
    }

    pub(crate) fn record_allocation(&mut self, reused: bool, live_bytes: usize) {
        self.requests += 1;
        if reused {
            self.reused += 1;
        } else {
            self.fresh += 1;
        }
        self.peak_live_bytes = self.peak_live_bytes.max(live_bytes);
    }

    pub(crate) fn record_oom(&mut self) {
        self.requests += 1;
        self.oom_count += 1;
    }

    pub(crate) fn record_release(&mut self) {
        self.released += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} allocations ({} reused, {} fresh, {:.0}% reuse), {} OOMs, peak {} bytes, {} released",
            self.requests,
            self.reused,
            self.fresh,
            self.reuse_ratio() * 100.0,
            self.oom_count,
            self.peak_live_bytes,
            self.released,
        )
    }
}
