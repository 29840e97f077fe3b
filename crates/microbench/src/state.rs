// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-run benchmark state.
//!
//! A benchmark body receives a [`State`] and drives its timed loop:
//!
//! ```
//! # use microbench::{CpuClock, State};
//! # let mut state = State::new(3, CpuClock::Process);
//! // untimed setup here
//! for _ in state.iter() {
//!     // timed work here
//! }
//! // untimed teardown here
//! # assert_eq!(state.iterations(), 3);
//! ```
//!
//! The clocks start when the loop asks for its first iteration and stop
//! when the loop is exhausted, so setup and teardown are never measured.

use crate::clock::CpuClock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Running {
    real: Instant,
    cpu: Duration,
}

/// Iteration budget and clocks for one call of a benchmark body.
#[derive(Debug)]
pub struct State {
    max_iterations: u64,
    completed: u64,
    cpu_clock: CpuClock,
    running: Option<Running>,
    started: bool,
    real_time: Duration,
    cpu_time: Duration,
}

impl State {
    /// A state that will hand out `max_iterations` iterations.
    pub fn new(max_iterations: u64, cpu_clock: CpuClock) -> Self {
        Self {
            max_iterations,
            completed: 0,
            cpu_clock,
            running: None,
            started: false,
            real_time: Duration::ZERO,
            cpu_time: Duration::ZERO,
        }
    }

    /// Iterations the runner asked for.
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Iterations handed out so far.
    pub fn iterations(&self) -> u64 {
        self.completed
    }

    /// Wall time spent inside the loop.
    pub fn real_time(&self) -> Duration {
        self.real_time
    }

    /// CPU time spent inside the loop.
    pub fn cpu_time(&self) -> Duration {
        self.cpu_time
    }

    /// Whether the timed loop was entered.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Whether the timed loop ran to completion.
    pub fn finished(&self) -> bool {
        self.started && self.running.is_none() && self.completed == self.max_iterations
    }

    /// Returns `true` while iterations remain; the first call starts the
    /// clocks and the call that returns `false` stops them.
    pub fn keep_running(&mut self) -> bool {
        if !self.started {
            self.started = true;
            self.start_timing();
        }
        if self.completed < self.max_iterations {
            self.completed += 1;
            true
        } else {
            self.stop_timing();
            false
        }
    }

    /// Iterator form of [`State::keep_running`]; yields iteration indices.
    pub fn iter(&mut self) -> Iterations<'_> {
        Iterations { state: self }
    }

    fn start_timing(&mut self) {
        self.running = Some(Running {
            real: Instant::now(),
            cpu: self.cpu_clock.now(),
        });
    }

    fn stop_timing(&mut self) {
        if let Some(running) = self.running.take() {
            self.real_time += running.real.elapsed();
            self.cpu_time += self.cpu_clock.now().saturating_sub(running.cpu);
        }
    }

    /// Stops the clocks if the body left the loop early.
    pub(crate) fn finish(&mut self) {
        self.stop_timing();
    }
}

/// Iterator returned by [`State::iter`].
#[derive(Debug)]
pub struct Iterations<'a> {
    state: &'a mut State,
}

impl Iterator for Iterations<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let index = self.state.completed;
        self.state.keep_running().then_some(index)
    }
}
