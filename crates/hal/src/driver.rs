// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Driver registry.
//!
//! | driver       | executor                      | available |
//! |--------------|-------------------------------|-----------|
//! | `vmla`       | [`InlineExecutor`]            | yes       |
//! | `local-task` | [`TaskExecutor`] (rayon pool) | yes       |
//! | `vulkan`     | —                             | no        |
//! | `cuda`       | —                             | no        |
//! | `metal`      | —                             | no        |
//!
//! Asking for an unavailable driver yields [`HalError::DriverUnavailable`];
//! any other name yields [`HalError::DriverNotFound`].

use crate::executor::{InlineExecutor, TaskExecutor};
use crate::{Allocator, Device, Executor, HalError, MemoryBudget};
use std::sync::Arc;

/// Static description of a registered driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DriverInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub available: bool,
}

const DRIVERS: [DriverInfo; 5] = [
    DriverInfo {
        name: "vmla",
        description: "synchronous reference interpreter on the calling thread",
        available: true,
    },
    DriverInfo {
        name: "local-task",
        description: "multi-threaded CPU executor on a dedicated worker pool",
        available: true,
    },
    DriverInfo {
        name: "vulkan",
        description: "Vulkan compute (not compiled into this build)",
        available: false,
    },
    DriverInfo {
        name: "cuda",
        description: "NVIDIA CUDA (not compiled into this build)",
        available: false,
    },
    DriverInfo {
        name: "metal",
        description: "Apple Metal (not compiled into this build)",
        available: false,
    },
];

/// Lists every registered driver in registration order.
pub fn available_drivers() -> Vec<DriverInfo> {
    DRIVERS.to_vec()
}

/// Creates a device for `driver` whose allocator enforces `budget`.
pub fn create_device(driver: &str, budget: MemoryBudget) -> Result<Arc<Device>, HalError> {
    let info = DRIVERS
        .iter()
        .find(|d| d.name == driver)
        .ok_or_else(|| HalError::DriverNotFound {
            name: driver.to_string(),
            known: DRIVERS.map(|d| d.name).join(", "),
        })?;

    let executor: Box<dyn Executor> = match info.name {
        "vmla" => Box::new(InlineExecutor),
        "local-task" => {
            let executor = TaskExecutor::new(0).map_err(|e| HalError::DriverUnavailable {
                name: driver.to_string(),
                reason: e.to_string(),
            })?;
            Box::new(executor)
        }
        _ => {
            return Err(HalError::DriverUnavailable {
                name: driver.to_string(),
                reason: info.description.to_string(),
            })
        }
    };

    tracing::info!(
        driver,
        executor = executor.name(),
        threads = executor.concurrency(),
        budget = %budget,
        "device created"
    );
    Ok(Arc::new(Device::new(driver, Allocator::new(budget), executor)))
}
