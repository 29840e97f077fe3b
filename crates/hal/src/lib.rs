// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # hal
//!
//! Hardware abstraction layer for module execution: a driver registry, the
//! devices it creates, and the allocator every device owns.
//!
//! # Key Components
//!
//! - [`MemoryBudget`] — an optional device memory ceiling with human-readable
//!   parsing (`"512M"`, `"1G"`, etc.).
//! - [`Allocator`] — budget-enforced allocator with a free list binned by
//!   size class and cumulative [`AllocationStats`].
//! - [`Buffer`] — an RAII handle to device memory. Dropping it returns the
//!   memory to the allocator's free list.
//! - [`BufferView`] — an immutable `(buffer, shape, dtype)` triple; the unit
//!   of data passed between the VM and the device.
//! - [`Device`] — a named execution target: allocator plus an [`Executor`]
//!   that runs kernels.
//! - [`create_device`] / [`available_drivers`] — the driver registry.
//!
//! # Ownership Model
//!
//! ```text
//! Device ──owns──► Allocator ──Arc──► AllocatorInner (budget, free list)
//!                      │                      ▲
//!                      │ allocate(size)       │ drop() returns memory
//!                      ▼                      │
//!                   Buffer ───────────────────┘
//!                      │
//!                      ▼
//!                 BufferView (shape + dtype, read-only)
//! ```
//!
//! # Example
//! ```
//! use hal::{create_device, MemoryBudget};
//! use tensor_core::{BinaryOp, Shape, Tensor};
//!
//! let device = create_device("vmla", MemoryBudget::unlimited()).unwrap();
//! let a = Tensor::from_values(Shape::vector(3), &[1i32, 2, 3]).unwrap();
//! let a = device.allocator().wrap_tensor(&a).unwrap();
//! let sum = device.binary(BinaryOp::Add, &a, &a).unwrap();
//! assert_eq!(sum.to_vec::<i32>().unwrap(), vec![2, 4, 6]);
//! ```

pub mod allocator;
mod budget;
mod buffer;
mod buffer_view;
mod device;
mod driver;
mod error;
pub mod executor;
mod stats;

pub use allocator::Allocator;
pub use budget::MemoryBudget;
pub use buffer::Buffer;
pub use buffer_view::BufferView;
pub use device::Device;
pub use driver::{available_drivers, create_device, DriverInfo};
pub use error::HalError;
pub use executor::Executor;
pub use stats::AllocationStats;
