// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforced device allocator.
//!
//! The [`Allocator`] is owned by a [`Device`](crate::Device) and hands out
//! [`Buffer`]s. It:
//!
//! 1. Enforces the device [`MemoryBudget`]: a request that would push live
//!    bytes over the ceiling fails with [`HalError::OutOfMemory`].
//! 2. Keeps returned buffers on a free list binned by power-of-two size
//!    class, so a benchmark loop that allocates the same outputs every
//!    iteration stops touching the host allocator after the warm-up.
//! 3. Tracks [`AllocationStats`].
//!
//! Zero-byte requests (zero-element shapes) succeed without touching the
//! budget or the free list.

use crate::{AllocationStats, Buffer, BufferView, HalError, MemoryBudget};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tensor_core::{DType, Shape, Tensor, TensorError};

/// Smallest size class. Smaller requests share this bin.
const MIN_SIZE_CLASS: usize = 256;

/// State shared between the allocator and every live buffer.
pub struct AllocatorInner {
    budget: MemoryBudget,
    live_bytes: AtomicUsize,
    free_list: Mutex<HashMap<usize, Vec<Vec<u8>>>>,
    stats: Mutex<AllocationStats>,
}

impl AllocatorInner {
    /// Called by `Buffer::drop`.
    pub(crate) fn release(&self, storage: Vec<u8>, size_bytes: usize) {
        self.live_bytes.fetch_sub(size_bytes, Ordering::AcqRel);
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_release();
        }
        if storage.capacity() == 0 {
            return;
        }
        if let Ok(mut free) = self.free_list.lock() {
            free.entry(size_class_for(storage.capacity()))
                .or_default()
                .push(storage);
        }
    }
}

/// A cheaply clonable handle to a device allocator.
#[derive(Clone)]
pub struct Allocator {
    inner: Arc<AllocatorInner>,
}

impl Allocator {
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            inner: Arc::new(AllocatorInner {
                budget,
                live_bytes: AtomicUsize::new(0),
                free_list: Mutex::new(HashMap::new()),
                stats: Mutex::new(AllocationStats::default()),
            }),
        }
    }

    /// Allocates a zero-filled buffer of `size_bytes`.
    pub fn allocate_buffer(&self, size_bytes: usize) -> Result<Buffer, HalError> {
        if size_bytes == 0 {
            return Ok(Buffer::new(Vec::new(), Arc::clone(&self.inner), 0));
        }

        let budget = self.inner.budget.as_bytes();
        let reserved = self
            .inner
            .live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                live.checked_add(size_bytes).filter(|&total| total <= budget)
            });
        let live = match reserved {
            Ok(previous) => previous + size_bytes,
            Err(current) => {
                if let Ok(mut stats) = self.inner.stats.lock() {
                    stats.record_oom();
                }
                tracing::warn!(requested = size_bytes, budget, "device allocation over budget");
                return Err(HalError::OutOfMemory {
                    requested_bytes: size_bytes,
                    available_bytes: budget.saturating_sub(current),
                    budget_bytes: budget,
                });
            }
        };

        let class = size_class_for(size_bytes);
        let recycled = self
            .inner
            .free_list
            .lock()
            .ok()
            .and_then(|mut free| free.get_mut(&class).and_then(Vec::pop));

        let reused = recycled.is_some();
        let storage = match recycled {
            Some(mut storage) => {
                storage.clear();
                storage.resize(size_bytes, 0);
                storage
            }
            None => {
                let mut storage = Vec::with_capacity(class);
                storage.resize(size_bytes, 0);
                storage
            }
        };

        if let Ok(mut stats) = self.inner.stats.lock() {
            stats.record_allocation(reused, live);
        }

        Ok(Buffer::new(storage, Arc::clone(&self.inner), size_bytes))
    }

    /// Allocates a zero-filled buffer view for `shape` × `dtype`.
    pub fn allocate_buffer_view(&self, shape: Shape, dtype: DType) -> Result<BufferView, HalError> {
        let size = shape
            .checked_size_bytes(dtype)
            .ok_or_else(|| TensorError::SizeOverflow {
                shape: shape.clone(),
                dtype,
            })?;
        let buffer = self.allocate_buffer(size)?;
        BufferView::new(buffer, shape, dtype)
    }

    /// Copies a host tensor into freshly allocated device memory.
    pub fn wrap_tensor(&self, tensor: &Tensor) -> Result<BufferView, HalError> {
        let mut buffer = self.allocate_buffer(tensor.size_bytes())?;
        buffer.as_mut_slice().copy_from_slice(tensor.as_bytes());
        BufferView::new(buffer, tensor.shape().clone(), tensor.dtype())
    }

    /// Bytes currently held by live buffers.
    pub fn live_bytes(&self) -> usize {
        self.inner.live_bytes.load(Ordering::Acquire)
    }

    pub fn budget(&self) -> MemoryBudget {
        self.inner.budget
    }

    /// Returns a snapshot of allocation statistics.
    pub fn stats(&self) -> AllocationStats {
        self.inner
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Drops every cached free buffer.
    pub fn trim(&self) {
        if let Ok(mut free) = self.inner.free_list.lock() {
            free.clear();
        }
    }

    /// Number of buffers currently cached on the free list.
    pub fn free_buffers(&self) -> usize {
        self.inner
            .free_list
            .lock()
            .map(|free| free.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Smallest power of two that is ≥ `size` and ≥ [`MIN_SIZE_CLASS`].
fn size_class_for(size: usize) -> usize {
    size.max(MIN_SIZE_CLASS).next_power_of_two()
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("budget", &self.inner.budget)
            .field("live_bytes", &self.live_bytes())
            .finish()
    }
}
