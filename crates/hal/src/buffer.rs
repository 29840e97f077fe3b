// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII device buffer.
//!
//! A [`Buffer`] owns its storage until it is dropped, at which point the
//! storage goes back to the allocator's free list and the live-byte
//! counter is decremented. Use-after-release is a compile error.

use crate::allocator::AllocatorInner;
use std::sync::Arc;

/// A block of device memory.
pub struct Buffer {
    storage: Vec<u8>,
    allocator: Arc<AllocatorInner>,
    size_bytes: usize,
}

impl Buffer {
    pub(crate) fn new(storage: Vec<u8>, allocator: Arc<AllocatorInner>, size_bytes: usize) -> Self {
        Self {
            storage,
            allocator,
            size_bytes,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Size of this allocation in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let storage = std::mem::take(&mut self.storage);
        self.allocator.release(storage, self.size_bytes);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}
