// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-capacity append-only byte buffers.
//!
//! Two sizes are instantiated: [`SmallBuffer`] stages a single record on the
//! producer side, [`LargeBuffer`] batches records on the sink side. A buffer
//! never grows and never truncates: an append that does not fit entirely is
//! skipped.

/// Capacity of the per-record staging buffer.
pub const SMALL_BUFFER_SIZE: usize = 4000;

/// Capacity of the sink-side batching buffer.
pub const LARGE_BUFFER_SIZE: usize = 4_000_000;

/// Buffer holding one in-flight record.
pub type SmallBuffer = FixedBuffer<SMALL_BUFFER_SIZE>;

/// Buffer batching records between the producers and the writer thread.
pub type LargeBuffer = FixedBuffer<LARGE_BUFFER_SIZE>;

/// Sentinel installed while the buffer is live, cleared on destruction.
///
/// The marker is never called; its address in a core dump tells whether the
/// buffer was still live when the process died.
pub type Marker = fn();

fn marker_live() {}
fn marker_dead() {}

/// A contiguous byte region of exactly `N` bytes with a write cursor.
#[derive(Debug)]
pub struct FixedBuffer<const N: usize> {
    data: Box<[u8]>,
    len: usize,
    marker: Marker,
}

impl<const N: usize> FixedBuffer<N> {
    /// Creates a zero-filled buffer with an empty cursor.
    pub fn new() -> FixedBuffer<N> {
        FixedBuffer {
            data: vec![0u8; N].into_boxed_slice(),
            len: 0,
            marker: marker_live,
        }
    }

    /// Copies `src` at the cursor if the whole slice fits; otherwise a no-op.
    pub fn append(&mut self, src: &[u8]) {
        if self.available() >= src.len() {
            self.data[self.len..self.len + src.len()].copy_from_slice(src);
            self.len += src.len();
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been written since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Remaining room in bytes.
    pub fn available(&self) -> usize {
        N - self.len
    }

    /// The written portion of the buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Rewinds the cursor. Byte contents are unspecified afterwards.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Overwrites all `N` bytes with zero, faulting the pages in.
    ///
    /// The cursor is untouched; call this on a fresh or reset buffer.
    pub fn zero(&mut self) {
        self.data.fill(0);
    }

    /// The post-mortem sentinel currently installed.
    pub fn marker(&self) -> Marker {
        self.marker
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for FixedBuffer<N> {
    fn drop(&mut self) {
        self.marker = marker_dead;
    }
}
