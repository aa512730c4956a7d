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

//! The concurrent buffering core.
//!
//! Producers append finished record bytes into a large active buffer under
//! one mutex. When the active buffer fills (or the size trigger fires) it is
//! pushed onto the hand-off queue and the pre-allocated standby buffer takes
//! its place, so the producer fast path never allocates and never touches the
//! disk. A single writer thread drains the queue, compresses each buffer, and
//! streams it through the rolling file manager.

use std::mem;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::buffer::LargeBuffer;
use crate::codec::Codec;
use crate::config::clamped_mib;
use crate::config::Config;
use crate::sink::worker::Worker;

mod worker;

#[derive(Debug)]
pub(crate) struct SinkOptions {
    pub(crate) dir: PathBuf,
    pub(crate) prefix: String,
    pub(crate) max_size_mib: u64,
    pub(crate) max_files: usize,
    pub(crate) flush_interval: Duration,
    pub(crate) codec: Codec,
}

#[derive(Debug)]
pub(crate) struct State {
    /// The buffer currently accepting appends. Always present.
    pub(crate) active: LargeBuffer,
    /// Pre-allocated spare, installed as active on hand-off.
    pub(crate) standby: Option<LargeBuffer>,
    /// Full buffers awaiting the writer, oldest first.
    pub(crate) full_queue: Vec<LargeBuffer>,
    /// Bytes accepted since the size trigger last fired.
    pub(crate) bytes_since_trigger: u64,
    /// Cleared by `stop`; the writer re-checks it on every wakeup.
    pub(crate) running: bool,
    /// Completed drain-and-flush cycles; the flush handshake waits on it.
    pub(crate) drains: u64,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) opts: SinkOptions,
    pub(crate) state: Mutex<State>,
    pub(crate) work_ready: Condvar,
    pub(crate) drain_done: Condvar,
    pub(crate) alive: AtomicBool,
}

impl Shared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn note_drained(&self) {
        let mut state = self.lock_state();
        state.drains += 1;
        drop(state);
        self.drain_done.notify_all();
    }
}

/// The asynchronous multi-producer / single-consumer sink.
///
/// `append` may be called from any number of threads; the bytes of one call
/// are contiguous in the output and never split across files. One writer
/// thread, spawned by [`start`][AsyncSink::start], owns all file I/O.
#[derive(Debug)]
pub struct AsyncSink {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncSink {
    /// Creates a sink writing files named `<prefix>_...` per `config`.
    ///
    /// The worker thread is not spawned until [`start`][AsyncSink::start];
    /// records appended before that accumulate in memory.
    pub fn new(prefix: &str, config: &Config) -> AsyncSink {
        let mut active = LargeBuffer::new();
        let mut standby = LargeBuffer::new();
        active.zero();
        standby.zero();

        AsyncSink {
            shared: Arc::new(Shared {
                opts: SinkOptions {
                    dir: config.log_dir.clone(),
                    prefix: prefix.to_string(),
                    max_size_mib: clamped_mib(config.max_log_size),
                    max_files: config.max_files,
                    flush_interval: config.log_flush_interval,
                    codec: config.codec,
                },
                state: Mutex::new(State {
                    active,
                    standby: Some(standby),
                    full_queue: Vec::with_capacity(16),
                    bytes_since_trigger: 0,
                    running: false,
                    drains: 0,
                }),
                work_ready: Condvar::new(),
                drain_done: Condvar::new(),
                alive: AtomicBool::new(true),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the writer thread. A second call is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return;
        }
        self.shared.lock_state().running = true;

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("logmill-writer".to_string())
            .spawn(move || Worker::new(shared).run())
            .expect("failed to spawn the log writer thread");
        *worker = Some(handle);
    }

    /// Appends one record's bytes. Never blocks on I/O.
    pub fn append(&self, bytes: &[u8]) {
        if bytes.is_empty() || !self.shared.alive.load(Ordering::Relaxed) {
            return;
        }

        let mut state = self.shared.lock_state();

        // The size trigger forces a hand-off so the writer sees the file-size
        // cap promptly; the writer owns the actual roll decision.
        let trigger = state.bytes_since_trigger >> 20 >= self.shared.opts.max_size_mib;
        if trigger {
            state.bytes_since_trigger = 0;
        }

        if state.active.available() <= bytes.len() || trigger {
            let fresh = state.standby.take().unwrap_or_else(LargeBuffer::new);
            let full = mem::replace(&mut state.active, fresh);
            if !full.is_empty() {
                state.full_queue.push(full);
            }
            self.shared.work_ready.notify_one();
        }

        state.active.append(bytes);
        state.bytes_since_trigger += bytes.len() as u64;
    }

    /// Hands off the active buffer and blocks until the writer has completed
    /// a drain-and-flush cycle, making every committed record durable.
    ///
    /// Returns immediately when the writer is not running.
    pub fn flush(&self) {
        if !self.shared.alive.load(Ordering::Relaxed) {
            return;
        }

        let shared = &self.shared;
        let mut state = shared.lock_state();
        if !state.running {
            return;
        }
        if !state.active.is_empty() {
            let fresh = state.standby.take().unwrap_or_else(LargeBuffer::new);
            let full = mem::replace(&mut state.active, fresh);
            state.full_queue.push(full);
        }

        let target = state.drains + 1;
        shared.work_ready.notify_one();
        while state.running && state.drains < target {
            state = shared
                .drain_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Signals shutdown, lets the writer drain everything, and joins it.
    pub fn stop(&self) {
        self.shared.alive.store(false, Ordering::Relaxed);
        self.shared.lock_state().running = false;
        self.shared.work_ready.notify_all();
        self.shared.drain_done.notify_all();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::buffer::LARGE_BUFFER_SIZE;

    fn idle_sink(dir: &TempDir, max_log_size: u32) -> AsyncSink {
        let config = Config::new()
            .log_dir(dir.path())
            .max_log_size(max_log_size);
        AsyncSink::new("idle", &config)
    }

    #[test]
    fn exact_fill_hands_off_before_the_next_record() {
        let dir = TempDir::new().unwrap();
        let sink = idle_sink(&dir, 4095);
        let chunk = vec![b'a'; LARGE_BUFFER_SIZE / 4];

        for _ in 0..3 {
            sink.append(&chunk);
        }
        {
            let state = sink.shared.lock_state();
            assert!(state.full_queue.is_empty());
            assert_eq!(state.active.len(), 3 * chunk.len());
            assert_eq!(state.active.available(), chunk.len());
        }

        // Exactly fills the remaining room: the hand-off happens first and
        // the record lands whole in the fresh buffer.
        sink.append(&chunk);
        let state = sink.shared.lock_state();
        assert_eq!(state.full_queue.len(), 1);
        assert_eq!(state.full_queue[0].len(), 3 * chunk.len());
        assert_eq!(state.active.len(), chunk.len());
        assert!(state.standby.is_none());
    }

    #[test]
    fn size_trigger_detaches_a_partial_buffer() {
        let dir = TempDir::new().unwrap();
        let sink = idle_sink(&dir, 1);
        let half_mib = vec![b'b'; 512 * 1024];

        sink.append(&half_mib);
        sink.append(&half_mib);
        {
            let state = sink.shared.lock_state();
            assert!(state.full_queue.is_empty());
            assert_eq!(state.bytes_since_trigger, 1 << 20);
        }

        sink.append(&half_mib);
        let state = sink.shared.lock_state();
        assert_eq!(state.full_queue.len(), 1, "the MiB trigger should detach");
        assert_eq!(state.full_queue[0].len(), 1 << 20);
        assert_eq!(state.active.len(), half_mib.len());
        assert_eq!(state.bytes_since_trigger, half_mib.len() as u64);
    }

    #[test]
    fn appends_after_stop_are_discarded() {
        let dir = TempDir::new().unwrap();
        let sink = idle_sink(&dir, 10);
        sink.stop();

        sink.append(b"late record\n");
        let state = sink.shared.lock_state();
        assert!(state.active.is_empty());
        assert!(state.full_queue.is_empty());
    }
}
