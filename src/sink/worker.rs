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

use std::mem;
use std::sync::Arc;
use std::sync::PoisonError;

use jiff::Zoned;

use crate::buffer::LargeBuffer;
use crate::rolling::FileManager;
use crate::sink::Shared;

/// Queue depth above which the drop-excess policy fires.
const DRAIN_LIMIT: usize = 25;

/// Buffers preserved as evidence when the policy fires, and kept around
/// afterwards to replenish the spares.
const DRAIN_KEEP: usize = 2;

/// The single consumer: drains full buffers, compresses them, and streams
/// them through the file manager.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    manager: FileManager,
    spare_a: Option<LargeBuffer>,
    spare_b: Option<LargeBuffer>,
}

impl Worker {
    pub(crate) fn new(shared: Arc<Shared>) -> Worker {
        let opts = &shared.opts;
        let manager = FileManager::new(
            &opts.dir,
            opts.prefix.clone(),
            opts.max_size_mib as u32,
            opts.max_files,
            opts.flush_interval,
        );

        let mut spare_a = LargeBuffer::new();
        let mut spare_b = LargeBuffer::new();
        spare_a.zero();
        spare_b.zero();

        Worker {
            shared: Arc::clone(&shared),
            manager,
            spare_a: Some(spare_a),
            spare_b: Some(spare_b),
        }
    }

    pub(crate) fn run(mut self) {
        let mut drain: Vec<LargeBuffer> = Vec::with_capacity(16);
        loop {
            let running = self.collect(&mut drain);

            if let Some(notice) = drop_excess(&mut drain, &Zoned::now()) {
                eprint!("{notice}");
                self.manager.append(notice.as_bytes());
            }

            for buffer in &drain {
                self.write_buffer(buffer.as_slice());
            }

            // Up to two drained buffers live on to replenish the spares; the
            // rest release their memory here.
            if drain.len() > DRAIN_KEEP {
                drain.truncate(DRAIN_KEEP);
            }
            if self.spare_a.is_none() {
                if let Some(mut buffer) = drain.pop() {
                    buffer.reset();
                    self.spare_a = Some(buffer);
                }
            }
            if self.spare_b.is_none() {
                if let Some(mut buffer) = drain.pop() {
                    buffer.reset();
                    self.spare_b = Some(buffer);
                }
            }
            drain.clear();

            self.manager.flush();
            self.shared.note_drained();

            if !running {
                break;
            }
        }
    }

    /// Waits for work (bounded by the flush interval), then swaps the queue
    /// into `drain`. On timeout the active buffer is handed off so a quiet
    /// sink still flushes within one interval. Shutdown is re-checked on
    /// every wakeup; the final pass drains the active buffer too.
    fn collect(&mut self, drain: &mut Vec<LargeBuffer>) -> bool {
        let mut state = self.shared.lock_state();

        if state.running && state.full_queue.is_empty() {
            let (guard, timeout) = self
                .shared
                .work_ready
                .wait_timeout(state, self.shared.opts.flush_interval)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;

            if timeout.timed_out() && state.full_queue.is_empty() && !state.active.is_empty() {
                if let Some(spare) = self.spare_a.take() {
                    let full = mem::replace(&mut state.active, spare);
                    state.full_queue.push(full);
                }
            }
        }

        if !state.running && !state.active.is_empty() {
            let fresh = self.spare_a.take().unwrap_or_default();
            let full = mem::replace(&mut state.active, fresh);
            state.full_queue.push(full);
        }

        mem::swap(&mut state.full_queue, drain);
        if state.standby.is_none() {
            state.standby = self.spare_b.take();
        }
        state.running
    }

    fn write_buffer(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match self.shared.opts.codec.compress(bytes) {
            Ok(compressed) => self.manager.append(&compressed),
            Err(err) => {
                eprintln!("log codec failed, writing raw bytes: {err}");
                self.manager.append(bytes);
            }
        }
    }
}

/// When the writer falls too far behind, keep the two oldest buffers as
/// evidence, discard the rest, and report what happened in one line.
fn drop_excess<B>(drain: &mut Vec<B>, now: &Zoned) -> Option<String> {
    if drain.len() <= DRAIN_LIMIT {
        return None;
    }
    let notice = format!(
        "Dropped log messages at {}, {} larger buffers\n",
        now.strftime("%Y-%m-%d %H:%M:%S"),
        drain.len() - DRAIN_KEEP,
    );
    drain.truncate(DRAIN_KEEP);
    Some(notice)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn fixed_now() -> Zoned {
        Zoned::from_str("2024-08-10T17:12:52[UTC]").unwrap()
    }

    #[test]
    fn burst_keeps_two_buffers_and_one_notice() {
        let mut drain: Vec<usize> = (0..40).collect();
        let notice = drop_excess(&mut drain, &fixed_now()).expect("policy should fire");

        assert_eq!(
            notice,
            "Dropped log messages at 2024-08-10 17:12:52, 38 larger buffers\n"
        );
        assert_eq!(drain, vec![0, 1]);
    }

    #[test]
    fn backlog_at_the_threshold_is_kept() {
        let mut drain: Vec<usize> = (0..DRAIN_LIMIT).collect();
        assert!(drop_excess(&mut drain, &fixed_now()).is_none());
        assert_eq!(drain.len(), DRAIN_LIMIT);
    }

    #[test]
    fn one_past_the_threshold_fires() {
        let mut drain: Vec<usize> = (0..=DRAIN_LIMIT).collect();
        let notice = drop_excess(&mut drain, &fixed_now()).unwrap();
        assert!(notice.contains("24 larger buffers"));
        assert_eq!(drain, vec![0, 1]);
    }
}
