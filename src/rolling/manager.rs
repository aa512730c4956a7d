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

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::config::clamped_mib;
use crate::rolling::clock::Clock;
use crate::rolling::writer::FileWriter;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Owns the output directory: opens timestamped files, rolls them on size and
/// day boundaries, bounds the retained-file count, and flushes periodically.
///
/// Single-consumer by construction; the writer thread is the only caller.
/// External callers (tests) take `&mut` or wrap the manager in a mutex.
#[derive(Debug)]
pub struct FileManager {
    dir: PathBuf,
    prefix: String,
    max_size_bytes: u64,
    max_files: usize,
    flush_interval: Duration,
    clock: Clock,
    retained: VecDeque<PathBuf>,
    writer: FileWriter,
    start_of_day: i64,
    last_flush: i64,
}

impl FileManager {
    /// Creates the directory if absent, reclaims files left by a previous
    /// run, and rolls to a fresh file.
    pub fn new(
        dir: impl AsRef<Path>,
        prefix: impl Into<String>,
        max_size_mib: u32,
        max_files: usize,
        flush_interval: Duration,
    ) -> FileManager {
        Self::with_clock(
            dir,
            prefix,
            max_size_mib,
            max_files,
            flush_interval,
            Clock::System,
        )
    }

    fn with_clock(
        dir: impl AsRef<Path>,
        prefix: impl Into<String>,
        max_size_mib: u32,
        max_files: usize,
        flush_interval: Duration,
        clock: Clock,
    ) -> FileManager {
        let dir = dir.as_ref().to_path_buf();
        let prefix = prefix.into();

        if let Err(err) = fs::create_dir_all(&dir) {
            eprintln!("failed to create log directory {}: {err}", dir.display());
        }

        let mut manager = FileManager {
            retained: reclaim(&dir, &prefix),
            dir,
            prefix,
            max_size_bytes: clamped_mib(max_size_mib) << 20,
            max_files: max_files.max(1),
            flush_interval,
            clock,
            writer: FileWriter::closed(),
            start_of_day: 0,
            last_flush: 0,
        };
        manager.roll();
        manager
    }

    /// Writes `bytes` to the current file, then applies the rotation and
    /// flush policy.
    pub fn append(&mut self, bytes: &[u8]) {
        self.writer.append(bytes);

        if self.writer.written_bytes() >= self.max_size_bytes {
            self.roll();
            return;
        }

        let now = self.clock.now().as_second();
        let today = midnight_of(now);
        if today != self.start_of_day {
            self.roll();
        } else if now - self.last_flush > self.flush_interval.as_secs() as i64 {
            self.last_flush = now;
            self.writer.flush();
        }
    }

    /// Flushes the current file.
    pub fn flush(&mut self) {
        self.writer.flush();
    }

    fn roll(&mut self) {
        let now = self.clock.now();
        let filename = self.generate_filename(now);

        while self.retained.len() >= self.max_files {
            let Some(oldest) = self.retained.pop_front() else {
                break;
            };
            if let Err(err) = fs::remove_file(&oldest) {
                eprintln!("failed to remove old log file {}: {err}", oldest.display());
            }
        }
        self.retained.push_back(filename.clone());

        self.start_of_day = midnight_of(now.as_second());
        self.last_flush = now.as_second();

        // Replacing the writer flushes and closes the previous file.
        self.writer.flush();
        self.writer = FileWriter::open(&filename);
    }

    /// `<dir>/<prefix>_<YYYYMMDD>_<HHMMSS>.<mmm>.log` in local time.
    fn generate_filename(&self, now: Timestamp) -> PathBuf {
        let zoned = now.to_zoned(TimeZone::system());
        let name = format!(
            "{}_{}.{:03}.log",
            self.prefix,
            zoned.strftime("%Y%m%d_%H%M%S"),
            zoned.millisecond(),
        );
        self.dir.join(name)
    }
}

fn midnight_of(epoch_seconds: i64) -> i64 {
    epoch_seconds.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// Collects files from a previous run, oldest first. Only names of the form
/// `<prefix>_*.log` are considered, so unrelated files are never evicted.
fn reclaim(dir: &Path, prefix: &str) -> VecDeque<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return VecDeque::new();
    };

    let marker = format!("{prefix}_");
    let mut names = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            if !entry.metadata().ok()?.is_file() {
                return None;
            }
            let name = entry.file_name();
            let name = name.to_str()?;
            (name.starts_with(&marker) && name.ends_with(".log")).then(|| name.to_string())
        })
        .collect::<Vec<_>>();

    // Timestamped names sort lexicographically in chronological order.
    names.sort();
    names.into_iter().map(|name| dir.join(name)).collect()
}
