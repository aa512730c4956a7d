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

//! Process-wide logging configuration, read once at [`init_with`][crate::init_with].

use std::path::PathBuf;
use std::time::Duration;

use crate::codec::Codec;
use crate::record::Level;

/// Configuration consumed at startup. Read-only after init.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mirror each record to the process error stream, colored by level.
    pub also_log_to_stderr: bool,
    /// Trace, debug, and info records below this level are filtered before
    /// reaching the sink; warn, error, and fatal records always pass.
    pub min_log_level: Level,
    /// Per-file size cap in MiB; clamped to `[1, 4095]` when applied.
    pub max_log_size: u32,
    /// Retained-file count cap.
    pub max_files: usize,
    /// Writer-thread idle wake interval and per-file flush interval.
    pub log_flush_interval: Duration,
    /// Output directory, created if absent.
    pub log_dir: PathBuf,
    /// Compression applied per drained buffer before the file write.
    pub codec: Codec,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            also_log_to_stderr: true,
            min_log_level: Level::Trace,
            max_log_size: 10,
            max_files: 10,
            log_flush_interval: Duration::from_secs(3),
            log_dir: PathBuf::from("./log"),
            codec: Codec::Identity,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Config {
        Config::default()
    }

    /// Sets whether records are mirrored to stderr.
    #[must_use]
    pub fn also_log_to_stderr(mut self, enabled: bool) -> Self {
        self.also_log_to_stderr = enabled;
        self
    }

    /// Sets the minimum level accepted by the trace/debug/info macros.
    #[must_use]
    pub fn min_log_level(mut self, level: Level) -> Self {
        self.min_log_level = level;
        self
    }

    /// Sets the per-file size cap in MiB.
    #[must_use]
    pub fn max_log_size(mut self, mib: u32) -> Self {
        self.max_log_size = mib;
        self
    }

    /// Sets the retained-file count cap.
    #[must_use]
    pub fn max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    /// Sets the flush interval.
    #[must_use]
    pub fn log_flush_interval(mut self, interval: Duration) -> Self {
        self.log_flush_interval = interval;
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Sets the buffer codec.
    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }
}

/// The effective per-file cap in MiB: the configured value clamped to `[1, 4095]`.
pub(crate) fn clamped_mib(raw: u32) -> u64 {
    u64::from(raw.clamp(1, 4095))
}
