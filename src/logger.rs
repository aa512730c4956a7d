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

//! Process lifecycle: installing the sink and routing record commits.
//!
//! [`init`] wires the [`RecordBuilder`][crate::RecordBuilder] commit path to
//! an [`AsyncSink`] and spawns its writer thread; [`uninit`] drains and joins
//! it. The commit path goes through a read-mostly cell, so producers pay one
//! atomic load per record to find their output.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use arc_swap::ArcSwapOption;

use crate::config::Config;
use crate::record::Level;
use crate::sink::AsyncSink;

/// Where committed record bytes go.
///
/// Implementations must not block producers on I/O and must not panic; the
/// commit path has no error channel by design.
pub trait Output: Send + Sync + 'static {
    /// Accepts one record's bytes.
    fn write(&self, bytes: &[u8]);

    /// Makes previously written bytes durable.
    fn flush(&self);
}

static OUTPUT: ArcSwapOption<Box<dyn Output>> = ArcSwapOption::const_empty();
static SINK: Mutex<Option<Arc<AsyncSink>>> = Mutex::new(None);
static MIN_LEVEL: AtomicUsize = AtomicUsize::new(Level::Trace as usize);
static MIRROR_STDERR: AtomicBool = AtomicBool::new(true);

struct SinkOutput(Arc<AsyncSink>);

impl Output for SinkOutput {
    fn write(&self, bytes: &[u8]) {
        self.0.append(bytes);
    }

    fn flush(&self) {
        self.0.flush();
    }
}

/// Installs the asynchronous sink with the default [`Config`] and starts its
/// writer thread. Files are named `<logname>_<timestamp>.log`. Calling
/// `init` twice is a no-op.
pub fn init(logname: &str) {
    init_with(logname, Config::default());
}

/// Like [`init`], with an explicit configuration.
pub fn init_with(logname: &str, config: Config) {
    let mut installed = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    if installed.is_some() {
        return;
    }

    MIN_LEVEL.store(config.min_log_level as usize, Ordering::Relaxed);
    MIRROR_STDERR.store(config.also_log_to_stderr, Ordering::Relaxed);

    let sink = Arc::new(AsyncSink::new(logname, &config));
    sink.start();
    OUTPUT.store(Some(Arc::new(Box::new(SinkOutput(Arc::clone(&sink))))));
    *installed = Some(sink);
}

/// Uninstalls the sink, drains every committed record to disk, and joins the
/// writer thread. Records committed afterwards are discarded (the stderr
/// mirror keeps working if enabled).
pub fn uninit() {
    let sink = SINK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let Some(sink) = sink else {
        return;
    };
    OUTPUT.store(None);
    sink.stop();
}

/// Flushes the installed output. FATAL records call this before aborting.
pub fn flush() {
    if let Some(output) = OUTPUT.load().as_ref() {
        output.flush();
    }
}

/// Replaces the installed output. Mostly useful for tests and embedders that
/// bring their own transport.
pub fn set_output(output: Box<dyn Output>) {
    OUTPUT.store(Some(Arc::new(output)));
}

/// Toggles the stderr mirror at run time.
pub fn set_stderr_mirror(enabled: bool) {
    MIRROR_STDERR.store(enabled, Ordering::Relaxed);
}

/// Whether records at `level` pass the configured threshold. Consulted by
/// the trace, debug, and info macros; warn and above bypass it.
pub fn level_enabled(level: Level) -> bool {
    level as usize >= MIN_LEVEL.load(Ordering::Relaxed)
}

pub(crate) fn commit(bytes: &[u8]) {
    if let Some(output) = OUTPUT.load().as_ref() {
        output.write(bytes);
    }
}

pub(crate) fn stderr_mirror_enabled() -> bool {
    MIRROR_STDERR.load(Ordering::Relaxed)
}
