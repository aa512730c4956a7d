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

//! Logmill is an asynchronous logging core for long-running processes.
//!
//! Producer threads compose records with the emit macros and commit them to a
//! shared in-memory sink; a dedicated writer thread batches the bytes,
//! optionally compresses them, and persists them to a rotating set of files.
//! The producer fast path takes one short critical section and never touches
//! the disk.
//!
//! # Examples
//!
//! ```no_run
//! logmill::init("app");
//!
//! logmill::info!("listening on {}", "0.0.0.0:8080");
//! logmill::warn!("queue depth {} above watermark", 128);
//!
//! logmill::uninit();
//! ```
//!
//! With explicit configuration:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use logmill::Config;
//! use logmill::Level;
//!
//! let config = Config::new()
//!     .log_dir("/var/log/app")
//!     .min_log_level(Level::Info)
//!     .max_log_size(100)
//!     .max_files(30)
//!     .log_flush_interval(Duration::from_secs(1));
//! logmill::init_with("app", config);
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
mod console;
mod logger;
mod macros;
pub mod record;
pub mod rolling;
pub mod sink;

pub use self::codec::Codec;
pub use self::codec::CodecError;
pub use self::config::Config;
pub use self::logger::flush;
pub use self::logger::init;
pub use self::logger::init_with;
pub use self::logger::level_enabled;
pub use self::logger::set_output;
pub use self::logger::set_stderr_mirror;
pub use self::logger::uninit;
pub use self::logger::Output;
pub use self::record::Level;
pub use self::record::RecordBuilder;
pub use self::sink::AsyncSink;
