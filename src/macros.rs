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

//! Emit macros. Each expands to a [`RecordBuilder`] capturing the call site
//! and a `format_args!` write; the record commits when the builder leaves
//! scope. Trace, debug, and info records check the configured minimum level
//! first and carry the module path as their call-site name; warn, error, and
//! fatal records always fire.
//!
//! [`RecordBuilder`]: crate::RecordBuilder

/// Emits a TRACE record if the configured level admits it.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {{
        if $crate::level_enabled($crate::Level::Trace) {
            let mut __record = $crate::RecordBuilder::with_site(
                $crate::Level::Trace,
                file!(),
                line!(),
                module_path!(),
            );
            let _ = ::std::fmt::Write::write_fmt(&mut __record, format_args!($($arg)+));
        }
    }};
}

/// Emits a DEBUG record if the configured level admits it.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {{
        if $crate::level_enabled($crate::Level::Debug) {
            let mut __record = $crate::RecordBuilder::with_site(
                $crate::Level::Debug,
                file!(),
                line!(),
                module_path!(),
            );
            let _ = ::std::fmt::Write::write_fmt(&mut __record, format_args!($($arg)+));
        }
    }};
}

/// Emits an INFO record if the configured level admits it.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {{
        if $crate::level_enabled($crate::Level::Info) {
            let mut __record =
                $crate::RecordBuilder::new($crate::Level::Info, file!(), line!());
            let _ = ::std::fmt::Write::write_fmt(&mut __record, format_args!($($arg)+));
        }
    }};
}

/// Emits a WARN record unconditionally.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {{
        let mut __record = $crate::RecordBuilder::new($crate::Level::Warn, file!(), line!());
        let _ = ::std::fmt::Write::write_fmt(&mut __record, format_args!($($arg)+));
    }};
}

/// Emits an ERROR record unconditionally.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {{
        let mut __record = $crate::RecordBuilder::new($crate::Level::Error, file!(), line!());
        let _ = ::std::fmt::Write::write_fmt(&mut __record, format_args!($($arg)+));
    }};
}

/// Emits a FATAL record, flushes the sink, and aborts the process.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {{
        let mut __record = $crate::RecordBuilder::new($crate::Level::Fatal, file!(), line!());
        let _ = ::std::fmt::Write::write_fmt(&mut __record, format_args!($($arg)+));
    }};
}
