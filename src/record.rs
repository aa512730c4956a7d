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

//! Record composition.
//!
//! A [`RecordBuilder`] is a stack-held facade that assembles exactly one log
//! line. Construction stamps the `YYYYMMDD HH:MM:SS.mmm LEVEL ` prefix, the
//! push methods stream the payload, and dropping the builder appends the
//! ` - <basename>:<line>` trailer and commits the finished bytes to the
//! installed output.

use std::cell::RefCell;
use std::fmt;

use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::buffer::SmallBuffer;

/// Record severity, ordered from most to least verbose.
#[repr(usize)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Level {
    /// Very low priority, often extremely verbose, information.
    Trace = 0,
    /// Lower priority information.
    Debug = 1,
    /// Useful information.
    Info = 2,
    /// Hazardous situations.
    Warn = 3,
    /// Serious errors.
    Error = 4,
    /// Unrecoverable errors; committing a FATAL record aborts the process.
    Fatal = 5,
}

impl Level {
    /// The fixed six-byte field this level occupies in a record.
    pub const fn as_field(self) -> &'static str {
        match self {
            Level::Trace => "TRACE ",
            Level::Debug => "DEBUG ",
            Level::Info => "INFO  ",
            Level::Warn => "WARN  ",
            Level::Error => "ERROR ",
            Level::Fatal => "FATAL ",
        }
    }
}

/// Strips everything up to the last path separator.
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// A value formatted into a 32-byte scratch buffer; overflow is truncated.
pub struct Fixed {
    buf: [u8; 32],
    len: usize,
}

impl Fixed {
    /// Formats `args` into the scratch.
    pub fn format(args: fmt::Arguments<'_>) -> Fixed {
        let mut fixed = Fixed {
            buf: [0; 32],
            len: 0,
        };
        let _ = fmt::Write::write_fmt(&mut fixed, args);
        fixed
    }

    /// The formatted bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for Fixed {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let mut take = room.min(s.len());
        while take > 0 && !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Formats `n` in SI units (k, M, G, T, P, E). At most 5 characters.
pub fn format_si(n: u64) -> String {
    format_quantity(n, 1000.0, &["k", "M", "G", "T", "P", "E"])
}

/// Formats `n` in IEC units (Ki, Mi, Gi, Ti, Pi, Ei). At most 6 characters.
pub fn format_iec(n: u64) -> String {
    format_quantity(n, 1024.0, &["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"])
}

fn format_quantity(n: u64, step: f64, units: &[&str]) -> String {
    if (n as f64) < step {
        return n.to_string();
    }
    let mut value = n as f64;
    let mut unit = "";
    for u in units {
        value /= step;
        unit = u;
        if value < step {
            break;
        }
    }
    if value < 10.0 {
        format!("{value:.2}{unit}")
    } else if value < 100.0 {
        format!("{value:.1}{unit}")
    } else {
        format!("{value:.0}{unit}")
    }
}

struct SecondCache {
    second: i64,
    prefix: [u8; 17],
}

thread_local! {
    // One formatted "YYYYMMDD HH:MM:SS" per thread, refreshed when the
    // wall-clock second changes. Milliseconds are appended fresh per record.
    static SECOND_CACHE: RefCell<SecondCache> = const {
        RefCell::new(SecondCache {
            second: i64::MIN,
            prefix: [0; 17],
        })
    };
}

/// Builds one record and commits it on drop.
pub struct RecordBuilder {
    buf: SmallBuffer,
    level: Level,
    file: &'static str,
    line: u32,
}

impl RecordBuilder {
    /// Starts a record: stamps the timestamp and the level field.
    pub fn new(level: Level, file: &'static str, line: u32) -> RecordBuilder {
        let mut builder = RecordBuilder {
            buf: SmallBuffer::new(),
            level,
            file,
            line,
        };
        builder.stamp_time();
        builder.buf.append(level.as_field().as_bytes());
        builder
    }

    /// Starts a record carrying a call-site name, rendered as `[site] `.
    pub fn with_site(level: Level, file: &'static str, line: u32, site: &str) -> RecordBuilder {
        let mut builder = Self::new(level, file, line);
        builder.buf.append(b"[");
        builder.buf.append(site.as_bytes());
        builder.buf.append(b"] ");
        builder
    }

    fn stamp_time(&mut self) {
        let now = Timestamp::now();
        let second = now.as_second();
        SECOND_CACHE.with(|cache| {
            let mut cache = cache.borrow_mut();
            if cache.second != second {
                let text = now
                    .to_zoned(TimeZone::system())
                    .strftime("%Y%m%d %H:%M:%S")
                    .to_string();
                if text.len() == 17 {
                    cache.prefix.copy_from_slice(text.as_bytes());
                    cache.second = second;
                }
            }
            self.buf.append(&cache.prefix);
        });
        let millis = now.subsec_millisecond().rem_euclid(1000) as u32;
        let frac = [
            b'.',
            b'0' + (millis / 100) as u8,
            b'0' + (millis / 10 % 10) as u8,
            b'0' + (millis % 10) as u8,
            b' ',
        ];
        self.buf.append(&frac);
    }

    /// The record bytes composed so far.
    pub fn bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.buf.append(s.as_bytes());
        self
    }

    /// Appends the string, or the literal `(nullptr)` when absent.
    pub fn push_opt_str(&mut self, s: Option<&str>) -> &mut Self {
        match s {
            Some(s) => self.push_str(s),
            None => self.push_str("(nullptr)"),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.append(bytes);
        self
    }

    pub fn push_bool(&mut self, b: bool) -> &mut Self {
        self.push_str(if b { "1" } else { "0" })
    }

    pub fn push_char(&mut self, c: char) -> &mut Self {
        let mut scratch = [0u8; 4];
        self.push_str(c.encode_utf8(&mut scratch))
    }

    pub fn push_int(&mut self, v: i64) -> &mut Self {
        self.push_fixed(format_args!("{v}"))
    }

    pub fn push_uint(&mut self, v: u64) -> &mut Self {
        self.push_fixed(format_args!("{v}"))
    }

    pub fn push_float(&mut self, v: f64) -> &mut Self {
        self.push_fixed(format_args!("{v}"))
    }

    pub fn push_ptr<T>(&mut self, p: *const T) -> &mut Self {
        self.push_fixed(format_args!("{p:p}"))
    }

    pub fn push_thread_id(&mut self) -> &mut Self {
        let id = std::thread::current().id();
        self.push_fixed(format_args!("{id:?}"))
    }

    /// Appends `args` formatted through a 32-byte scratch.
    pub fn push_fixed(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        let fixed = Fixed::format(args);
        self.buf.append(fixed.as_bytes());
        self
    }

    /// Appends `n` in SI units.
    pub fn push_si(&mut self, n: u64) -> &mut Self {
        let text = format_si(n);
        self.push_str(&text)
    }

    /// Appends `n` in IEC units.
    pub fn push_iec(&mut self, n: u64) -> &mut Self {
        let text = format_iec(n);
        self.push_str(&text)
    }
}

impl fmt::Write for RecordBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.append(s.as_bytes());
        Ok(())
    }
}

impl Drop for RecordBuilder {
    fn drop(&mut self) {
        self.buf.append(b" - ");
        self.buf.append(basename(self.file).as_bytes());
        let tail = Fixed::format(format_args!(":{}\n", self.line));
        self.buf.append(tail.as_bytes());

        let bytes = self.buf.as_slice();
        crate::logger::commit(bytes);
        if crate::logger::stderr_mirror_enabled() {
            crate::console::mirror(self.level, bytes);
        }
        if self.level == Level::Fatal {
            crate::flush();
            std::process::abort();
        }
    }
}
