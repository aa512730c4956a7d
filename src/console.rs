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

//! Console mirror: writes committed records to stderr, colored by level.

use std::io::Write;

use colored::Colorize;

use crate::record::Level;

/// Writes the record bytes to stderr. I/O errors are ignored.
pub(crate) fn mirror(level: Level, bytes: &[u8]) {
    let text = String::from_utf8_lossy(bytes);
    let text = text.as_ref();
    let painted = match level {
        Level::Info => text.blue(),
        Level::Warn => text.yellow(),
        Level::Error | Level::Fatal => text.red(),
        _ => text.normal(),
    };
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "{painted}");
}
