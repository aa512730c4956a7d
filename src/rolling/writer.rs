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

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// One open log file behind a 64 KiB user-space buffer.
///
/// An open failure leaves the writer without a handle; appends and flushes
/// then do nothing. Used only from the writer thread.
#[derive(Debug)]
pub struct FileWriter {
    file: Option<BufWriter<File>>,
    written_bytes: u64,
}

impl FileWriter {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> FileWriter {
        let path = path.as_ref();
        let file = match OpenOptions::new().append(true).create(true).open(path) {
            Ok(file) => Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)),
            Err(err) => {
                eprintln!("failed to open log file {}: {err}", path.display());
                None
            }
        };
        FileWriter {
            file,
            written_bytes: 0,
        }
    }

    /// A writer without a file, used before the first roll.
    pub(crate) fn closed() -> FileWriter {
        FileWriter {
            file: None,
            written_bytes: 0,
        }
    }

    /// Writes `bytes`, retrying short writes until consumed or an error stops
    /// the loop. A zero-byte write with no error counts as an error.
    pub fn append(&mut self, bytes: &[u8]) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let mut written = 0;
        while written < bytes.len() {
            match file.write(&bytes[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        self.written_bytes += bytes.len() as u64;
    }

    /// Flushes the user-space buffer to the OS.
    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Bytes accepted since the file was opened.
    pub fn written_bytes(&self) -> u64 {
        self.written_bytes
    }
}
