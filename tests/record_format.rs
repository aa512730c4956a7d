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

//! Drives the emit macros against a capturing output and checks the textual
//! contract of every level.

use std::sync::Arc;
use std::sync::Mutex;

use logmill::Output;

struct CaptureOutput(Arc<Mutex<Vec<u8>>>);

impl Output for CaptureOutput {
    fn write(&self, bytes: &[u8]) {
        self.0.lock().unwrap().extend_from_slice(bytes);
    }

    fn flush(&self) {}
}

#[test]
fn emitted_records_follow_the_textual_contract() {
    logmill::set_stderr_mirror(false);
    let captured = Arc::new(Mutex::new(Vec::new()));
    logmill::set_output(Box::new(CaptureOutput(Arc::clone(&captured))));

    logmill::trace!("tracing {}", 1);
    logmill::debug!("debugging");
    logmill::info!("hello {}", "world");
    logmill::warn!("watch out");
    logmill::error!("code {}", 500);

    let bytes = captured.lock().unwrap().clone();
    let text = String::from_utf8(bytes).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 5, "each macro commits exactly one record");

    // Trace and debug carry the call-site name; the others do not.
    assert!(lines[0].contains("TRACE [record_format] tracing 1"));
    assert!(lines[1].contains("DEBUG [record_format] debugging"));
    assert!(lines[2].contains("INFO  hello world"));
    assert!(lines[3].contains("WARN  watch out"));
    assert!(lines[4].contains("ERROR code 500"));

    for line in &lines {
        let (_, trailer) = line.rsplit_once(" - ").expect("missing trailer");
        let (file, line_no) = trailer.rsplit_once(':').expect("missing line number");
        assert_eq!(file, "record_format.rs");
        assert!(line_no.bytes().all(|b| b.is_ascii_digit()));
    }
}
