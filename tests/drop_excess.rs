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

//! Back-pressure through the whole pipeline: with the writer held back,
//! producers enqueue 40 full buffers; once the writer runs, the file carries
//! exactly one drop notice followed by the two oldest buffers, and buffers
//! 2..39 are gone.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use logmill::AsyncSink;
use logmill::Config;
use tempfile::TempDir;

// With a 1 MiB size trigger, sixteen 64 KiB records fill one hand-off buffer.
const RECORD_LEN: usize = 64 * 1024;
const RECORDS_PER_BUFFER: usize = 16;
const FULL_BUFFERS: usize = 40;

fn record(i: usize) -> Vec<u8> {
    let mut line = format!("buf{:02} rec{:04} ", i / RECORDS_PER_BUFFER, i).into_bytes();
    line.resize(RECORD_LEN - 1, b'x');
    line.push(b'\n');
    line
}

fn read_all(dir: &Path) -> String {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.ends_with(".log"))
        .collect::<Vec<_>>();
    names.sort();

    let mut text = String::new();
    for name in names {
        text.push_str(&fs::read_to_string(dir.join(name)).unwrap());
    }
    text
}

#[test]
fn burst_survives_as_one_notice_and_two_buffers() {
    let dir = TempDir::new().unwrap();
    let config = Config::new()
        .log_dir(dir.path())
        .max_log_size(1)
        .max_files(10);
    let sink = AsyncSink::new("burst", &config);

    // The writer is not started yet, standing in for a stalled writer: every
    // hand-off piles up on the queue. One extra record keeps the active
    // buffer non-empty so the flood detaches all forty.
    for i in 0..FULL_BUFFERS * RECORDS_PER_BUFFER + 1 {
        sink.append(&record(i));
    }

    sink.start();

    // Wait until the first drain cycle is durable before shutting down, so
    // the backlog is consumed in one pass.
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline && !read_all(dir.path()).contains("Dropped log messages at ") {
        thread::sleep(Duration::from_millis(10));
    }
    sink.stop();

    let text = read_all(dir.path());
    let lines = text.lines().collect::<Vec<_>>();

    let notices = lines
        .iter()
        .filter(|line| line.starts_with("Dropped log messages at "))
        .collect::<Vec<_>>();
    assert_eq!(notices.len(), 1, "expected exactly one notice: {notices:?}");
    assert!(
        notices[0].ends_with("38 larger buffers"),
        "wrong drop count: {}",
        notices[0]
    );
    assert!(
        lines[0].starts_with("Dropped log messages at "),
        "the notice precedes the surviving buffers"
    );

    let mut per_buffer = [0usize; FULL_BUFFERS + 1];
    for line in &lines[1..] {
        let index = line[3..5].parse::<usize>().unwrap_or_else(|_| {
            panic!("torn record: {line:?}");
        });
        per_buffer[index] += 1;
    }

    assert_eq!(per_buffer[0], RECORDS_PER_BUFFER, "buffer 0 must survive whole");
    assert_eq!(per_buffer[1], RECORDS_PER_BUFFER, "buffer 1 must survive whole");
    for (index, count) in per_buffer.iter().enumerate().take(FULL_BUFFERS).skip(2) {
        assert_eq!(*count, 0, "buffer {index} should have been dropped");
    }
    assert_eq!(per_buffer[FULL_BUFFERS], 1, "the active record survives the drain");

    // The survivors keep their original order.
    assert!(lines[1].starts_with("buf00 rec0000"));
    assert!(lines[1 + RECORDS_PER_BUFFER].starts_with("buf01 rec0016"));
}
