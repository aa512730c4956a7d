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

//! End-to-end size rotation: a 1 MiB cap and a steady stream of records
//! produce several bounded files with nothing lost.

use std::fs;

use logmill::AsyncSink;
use logmill::Config;
use tempfile::TempDir;

const RECORDS: usize = 4000;
const RECORD_LEN: usize = 400;

#[test]
fn size_cap_rotates_files_without_losing_bytes() {
    let dir = TempDir::new().unwrap();
    let config = Config::new()
        .log_dir(dir.path())
        .max_log_size(1)
        .max_files(10);
    let sink = AsyncSink::new("roll", &config);
    sink.start();

    let mut record = vec![b'x'; RECORD_LEN];
    record[RECORD_LEN - 1] = b'\n';
    for _ in 0..RECORDS {
        sink.append(&record);
    }
    sink.stop();

    let mut names = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.ends_with(".log"))
        .collect::<Vec<_>>();
    names.sort();

    assert!(
        (2..=10).contains(&names.len()),
        "expected the cap to split the stream into 2..=10 files, got {names:?}"
    );

    let mut total = 0u64;
    for name in &names {
        let size = fs::metadata(dir.path().join(name)).unwrap().len();
        assert!(
            size <= (1 << 20) + 64 * 1024,
            "file {name} exceeds the 1 MiB cap by more than one batch: {size}"
        );
        total += size;
    }
    assert_eq!(total, (RECORDS * RECORD_LEN) as u64, "bytes were lost or duplicated");

    for name in &names {
        assert!(name.starts_with("roll_"));
    }
    assert!(names.first() <= names.last());
}
