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

use jiff::Timestamp;

/// Time source for the file manager; tests substitute a manual clock.
#[derive(Debug)]
pub(crate) enum Clock {
    System,
    #[cfg(test)]
    Manual(ManualClock),
}

impl Clock {
    pub(crate) fn now(&self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            #[cfg(test)]
            Clock::Manual(clock) => clock.now,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_now(&mut self, now: Timestamp) {
        if let Clock::Manual(clock) = self {
            clock.now = now;
        }
    }
}

#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Timestamp,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(now: Timestamp) -> ManualClock {
        ManualClock { now }
    }
}
