// Copyright 2025 eraflo
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

use std::fmt;

/// Default number of warnings logged before a [`WarningLimiter`] goes quiet.
pub const DEFAULT_WARNING_LIMIT: usize = 100;

/// Rate-limits the resource/state mismatch warnings emitted while drawing.
///
/// A missing uniform or attribute is usually reported on every frame, so the
/// limiter logs the first `limit` warnings, then a single notice, then nothing.
#[derive(Debug, Clone)]
pub struct WarningLimiter {
    emitted: usize,
    limit: usize,
}

impl WarningLimiter {
    /// Creates a limiter that logs at most `limit` warnings.
    pub fn new(limit: usize) -> Self {
        Self { emitted: 0, limit }
    }

    /// Logs `message` unless the limit has been reached. Returns `true` if it was logged.
    pub fn warn(&mut self, message: fmt::Arguments<'_>) -> bool {
        if self.emitted > self.limit {
            return false;
        }
        self.emitted += 1;
        if self.emitted > self.limit {
            log::warn!("more than {} program warnings, stopping logs", self.limit);
            return false;
        }
        log::warn!("{message}");
        true
    }

    /// Number of warnings logged so far, excluding the final notice.
    pub fn emitted(&self) -> usize {
        self.emitted.min(self.limit)
    }

    /// `true` once the limiter has gone quiet.
    pub fn is_exhausted(&self) -> bool {
        self.emitted > self.limit
    }
}

impl Default for WarningLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_after_the_limit() {
        let mut limiter = WarningLimiter::new(3);
        for _ in 0..3 {
            assert!(limiter.warn(format_args!("attribute missing")));
        }
        assert!(!limiter.is_exhausted());
        assert!(!limiter.warn(format_args!("attribute missing")));
        assert!(limiter.is_exhausted());
        assert!(!limiter.warn(format_args!("attribute missing")));
        assert_eq!(limiter.emitted(), 3);
    }
}
