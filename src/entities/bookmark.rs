//! Bookmark: labeled point-in-time marker on the timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable handle for a bookmark (runtime-only, never serialized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookmarkId(pub Uuid);

impl BookmarkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookmarkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Seconds from video start
    pub time: f64,
    pub label: String,
}

impl Bookmark {
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }

    pub fn bucket(&self) -> TimeBucket {
        TimeBucket::of(self.time)
    }
}

/// 0.1 s quantization used to detect near-duplicate bookmarks.
///
/// Stored as whole tenths so equality is exact: `floor(time * 10)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeBucket(pub i64);

impl TimeBucket {
    pub fn of(time: f64) -> Self {
        Self((time * 10.0).floor() as i64)
    }

    /// Bucket start in seconds (`floor(time * 10) / 10`).
    pub fn seconds(&self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}s", self.seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_floors_to_tenths() {
        assert_eq!(TimeBucket::of(1.23), TimeBucket::of(1.29));
        assert_ne!(TimeBucket::of(1.29), TimeBucket::of(1.31));
        assert_eq!(TimeBucket::of(4.0).seconds(), 4.0);
        assert_eq!(TimeBucket::of(12.57).to_string(), "12.5s");
    }
}
