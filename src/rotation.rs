use serde::{Deserialize, Serialize};
use std::time::Duration;

const MEGABYTE: u64 = 1024 * 1024;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Size used when `max_size_mb` is zero.
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// Rotation policy for the log file.
///
/// Zero `max_backups` keeps every backup and zero `max_age_days` never prunes
/// by age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Maximum size of the active file in megabytes before it is rotated.
    pub max_size_mb: u64,
    /// Maximum number of rotated files to keep.
    pub max_backups: usize,
    /// Maximum number of days to keep rotated files.
    pub max_age_days: u64,
    /// Gzip rotated files.
    pub compress: bool,
}

impl RotationPolicy {
    /// Create a rotation policy.
    pub fn new(max_size_mb: u64, max_backups: usize, max_age_days: u64, compress: bool) -> Self {
        Self {
            max_size_mb,
            max_backups,
            max_age_days,
            compress,
        }
    }

    /// Size limit of the active file in bytes.
    pub fn max_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(MEGABYTE)
    }

    /// Number of backups to keep, `None` when unbounded.
    pub fn backup_limit(&self) -> Option<usize> {
        (self.max_backups > 0).then_some(self.max_backups)
    }

    /// Maximum backup age, `None` when unbounded.
    pub fn age_limit(&self) -> Option<Duration> {
        (self.max_age_days > 0)
            .then(|| Duration::from_secs(self.max_age_days.saturating_mul(SECONDS_PER_DAY)))
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: 3,
            max_age_days: 30,
            compress: true,
        }
    }
}
