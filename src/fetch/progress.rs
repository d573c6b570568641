//! Download progress snapshots.

use std::fmt;

/// A snapshot of bytes received so far.
///
/// `total_bytes` is the declared response length; when the server did not
/// send one the total is unknown and so is `percent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub loaded_bytes: u64,
    pub total_bytes: Option<u64>,
    /// Completion in `0.0..=100.0`, present only when the total is known.
    pub percent: Option<f64>,
}

impl ProgressEvent {
    /// Builds a snapshot, deriving `percent` from the two counters.
    ///
    /// A declared total of zero counts as fully complete. Servers that send
    /// more bytes than they declared are clamped at 100%.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(loaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                (loaded_bytes as f64 / total as f64 * 100.0).min(100.0)
            }
        });
        Self {
            loaded_bytes,
            total_bytes,
            percent,
        }
    }

    /// Returns true when the declared total is known.
    #[must_use]
    pub fn is_length_known(&self) -> bool {
        self.total_bytes.is_some()
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.total_bytes, self.percent) {
            (Some(total), Some(percent)) => write!(
                f,
                "Downloaded {} / {} bytes ({percent:.1}%)",
                self.loaded_bytes, total
            ),
            _ => write!(f, "Downloaded {} bytes (size unknown)", self.loaded_bytes),
        }
    }
}
