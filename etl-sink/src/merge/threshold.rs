/// Batch size at which a merge flush of a destination is requested.
///
/// The check is edge-triggered per registration: every registration that leaves the batch at or
/// above the threshold requests one merge flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeThreshold {
    /// Size-based merge flushes are disabled.
    Disabled,
    /// A merge flush is requested once a batch holds at least this many entries.
    Records(i64),
}

impl MergeThreshold {
    /// Value of the configuration setting that disables the threshold.
    pub const DISABLED_SENTINEL: i64 = -1;

    /// Creates a threshold from its configuration value, where only `-1` disables it.
    pub fn from_config_value(value: i64) -> Self {
        if value == Self::DISABLED_SENTINEL {
            MergeThreshold::Disabled
        } else {
            MergeThreshold::Records(value)
        }
    }

    /// Returns `true` if a batch of `batch_size` entries must be merged.
    pub fn is_reached(&self, batch_size: u64) -> bool {
        match self {
            MergeThreshold::Disabled => false,
            // Sizes beyond `i64::MAX` are above any threshold.
            MergeThreshold::Records(threshold) => {
                i64::try_from(batch_size).map_or(true, |size| size >= *threshold)
            }
        }
    }
}
