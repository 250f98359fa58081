use serde::{Deserialize, Serialize};

/// SerdesOptions configures how results are rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerdesOptions {
    /// ms_resolution renders timestamp keys in milliseconds instead of seconds.
    pub ms_resolution: bool,

    /// parallel_threshold renders the series of a result in parallel once the
    /// result holds more than this many series. Zero disables it.
    pub parallel_threshold: usize,

    /// strict_partial_ids fails the final flush when a partial series can not
    /// be resolved to an identity, rather than skipping it.
    pub strict_partial_ids: bool,
}

impl SerdesOptions {
    /// parallel_for returns true when a result of `series` series should be
    /// rendered in parallel.
    pub fn parallel_for(&self, series: usize) -> bool {
        self.parallel_threshold > 0 && series > self.parallel_threshold
    }
}

#[cfg(test)]
mod tests {
    use crate::options::SerdesOptions;

    #[test]
    fn test_defaults_from_json() {
        let opts: SerdesOptions = serde_json::from_str(r#"{"ms_resolution": true}"#).unwrap();
        assert!(opts.ms_resolution);
        assert_eq!(opts.parallel_threshold, 0);
        assert!(!opts.strict_partial_ids);
    }

    #[test]
    fn test_parallel_for() {
        let opts = SerdesOptions {
            parallel_threshold: 2,
            ..Default::default()
        };
        assert!(!opts.parallel_for(2));
        assert!(opts.parallel_for(3));
        assert!(!SerdesOptions::default().parallel_for(100));
    }
}
