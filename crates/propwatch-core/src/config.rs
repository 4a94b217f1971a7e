#![forbid(unsafe_code)]

//! Inspector limits and their environment overrides.
//!
//! | Variable                | Field                | Default  |
//! |-------------------------|----------------------|----------|
//! | `PROPWATCH_MAX_ROWS`    | `max_rows`           | 100 000  |
//! | `PROPWATCH_BULK_DEPTH`  | `default_bulk_depth` | 10       |
//!
//! Unparseable or zero values are ignored with a warning.

/// Environment variable overriding [`InspectorConfig::max_rows`].
pub const ENV_MAX_ROWS: &str = "PROPWATCH_MAX_ROWS";
/// Environment variable overriding [`InspectorConfig::default_bulk_depth`].
pub const ENV_BULK_DEPTH: &str = "PROPWATCH_BULK_DEPTH";

/// Tuning knobs for a draw pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig {
    /// Rows drawn before the pass stops descending.
    /// Default: 100 000
    pub max_rows: usize,

    /// Levels a shift-toggle opens or closes when no digit is held.
    /// Default: 10
    pub default_bulk_depth: usize,

    /// Largest inline depth the item popup offers.
    /// Default: 9
    pub inline_depth_max: u8,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            max_rows: 100_000,
            default_bulk_depth: 10,
            inline_depth_max: 9,
        }
    }
}

impl InspectorConfig {
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    #[must_use]
    pub fn with_default_bulk_depth(mut self, depth: usize) -> Self {
        self.default_bulk_depth = depth;
        self
    }

    #[must_use]
    pub fn with_inline_depth_max(mut self, depth: u8) -> Self {
        self.inline_depth_max = depth.max(1);
        self
    }

    /// Defaults with overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(rows) = positive_override(&get_env, ENV_MAX_ROWS) {
            config.max_rows = rows;
        }
        if let Some(depth) = positive_override(&get_env, ENV_BULK_DEPTH) {
            config.default_bulk_depth = depth;
        }
        config
    }
}

fn positive_override<F>(get_env: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = get_env(key)?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => {
            crate::debug!(target: "propwatch::config", key, value, "environment override");
            Some(value)
        }
        _ => {
            crate::warn!(target: "propwatch::config", key, value = %raw, "ignoring invalid override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = InspectorConfig::default();
        assert_eq!(config.max_rows, 100_000);
        assert_eq!(config.default_bulk_depth, 10);
        assert_eq!(config.inline_depth_max, 9);
    }

    #[test]
    fn env_overrides_apply() {
        let config = InspectorConfig::from_env_with(lookup(&[
            (ENV_MAX_ROWS, "500"),
            (ENV_BULK_DEPTH, " 3 "),
        ]));
        assert_eq!(config.max_rows, 500);
        assert_eq!(config.default_bulk_depth, 3);
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config = InspectorConfig::from_env_with(lookup(&[
            (ENV_MAX_ROWS, "lots"),
            (ENV_BULK_DEPTH, "0"),
        ]));
        assert_eq!(config, InspectorConfig::default());
    }

    #[test]
    fn builder_clamps_inline_depth() {
        let config = InspectorConfig::default()
            .with_max_rows(10)
            .with_inline_depth_max(0);
        assert_eq!(config.max_rows, 10);
        assert_eq!(config.inline_depth_max, 1);
    }

    #[cfg(feature = "tracing")]
    #[tracing_test::traced_test]
    #[test]
    fn invalid_override_is_logged() {
        let _ = InspectorConfig::from_env_with(lookup(&[(ENV_MAX_ROWS, "-1")]));
        assert!(logs_contain("ignoring invalid override"));
    }
}
