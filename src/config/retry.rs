use serde::{Deserialize, Serialize};

/// Retry schedule for async job polling.
///
/// The wait before the k-th retry is `wait * back_off^(k - 1)` seconds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Number of retries after the initial attempt. TOML: `async_retry.times`. Default: `12`.
    #[serde(default = "default_times")]
    pub times: usize,

    /// Wait before the first retry, in seconds. TOML: `async_retry.wait`. Default: `1.0`.
    #[serde(default = "default_wait")]
    pub wait: f64,

    /// Multiplier applied to the wait after every retry. TOML: `async_retry.back_off`. Default: `1.5`.
    #[serde(default = "default_back_off")]
    pub back_off: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            times: default_times(),
            wait: default_wait(),
            back_off: default_back_off(),
        }
    }
}

fn default_times() -> usize {
    12
}

fn default_wait() -> f64 {
    1.0
}

fn default_back_off() -> f64 {
    1.5
}
