//! Driver configuration.

use std::time::Duration;

/// Default ceiling for a single `pump()` call.
pub const DEFAULT_PUMP_TIME_BUDGET: Duration = Duration::from_secs(2);

/// Where text written during a parse is spliced into the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Splice pending writes right after the token whose processing issued
    /// them, ahead of the rest of the active chunk.
    #[default]
    SpliceAtToken,
    /// Leave pending writes until the active tokenization pass ends (chunk
    /// exhausted or an explicit suspension/injection request).
    Deferred,
}

#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Wall-clock ceiling for one `pump()` call; exceeding it is fatal.
    pub pump_time_budget: Duration,
    pub write_policy: WritePolicy,
    /// Treat `<noscript>` content as raw text.
    pub scripting_enabled: bool,
    /// Coalesce adjacent character tokens into single text appends.
    pub coalesce_text: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pump_time_budget: DEFAULT_PUMP_TIME_BUDGET,
            write_policy: WritePolicy::default(),
            scripting_enabled: true,
            coalesce_text: true,
        }
    }
}
