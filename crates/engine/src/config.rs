use skilldex_render::SchedulerConfig;
use skilldex_search::ScoreParams;

/// Result-list cache entries per session. Each entry is one ranked list
/// for a `(category, query, context)` tuple.
pub const DEFAULT_RESULT_CACHE_CAPACITY: usize = 64;

/// Env override for the result cache capacity.
pub const RESULT_CACHE_CAPACITY_ENV: &str = "SKILLDEX_RESULT_CACHE_CAPACITY";

const MAX_RESULT_CACHE_CAPACITY: usize = 4096;

/// Per-session tuning. Everything here is a knob, not a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub cache_capacity: usize,
    pub scheduler: SchedulerConfig,
    pub score: ScoreParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_RESULT_CACHE_CAPACITY,
            scheduler: SchedulerConfig::default(),
            score: ScoreParams::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults with the cache capacity taken from the environment when a
    /// usable value is set.
    pub fn from_env() -> Self {
        let raw = std::env::var(RESULT_CACHE_CAPACITY_ENV).ok();
        Self {
            cache_capacity: parse_cache_capacity(raw.as_deref(), DEFAULT_RESULT_CACHE_CAPACITY),
            ..Self::default()
        }
    }
}

fn parse_cache_capacity(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_RESULT_CACHE_CAPACITY)
}
