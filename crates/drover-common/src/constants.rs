//! Common constants used across Drover

/// Default seconds between iterations when the profile does not set one
pub const DEFAULT_LOOP_DELAY_SECS: u64 = 30;

/// Sleep applied after an iteration that performed no action (skip or
/// failure), deliberately longer than the normal delay to avoid
/// hot-looping against rate-limited providers
pub const FALLBACK_DELAY_SECS: u64 = 60;

/// Countdown before the loop takes its first autonomous action, giving
/// an operator a window to abort
pub const STARTUP_COUNTDOWN_SECS: u64 = 5;

/// Default number of items requested when replenishing the reaction queue
pub const DEFAULT_REPLENISH_COUNT: u64 = 10;

/// Default field used to extract a dedup identifier from queued items
pub const DEFAULT_ID_FIELD: &str = "id";

/// Common provider identifiers
pub mod providers {
    pub const OPENAI: &str = "openai";
    pub const ANTHROPIC: &str = "anthropic";
    pub const TWITTER: &str = "twitter";
    pub const SOLANA: &str = "solana";
}

/// Default timeout values in seconds
pub mod timeouts {
    pub const DEFAULT_HTTP_TIMEOUT: u64 = 30;
    pub const DEFAULT_LLM_TIMEOUT: u64 = 120;
}
