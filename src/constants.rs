//! Global Constants
//!
//! Centralized constants for provider endpoints, model identifiers, and tuning.
//! All magic numbers and literal wire-contract strings should be defined here.

/// Gemini provider constants
pub mod gemini {
    /// REST endpoint base for the Generative Language API
    pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Default model when no override is configured
    pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

    /// Fixed fallback model identifiers tried on model-related 400/404 errors,
    /// in order (flash tier first, then pro tier)
    pub const FALLBACK_MODELS: [&str; 2] = ["gemini-1.5-flash", "gemini-1.5-pro"];

    /// Request timeout in seconds
    pub const TIMEOUT_SECS: u64 = 25;
}

/// DeepSeek provider constants
pub mod deepseek {
    /// Preferred chat-completion endpoint
    pub const PRIMARY_URL: &str = "https://api.deepseek.com/v1/chat/completions";

    /// Legacy endpoint path, retried when the primary returns 404
    pub const LEGACY_URL: &str = "https://api.deepseek.com/chat/completions";

    /// Default model (reasoning-capable variant)
    pub const DEFAULT_MODEL: &str = "deepseek-reasoner";

    /// Alternate model swapped in when the selected model 404s
    pub const ALT_MODEL: &str = "deepseek-chat";

    /// Request timeout in seconds
    pub const TIMEOUT_SECS: u64 = 25;
}

/// Web search provider constants
pub mod search {
    /// SerpAPI Google Search endpoint
    pub const API_URL: &str = "https://serpapi.com/search";

    /// Number of top-ranked organic results to consider
    pub const TOP_N: usize = 5;

    /// Request timeout in seconds
    pub const TIMEOUT_SECS: u64 = 15;

    /// Cached query results older than this are treated as misses
    pub const CACHE_TTL_SECS: i64 = 600;

    /// Vendor domains whose datasheet hits count as a genuine-part signal
    pub const VENDOR_DOMAINS: [&str; 9] = [
        "microchip.com",
        "ti.com",
        "st.com",
        "nxp.com",
        "analog.com",
        "infineon.com",
        "onsemi.com",
        "renesas.com",
        "maximintegrated.com",
    ];

    /// Keywords in titles/snippets that indicate a counterfeit report
    pub const COUNTERFEIT_KEYWORDS: [&str; 3] = ["fake", "counterfeit", "clone"];
}

/// Webhook provider constants
pub mod webhook {
    /// Request timeout in seconds
    pub const TIMEOUT_SECS: u64 = 10;
}

/// Shared LLM request constants
pub mod llm {
    /// Sampling temperature for classification calls
    pub const TEMPERATURE: f32 = 0.2;

    /// Maximum characters of free-form LLM text kept as a verdict reason
    pub const REASON_MAX_CHARS: usize = 300;
}
