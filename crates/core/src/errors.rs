use thiserror::Error;

/// Unified error type for the entire coinlens-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data sources ────────────────────────────────────────────────
    #[error("Source unavailable ({provider}): {message}")]
    SourceUnavailable {
        provider: String,
        message: String,
    },

    #[error("No data points returned for {id} between {from} and {to}")]
    EmptyResult {
        id: String,
        from: String,
        to: String,
    },

    // ── Alignment / computation ─────────────────────────────────────
    #[error("Misaligned input: {0}")]
    MisalignedInput(String),

    #[error("Invalid window: 'from' ({from}) must be strictly before 'to' ({to})")]
    InvalidWindow {
        from: String,
        to: String,
    },

    // ── Request validation ──────────────────────────────────────────
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Output ──────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs so that
        // API keys never end up in logs. reqwest errors often contain full URLs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::SourceUnavailable {
            provider: "http".into(),
            message: sanitized,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
