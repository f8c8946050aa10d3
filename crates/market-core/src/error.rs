use thiserror::Error;

/// Classified outcome of a failed provider call.
///
/// The cascade matches on the variant to decide between retrying, widening
/// the window, or abandoning the provider for the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Provider explicitly signalled throttling. Never retried.
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    /// Network, timeout or decode hiccup. Retried within the current window.
    #[error("Transient failure from {provider}: {message}")]
    Transient { provider: String, message: String },

    /// Well-formed but empty answer (unknown or delisted ticker).
    #[error("No data from {provider}")]
    DataAbsent { provider: String },

    /// A single row failed to parse. Adapters skip these rows.
    #[error("Malformed row from {provider}: {detail}")]
    MalformedRow { provider: String, detail: String },
}

impl FetchError {
    pub fn rate_limited(provider: &str) -> Self {
        Self::RateLimited {
            provider: provider.to_string(),
        }
    }

    pub fn transient(provider: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn data_absent(provider: &str) -> Self {
        Self::DataAbsent {
            provider: provider.to_string(),
        }
    }

    pub fn malformed(provider: &str, detail: impl Into<String>) -> Self {
        Self::MalformedRow {
            provider: provider.to_string(),
            detail: detail.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Only transient failures are worth another attempt against the same provider.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classify a free-text provider error by its throttling signatures.
    pub fn classify_message(provider: &str, message: &str) -> Self {
        let msg = message.to_lowercase();
        const SIGNATURES: [&str; 6] = [
            "yfratelimiterror",
            "rate limit",
            "ratelimit",
            "too many requests",
            "too many request",
            "http 429",
        ];
        if SIGNATURES.iter().any(|s| msg.contains(s)) {
            Self::rate_limited(provider)
        } else {
            Self::transient(provider, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit_signatures() {
        for msg in [
            "YFRateLimitError('Too Many Requests')",
            "HTTP 429 from upstream",
            "You hit the rate limit",
            "Too many requests. Rate limited. Try after a while.",
        ] {
            assert!(FetchError::classify_message("yahoo", msg).is_rate_limited(), "{msg}");
        }
    }

    #[test]
    fn test_classify_other_messages_as_transient() {
        let err = FetchError::classify_message("yahoo", "connection reset by peer");
        assert!(err.is_retryable());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(!FetchError::rate_limited("p").is_retryable());
        assert!(!FetchError::data_absent("p").is_retryable());
        assert!(!FetchError::malformed("p", "bad close").is_retryable());
        assert!(FetchError::transient("p", "timeout").is_retryable());
    }
}
