//! User-facing messages for failed generations.

use crate::claude::ClaudeError;

/// Broad category of a generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Upstream quota or rate limit.
    Quota,
    /// Upstream rejected our credentials.
    Auth,
    /// Upstream could not be reached.
    Network,
    /// The model replied, but not with a design.
    Malformed,
    /// Anything else.
    Generic,
}

impl FailureKind {
    /// Classify by HTTP status and error text.
    #[must_use]
    pub fn classify(status: Option<u16>, text: &str) -> Self {
        let lower = text.to_lowercase();

        if status == Some(429)
            || status == Some(529)
            || lower.contains("429")
            || lower.contains("quota")
            || lower.contains("rate limit")
            || lower.contains("rate_limit")
            || lower.contains("overloaded")
        {
            return Self::Quota;
        }

        if matches!(status, Some(401 | 403))
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("authentication")
        {
            return Self::Auth;
        }

        if lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("network")
            || lower.contains("dns")
        {
            return Self::Network;
        }

        Self::Generic
    }

    /// Classify a Claude client error.
    #[must_use]
    pub fn from_claude(error: &ClaudeError) -> Self {
        if error.is_network() {
            return Self::Network;
        }
        match error {
            ClaudeError::Parse(_) | ClaudeError::EmptyResponse => Self::Malformed,
            other => Self::classify(other.status(), &other.to_string()),
        }
    }

    /// Message shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Quota => {
                "Our design service is busy right now. Please try again in a few minutes."
            }
            Self::Auth => {
                "The design service is temporarily unavailable. Our team has been notified."
            }
            Self::Network => {
                "We couldn't reach the design service. Please check your connection and try again."
            }
            Self::Malformed => {
                "The design came back in an unexpected format. Please try again or adjust your prompt."
            }
            Self::Generic => "Something went wrong while creating your design. Please try again.",
        }
    }

    /// Short label for logs and response bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quota => "quota",
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Malformed => "malformed",
            Self::Generic => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quota() {
        assert_eq!(FailureKind::classify(Some(429), ""), FailureKind::Quota);
        assert_eq!(
            FailureKind::classify(None, "You exceeded your current quota"),
            FailureKind::Quota
        );
        assert_eq!(
            FailureKind::classify(None, "Error 429: Too Many Requests"),
            FailureKind::Quota
        );
    }

    #[test]
    fn test_classify_auth() {
        assert_eq!(FailureKind::classify(Some(401), "nope"), FailureKind::Auth);
        assert_eq!(
            FailureKind::classify(None, "invalid x-api-key: API key not valid"),
            FailureKind::Auth
        );
    }

    #[test]
    fn test_classify_network_and_generic() {
        assert_eq!(
            FailureKind::classify(None, "operation timed out"),
            FailureKind::Network
        );
        assert_eq!(
            FailureKind::classify(None, "Connection refused"),
            FailureKind::Network
        );
        assert_eq!(
            FailureKind::classify(Some(500), "internal"),
            FailureKind::Generic
        );
    }

    #[test]
    fn test_from_claude() {
        assert_eq!(
            FailureKind::from_claude(&ClaudeError::RateLimited(30)),
            FailureKind::Quota
        );
        assert_eq!(
            FailureKind::from_claude(&ClaudeError::Unauthorized("Invalid API key".into())),
            FailureKind::Auth
        );
        assert_eq!(
            FailureKind::from_claude(&ClaudeError::EmptyResponse),
            FailureKind::Malformed
        );
        let overloaded = ClaudeError::Api {
            error_type: "overloaded_error".to_string(),
            message: "Overloaded".to_string(),
        };
        assert_eq!(FailureKind::from_claude(&overloaded), FailureKind::Quota);
    }

    #[test]
    fn test_messages_are_distinct() {
        let kinds = [
            FailureKind::Quota,
            FailureKind::Auth,
            FailureKind::Network,
            FailureKind::Malformed,
            FailureKind::Generic,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in kinds.iter().skip(i + 1) {
                assert_ne!(a.message(), b.message());
            }
        }
    }
}
