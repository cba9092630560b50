use thiserror::Error;

/// Failure of one calendar load. Every variant is terminal for the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Failed to fetch calendar feed: {reason}")]
    Fetch { reason: String },

    #[error("Received data is not valid ICS calendar format: {0}")]
    Format(String),

    #[error("Failed to parse calendar data: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedErrorKind {
    Fetch,
    Format,
    Parse,
}

impl FeedError {
    pub fn fetch<S: Into<String>>(reason: S) -> Self {
        Self::Fetch {
            reason: reason.into(),
        }
    }

    pub fn format<S: Into<String>>(msg: S) -> Self {
        Self::Format(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    pub fn kind(&self) -> FeedErrorKind {
        match self {
            Self::Fetch { .. } => FeedErrorKind::Fetch,
            Self::Format(_) => FeedErrorKind::Format,
            Self::Parse(_) => FeedErrorKind::Parse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(FeedError::fetch("not found").kind(), FeedErrorKind::Fetch);
        assert_eq!(FeedError::format("x").kind(), FeedErrorKind::Format);
        assert_eq!(FeedError::parse("x").kind(), FeedErrorKind::Parse);
    }

    #[test]
    fn test_fetch_message_carries_reason() {
        let err = FeedError::fetch("404 Not Found");
        assert!(err.to_string().contains("404 Not Found"));
    }
}
