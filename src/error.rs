use thiserror::Error;

/// Every failure the client surfaces. The `Display` text is what the user
/// sees in the notice bar, so keep it short and human.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("{0}")]
    LoadFailed(String),

    #[error("No questions available for this test. Please contact your administrator.")]
    NoQuestionsAvailable,

    #[error("Test ID could not be determined. Please try again.")]
    NoTestId,

    #[error("No answers collected. Please try again.")]
    NoAnswers,

    #[error("Invalid response from server. Please try again.")]
    InvalidServerResponse,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Only this kind forces the app back to the login screen.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_server_message_verbatim() {
        let err = ClientError::Auth("No active account found".to_string());
        assert_eq!(err.to_string(), "No active account found");

        let err = ClientError::Request {
            status: 400,
            message: "Failed to submit test".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to submit test");
    }

    #[test]
    fn only_session_expired_is_flagged() {
        assert!(ClientError::SessionExpired.is_session_expired());
        assert!(!ClientError::NoTestId.is_session_expired());
        assert!(!ClientError::Network("down".into()).is_session_expired());
    }
}
