use thiserror::Error;

/// Message shown for any transport-level failure
pub const TRANSPORT_USER_MESSAGE: &str =
    "Une erreur est survenue lors de la communication avec le serveur.";

/// Message shown when an authenticated operation runs without a token
pub const NOT_SIGNED_IN_MESSAGE: &str = "Veuillez vous connecter.";

/// prestatrack error types
#[derive(Error, Debug)]
pub enum PrestaError {
    /// Input rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// HTTP request failed or response could not be decoded
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("{0}")]
    Backend(String),

    /// Session file could not be read or written
    #[error("session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Failed to parse user input or cached JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrestaError {
    /// Text surfaced to the user in status messages.
    /// Transport details stay in the log; everything else is shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => TRANSPORT_USER_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn not_signed_in() -> Self {
        Self::Validation(NOT_SIGNED_IN_MESSAGE.to_string())
    }

    /// Whether the user can fix this by correcting their input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for prestatrack
pub type Result<T> = std::result::Result<T, PrestaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_is_verbatim() {
        let err = PrestaError::Validation("Veuillez sélectionner un mode de règlement.".into());
        assert_eq!(err.to_string(), "Veuillez sélectionner un mode de règlement.");
        assert!(err.is_validation());
    }

    #[test]
    fn test_backend_message_is_verbatim() {
        let err = PrestaError::Backend("Utilisateur non autorisé".into());
        assert_eq!(err.user_message(), "Utilisateur non autorisé");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_transport_user_message_is_generic() {
        let err = PrestaError::Transport("connection refused".into());
        assert_eq!(err.user_message(), TRANSPORT_USER_MESSAGE);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PrestaError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
