/// Errors raised by the engine.
///
/// Validation failures are never reported through this type; they are a
/// [`crate::validator::ValidationResult`] with `is_valid == false`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Unknown validator: {0}")]
    UnknownValidator(String),

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Value store error: {0}")]
    Store(String),
}

impl CoreError {
    /// Whether the option set itself is broken (bad options or a name that
    /// does not resolve), as opposed to a collaborator failing to answer.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::UnknownRule(_) | Self::UnknownValidator(_)
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(format!("invalid options: {err}"))
    }
}
