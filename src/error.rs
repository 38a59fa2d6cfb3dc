//! Error taxonomy at the command boundary
//!
//! Validation and empty-result cases carry user-facing text and never touch
//! the store; upstream failures are logged and reported generically.

use thiserror::Error;

/// Outcome classification for a command invocation.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bad user input; rejected before any store mutation
    #[error("{0}")]
    Validation(String),

    /// A history or drop query matched nothing — informational, not a failure
    #[error("No matching records!")]
    EmptyResult,

    /// The user did not confirm a destructive drop in time; implicit cancel
    #[error("Disabling drop log request. You didn't reply in time!")]
    ConfirmationTimeout,

    /// Store or platform API failure; logged, reported generically, not retried
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl BotError {
    /// Message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            BotError::Upstream(_) => {
                "Something went wrong talking to the backend, please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_passes_through() {
        let err = BotError::Validation("You cannot pull a shot with zero or negative weight!".into());
        assert_eq!(
            err.user_message(),
            "You cannot pull a shot with zero or negative weight!"
        );
    }

    #[test]
    fn test_upstream_message_is_generic() {
        let err = BotError::Upstream(anyhow::anyhow!("airtable 503"));
        assert!(!err.user_message().contains("503"));
    }
}
