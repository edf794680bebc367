use thiserror::Error;

/// Every failure a dashboard action can end in.
///
/// None of these are retried automatically; the user re-triggers the action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Network failure or a non-success HTTP status without an error payload.
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with `success: false`.
    #[error("{message}")]
    Application {
        message: String,
        solution: Option<String>,
        tried_url: Option<String>,
    },

    /// The backend answered with a body this client cannot read.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
            solution: None,
            tried_url: None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Text shown to the user, with the remediation hint and the failing
    /// resource on their own lines when the backend supplied them.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Transport(msg) | Self::Decode(msg) => format!("Error: {msg}"),
            Self::Application {
                message,
                solution,
                tried_url,
            } => {
                let mut out = format!("Error: {message}");
                if let Some(solution) = solution {
                    out.push_str(&format!("\nSolution: {solution}"));
                }
                if let Some(url) = tried_url {
                    out.push_str(&format!("\nTried URL: {url}"));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_message_includes_hint_and_url() {
        let err = DashboardError::Application {
            message: "Site not verified".to_string(),
            solution: Some("Add the property in Search Console".to_string()),
            tried_url: Some("sc-domain:example.com".to_string()),
        };
        assert_eq!(
            err.user_message(),
            "Error: Site not verified\nSolution: Add the property in Search Console\nTried URL: sc-domain:example.com"
        );
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = DashboardError::validation("Please enter a domain");
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Please enter a domain");
    }
}
