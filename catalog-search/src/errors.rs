use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned while compiling and executing catalog searches.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A required collaborator or argument was missing or unusable.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The phrase parser rejected a filter or facet expression.
    #[error("failed to parse expression: {message}")]
    Parse { message: String },

    /// The index search provider failed to execute a request.
    #[error("search provider error: {message}")]
    Provider { message: Cow<'static, str> },

    /// Configuration was readable but semantically wrong.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A field mapping pattern failed to compile.
    #[error("invalid field mapping pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration file was not valid TOML for [`crate::config::CompilerConfig`].
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Convenience helper for the missing-collaborator case.
    pub fn missing(what: &str) -> Self {
        Self::InvalidArgument {
            message: format!("{what} is not set"),
        }
    }

    /// Build a parse error from any displayable cause.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Build a provider error from any displayable cause.
    pub fn provider(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
