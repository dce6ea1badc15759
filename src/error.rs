//! Error types shared by the wrapping transform and the scope factories.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopedAmdError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopedAmdError {
    /// A plugin or build option has an illegal value or combination.
    #[error("invalid configuration for `{option}`: {reason}")]
    InvalidConfiguration { option: String, reason: String },

    /// Externals were collected but not through the AMD externals convention.
    #[error(
        "\"externalsType\" configuration must be set to \"amd\" when using {plugin} \
         (found \"{externals_type}\" with external dependencies: {})",
        dependencies.join(", ")
    )]
    ExternalsConfiguration {
        plugin: &'static str,
        externals_type: String,
        dependencies: Vec<String>,
    },

    #[error("target {0} not supported by ScopedAmdLibraryPlugin")]
    UnsupportedTarget(String),

    #[error("non-url root \"{0}\" must end with a \"/\"")]
    InvalidRoot(String),

    #[error("Invalid path {0}")]
    InvalidPath(String),

    #[error("failed loading {url}: {reason}")]
    Load { url: String, reason: String },

    /// Raised by a script engine while evaluating source text.
    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("Module \"{module}\" dependency \"{dependency}\" is missing from provided dependencies map")]
    MissingDependency { module: String, dependency: String },

    #[error("malformed AMD module: {0}")]
    MalformedModule(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ScopedAmdError {
    pub fn invalid_configuration(option: &str, reason: impl Into<String>) -> Self {
        ScopedAmdError::InvalidConfiguration {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    pub fn load(url: &str, reason: impl Into<String>) -> Self {
        ScopedAmdError::Load {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Configuration errors abort the build; everything else is scoped to one
    /// resolution or one load.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ScopedAmdError::InvalidConfiguration { .. }
                | ScopedAmdError::ExternalsConfiguration { .. }
                | ScopedAmdError::UnsupportedTarget(_)
                | ScopedAmdError::InvalidRoot(_)
        )
    }
}
