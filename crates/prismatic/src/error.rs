//! CLI error types.

use prismatic_config::ConfigError;
use prismatic_dom::DomError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse HTML: {0}")]
    Html(#[from] DomError),
}
