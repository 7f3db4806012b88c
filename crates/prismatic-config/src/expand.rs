//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.
//!
//! Bare `$VAR` is left alone so literal dollar signs in URLs survive.

use crate::ConfigError;

/// Expand variable references in `value` using the process environment.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    expand_with(value, field, |name| std::env::var(name).ok())
}

/// Expand variable references in `value`, resolving names with `lookup`.
///
/// An unresolved `${VAR}` without a default is an error naming `field`.
pub(crate) fn expand_with(
    value: &str,
    field: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let expanded = shellexpand::env_with_context(value, |name| {
        lookup(name).map(Some).ok_or_else(|| Unset(name.to_owned()))
    })
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })?;

    tracing::debug!(field, "Expanded environment variables");
    Ok(expanded.into_owned())
}

/// Name of a variable with no value and no default.
struct Unset(String);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_expand_set_variable() {
        let lookup = env(&[("KROKI_HOST", "kroki.internal")]);
        let result = expand_with("https://${KROKI_HOST}:8000", "diagrams.kroki_url", lookup);
        assert_eq!(result.unwrap(), "https://kroki.internal:8000");
    }

    #[test]
    fn test_default_used_when_unset() {
        let result = expand_with("${KROKI_URL:-https://kroki.io}", "diagrams.kroki_url", env(&[]));
        assert_eq!(result.unwrap(), "https://kroki.io");
    }

    #[test]
    fn test_default_ignored_when_set() {
        let lookup = env(&[("THEME", "nord")]);
        let result = expand_with("${THEME:-github-dark}", "highlight.default_theme", lookup);
        assert_eq!(result.unwrap(), "nord");
    }

    #[test]
    fn test_unset_without_default_names_field() {
        let err = expand_with("${NOPE}", "diagrams.kroki_url", env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("NOPE"));
        assert!(message.contains("diagrams.kroki_url"));
    }

    #[test]
    fn test_bare_dollar_is_literal() {
        let result = expand_with("http://host/$path", "diagrams.kroki_url", env(&[]));
        assert_eq!(result.unwrap(), "http://host/$path");
    }

    #[test]
    fn test_process_environment_lookup() {
        let result = expand_env("${PRISMATIC_SURELY_UNSET_VAR:-fallback}", "test.field");
        assert_eq!(result.unwrap(), "fallback");
    }
}
