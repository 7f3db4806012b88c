//! Language tag normalization.
//!
//! Static site generators emit whatever the author wrote after the code fence
//! (`sh`, `yml`, `ex`), while highlighters expect one canonical name per grammar.

use std::collections::HashMap;

/// Built-in aliases from raw tag to canonical highlighter tag.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    // Shell variants
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    // Data formats
    ("yml", "yaml"),
    ("dockerfile", "docker"),
    // Elixir variants
    ("ex", "elixir"),
    ("exs", "elixir"),
    ("eex", "elixir"),
    ("heex", "elixir"),
    // JavaScript variants
    ("ts", "typescript"),
    ("js", "javascript"),
    ("rb", "ruby"),
    ("py", "python"),
    ("rs", "rust"),
    ("md", "markdown"),
    // Markup variants
    ("html", "markup"),
    ("xml", "markup"),
    ("svg", "markup"),
    // Plain text variants
    ("txt", "plaintext"),
    ("text", "plaintext"),
    ("plain", "plaintext"),
];

/// Class prefix highlighters use to pick a grammar.
pub const LANGUAGE_CLASS_PREFIX: &str = "language-";

/// Normalize a raw language tag using the built-in alias table.
///
/// The tag is lowercased first; tags without an alias pass through lowercased.
#[must_use]
pub fn normalize_language(raw: &str) -> String {
    let lower = raw.to_lowercase();
    builtin_alias(&lower).map_or(lower, str::to_owned)
}

fn builtin_alias(lower: &str) -> Option<&'static str> {
    BUILTIN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| *canonical)
}

/// Alias table with configured additions layered over the built-ins.
#[derive(Debug, Clone, Default)]
pub struct LanguageAliases {
    extra: HashMap<String, String>,
}

impl LanguageAliases {
    /// Table with only the built-in aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add configured aliases. Keys are matched case-insensitively and take
    /// precedence over built-in entries.
    #[must_use]
    pub fn with_extra<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (alias, canonical) in aliases {
            self.extra.insert(
                alias.as_ref().to_lowercase(),
                canonical.as_ref().to_lowercase(),
            );
        }
        self
    }

    /// Normalize a raw language tag.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let lower = raw.to_lowercase();
        if let Some(canonical) = self.extra.get(&lower) {
            return canonical.clone();
        }
        builtin_alias(&lower).map_or(lower, str::to_owned)
    }
}

/// Language named by a `language-*` class, if any.
pub fn language_from_classes<'a>(mut classes: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    classes.find_map(|class| {
        class
            .strip_prefix(LANGUAGE_CLASS_PREFIX)
            .filter(|lang| !lang.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_builtin_aliases() {
        for (alias, canonical) in BUILTIN_ALIASES {
            assert_eq!(normalize_language(alias), *canonical, "alias {alias}");
        }
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(normalize_language("SH"), "bash");
        assert_eq!(normalize_language("Dockerfile"), "docker");
    }

    #[test]
    fn test_normalize_unknown_passes_through_lowercased() {
        assert_eq!(normalize_language("Haskell"), "haskell");
        assert_eq!(normalize_language("rust"), "rust");
        assert_eq!(normalize_language(""), "");
    }

    #[test]
    fn test_configured_alias_overrides_builtin() {
        let aliases = LanguageAliases::new().with_extra([("sh", "shell-session"), ("Tf", "hcl")]);
        assert_eq!(aliases.normalize("sh"), "shell-session");
        assert_eq!(aliases.normalize("tf"), "hcl");
        assert_eq!(aliases.normalize("yml"), "yaml");
        assert_eq!(aliases.normalize("Go"), "go");
    }

    #[test]
    fn test_language_from_classes() {
        let classes = ["highlight", "language-rust"];
        assert_eq!(language_from_classes(classes.into_iter()), Some("rust"));
        let classes = ["language-", "plain"];
        assert_eq!(language_from_classes(classes.into_iter()), None);
    }
}
