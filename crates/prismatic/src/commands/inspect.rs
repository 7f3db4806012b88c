//! `prismatic inspect` command implementation.

use std::path::PathBuf;

use clap::Args;
use prismatic_config::Config;
use prismatic_diagrams::detect::{self, Detection};
use prismatic_dom::Document;
use prismatic_highlight::{CodeBlockInfo, CodeBlockNormalizer, LanguageAliases};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the inspect command.
#[derive(Args)]
pub(crate) struct InspectArgs {
    /// HTML page to inspect.
    input: PathBuf,

    /// Path to configuration file (default: auto-discover prismatic.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl InspectArgs {
    /// Execute the inspect command. The page is only read.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the input cannot be read or parsed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let html = std::fs::read_to_string(&self.input)?;
        let doc = Document::parse(&html)?;

        let normalizer = CodeBlockNormalizer::new()
            .with_aliases(LanguageAliases::new().with_extra(&config.highlight.aliases));
        let blocks = normalizer.describe(&doc);
        let candidates = detect::find_candidates(&doc);

        let output = Output::stdout();
        output.heading(&format!("Code blocks ({})", blocks.len()));
        for block in &blocks {
            let (label, detail) = block_line(block);
            output.item(&label, &detail);
        }

        output.heading(&format!("Diagrams ({})", candidates.len()));
        for candidate in &candidates {
            let kind = match candidate.detection {
                Detection::Explicit => "tagged",
                Detection::Heuristic => "detected",
            };
            output.item(first_line(&candidate.source), &format!("({kind})"));
        }

        Ok(())
    }
}

fn block_line(block: &CodeBlockInfo) -> (String, String) {
    let label = match &block.raw {
        Some(raw) if *raw != block.canonical => format!("{raw} -> {}", block.canonical),
        _ => block.canonical.clone(),
    };
    let noun = if block.lines == 1 { "line" } else { "lines" };
    (label, format!("({} {noun})", block.lines))
}

fn first_line(source: &str) -> &str {
    source.lines().next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_block_line_shows_alias_mapping() {
        let block = CodeBlockInfo {
            raw: Some("sh".to_owned()),
            canonical: "bash".to_owned(),
            lines: 3,
        };
        assert_eq!(
            block_line(&block),
            ("sh -> bash".to_owned(), "(3 lines)".to_owned())
        );
    }

    #[test]
    fn test_block_line_canonical_only() {
        let block = CodeBlockInfo {
            raw: None,
            canonical: "rust".to_owned(),
            lines: 1,
        };
        assert_eq!(
            block_line(&block),
            ("rust".to_owned(), "(1 line)".to_owned())
        );
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("graph TD\n  A-->B"), "graph TD");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_execute_reads_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.html");
        let html = "<pre><code data-lang=\"sh\">ls</code></pre><pre>graph TD\nA--&gt;B</pre>";
        std::fs::write(&input, html).unwrap();
        let config = dir.path().join("prismatic.toml");
        std::fs::write(&config, "").unwrap();

        let args = InspectArgs {
            input: input.clone(),
            config: Some(config),
        };
        args.execute().unwrap();

        assert_eq!(std::fs::read_to_string(&input).unwrap(), html);
    }
}
