//! `prismatic render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use prismatic_config::{CliSettings, Config, DiagramTheme};
use prismatic_dom::Page;

use crate::error::CliError;
use crate::output::Output;
use crate::pipeline::{Pipeline, PipelineReport};

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// HTML page to process.
    input: PathBuf,

    /// Write the processed page here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover prismatic.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "PRISMATIC_KROKI_URL")]
    kroki_url: Option<String>,

    /// Diagram theme: auto, dark or light (overrides config).
    #[arg(long)]
    theme: Option<DiagramTheme>,

    /// Leave diagram blocks untouched.
    #[arg(long)]
    no_diagrams: bool,

    /// HTML fragment appended to the page after the first pass (repeatable).
    /// Appended content is processed once the page settles.
    #[arg(long = "inject", value_name = "FILE")]
    inject: Vec<PathBuf>,

    /// Enable verbose output (engine loading and per-diagram logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a file cannot be read or
    /// written, or the input is not parseable HTML.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            kroki_url: self.kroki_url,
            theme: self.theme,
            diagrams_enabled: self.no_diagrams.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.info(&format!("Using config: {}", path.display()));
        }

        // Read fragments up front so a missing file fails before any work.
        let fragments = self
            .inject
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let html = std::fs::read_to_string(&self.input)?;
        let page = Page::parse(&html)?;
        let pipeline = Pipeline::from_config(&config);

        let report = pipeline.run(&page).await;
        summarize(&output, &report);

        if !fragments.is_empty() {
            let mut changes = page.subscribe();
            for fragment in &fragments {
                page.append_html(fragment)?;
            }
            if let Some(report) = pipeline
                .observe(&page, &mut changes, config.observer.debounce())
                .await
            {
                output.info(&format!("Processed {} injected fragment(s)", fragments.len()));
                summarize(&output, &report);
            }
        }

        let rendered = page.to_html();
        match &self.output {
            Some(path) => {
                std::fs::write(path, rendered)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
            }
        }

        Ok(())
    }
}

fn summarize(output: &Output, report: &PipelineReport) {
    let normalize = &report.normalize;
    if normalize.tagged + normalize.classed + normalize.themed > 0 {
        output.info(&format!(
            "Code blocks: {} tagged, {} classed, {} themed",
            normalize.tagged, normalize.classed, normalize.themed
        ));
    }

    let Some(diagrams) = &report.diagrams else {
        return;
    };
    if let Some(err) = &diagrams.load_error {
        output.warning(&format!(
            "Diagram engine unavailable ({err}); diagrams left in source view"
        ));
    }
    if !diagrams.rendered.is_empty() || !diagrams.failed.is_empty() {
        output.info(&format!(
            "Diagrams: {} rendered ({} cached), {} failed",
            diagrams.rendered.len(),
            diagrams.cache_hits,
            diagrams.failed.len()
        ));
    }
    for (id, err) in &diagrams.failed {
        output.warning(&format!("  {id}: {err}"));
    }
}
