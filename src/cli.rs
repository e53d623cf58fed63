//! CLI: catalog → three generated files in a destination directory.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::{Catalog, GenConfig, GenError};

/// Environment variable holding the tracing filter (e.g. `irio_gen=debug`).
pub const LOG_ENV: &str = "IRIO_GEN_LOG";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate IR node import/export code and the opcode lexer table
#[derive(Parser, Debug)]
#[command(name = "irio-gen")]
pub struct CommandLineInterface {
    /// specification name (accepted for build-script compatibility, ignored)
    spec_name: String,

    /// directory receiving gen_irio_export.inl, gen_irio_import.inl and gen_irio_lex.inl
    dest_dir: PathBuf,

    /// JSON catalog file(s) to use instead of the built-in libFirm catalog.
    /// May be literal paths or quoted glob patterns
    #[arg(long, num_args = 1..)]
    catalog: Vec<String>,

    /// additional node types to skip entirely
    #[arg(long, num_args = 1..)]
    skip: Vec<String>,

    /// additional node types whose import code is written by hand
    #[arg(long, num_args = 1..)]
    custom: Vec<String>,

    /// fail when an attribute type has no codec
    #[arg(long, default_value_t = false)]
    deny_unsupported: bool,

    /// print the normalized node descriptions as JSON to stdout
    #[arg(long, default_value_t = false)]
    dump_normalized: bool,

    /// print the input catalog as JSON to stdout
    #[arg(long, default_value_t = false)]
    dump_catalog: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    fn config(&self) -> GenConfig {
        let config = GenConfig::default().deny_unsupported(self.deny_unsupported);
        let config = self.skip.iter().fold(config, |c, name| c.skip(name.clone()));
        self.custom.iter().fold(config, |c, name| c.custom(name.clone()))
    }

    fn load_catalog(&self) -> Result<Catalog> {
        if self.catalog.is_empty() {
            return Ok(crate::firm::catalog()?);
        }
        let paths = resolve_file_path_patterns(&self.catalog)?;
        Ok(Catalog::load_files(&paths)?)
    }

    pub fn run(&self) -> Result<()> {
        tracing::debug!(spec = %self.spec_name, dest = %self.dest_dir.display(), "starting");
        let catalog = self.load_catalog()?;
        if self.dump_catalog {
            println!("{}", catalog.to_json_pretty()?);
        }

        let generation = match crate::generate(&catalog, &self.config()) {
            Ok(generation) => generation,
            Err(GenError::UnsupportedTypes { diagnostics }) => {
                for diagnostic in &diagnostics {
                    eprintln!("{} {diagnostic}", "error:".red().bold());
                }
                anyhow::bail!("{} attribute(s) have unsupported types", diagnostics.len());
            }
            Err(error) => return Err(error.into()),
        };

        for diagnostic in generation.diagnostics.iter() {
            eprintln!("{} {diagnostic}", "warning:".yellow().bold());
        }
        if self.dump_normalized {
            let json = serde_json::to_string_pretty(generation.preprocessed.nodes())
                .context("failed to serialize normalized nodes")?;
            println!("{json}");
        }

        let written = generation
            .write_to(&self.dest_dir)
            .with_context(|| format!("failed to write artifacts to {}", self.dest_dir.display()))?;
        eprintln!(
            "{} {} files in {} ({} node types, {} warning(s))",
            "generated".green().bold(),
            written.len(),
            self.dest_dir.display(),
            generation.preprocessed.nodes().len(),
            generation.diagnostics.len(),
        );
        Ok(())
    }
}

/// Logs go to stderr; stdout is reserved for the JSON dumps.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
            // glob yields alphabetical order already; keep it explicit for merge order
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
