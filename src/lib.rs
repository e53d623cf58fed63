//! Generator for the IR import/export code.
//!
//! catalog → [`preprocess`] (normalize every node) → [`emit`] (three
//! artifacts) → files. Everything is computed before anything is written.
pub mod catalog;
pub mod cli;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod firm;
pub mod normalize;
pub mod preprocess;

use std::path::{Path, PathBuf};

pub use catalog::Catalog;
pub use codec::{CodecTable, FIRM_CODECS};
pub use config::GenConfig;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use emit::{Artifact, ArtifactKind, Emitter};
pub use error::{GenError, Result};
pub use preprocess::Preprocessed;

/// Result of one full generation run.
#[derive(Debug)]
pub struct Generation {
    pub preprocessed: Preprocessed,
    pub artifacts: Vec<Artifact>,
    pub diagnostics: Diagnostics,
}

/// Runs the whole pipeline with the libFirm codecs.
pub fn generate(catalog: &Catalog, config: &GenConfig) -> Result<Generation> {
    generate_with(catalog, config, &FIRM_CODECS)
}

pub fn generate_with(catalog: &Catalog, config: &GenConfig, codecs: &CodecTable) -> Result<Generation> {
    let mut diagnostics = Diagnostics::new();
    let preprocessed = preprocess::preprocess(catalog, config, codecs, &mut diagnostics)?;
    if config.deny_unsupported && !diagnostics.is_empty() {
        return Err(GenError::UnsupportedTypes { diagnostics: diagnostics.into_vec() });
    }
    let artifacts = Emitter::new()?.render_all(&preprocessed)?;
    Ok(Generation { preprocessed, artifacts, diagnostics })
}

impl Generation {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&str> {
        self.artifacts.iter().find(|a| a.kind == kind).map(|a| a.contents.as_str())
    }

    /// Writes the artifacts into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let path = dir.join(artifact.kind.file_name());
            std::fs::write(&path, &artifact.contents)?;
            tracing::info!(path = %path.display(), bytes = artifact.contents.len(), "wrote artifact");
            written.push(path);
        }
        Ok(written)
    }
}
