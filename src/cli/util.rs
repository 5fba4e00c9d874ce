//! CLI utility helpers

use prereq::{
    Curriculum, CurriculumDocument, CurriculumSession, EngineConfig, MarkOutcome, Result,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Curriculum file plus optional rule overrides
#[derive(clap::Args, Debug)]
pub struct CurriculumArgs {
    /// Curriculum file (.yaml, .yml or .json)
    pub curriculum: PathBuf,
    /// Engine rules file, replacing the curriculum's embedded `rules:`
    #[clap(long)]
    pub config: Option<PathBuf>,
}

impl CurriculumArgs {
    /// The document and the rules it should be read under
    pub fn document(&self) -> Result<(CurriculumDocument, EngineConfig)> {
        let document = CurriculumDocument::from_path(&self.curriculum)?;
        let config = match &self.config {
            Some(path) => EngineConfig::from_path(path)?,
            None => document.rules.clone().unwrap_or_default(),
        };
        Ok((document, config))
    }

    pub fn load(&self) -> Result<Arc<Curriculum>> {
        let (document, config) = self.document()?;
        Ok(Arc::new(Curriculum::new(document, &config)?))
    }
}

/// Build a session and mark `done` in it.
///
/// Names are retried until a pass marks nothing new, so their order does not
/// matter. Returns the names that could not be marked.
pub fn session_with(curriculum: Arc<Curriculum>, done: &[String]) -> (CurriculumSession, Vec<String>) {
    let mut session = CurriculumSession::new(curriculum);
    let mut pending: Vec<&String> = done.iter().collect();

    loop {
        let before = pending.len();
        pending.retain(|name| !session.mark_completed(name).is_completed());
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    let mut rejected = Vec::new();
    for name in pending {
        match session.mark_completed(name) {
            MarkOutcome::NotFound => tracing::warn!(subject = %name, "unknown subject ignored"),
            MarkOutcome::Locked(blocker) => {
                tracing::warn!(subject = %name, %blocker, "locked subject ignored")
            }
            _ => {}
        }
        rejected.push(name.clone());
    }
    (session, rejected)
}

/// Write content to file or stdout
pub fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
