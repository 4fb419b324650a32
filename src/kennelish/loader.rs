//! Sandboxed form document loader
//!
//! Step identifiers are short names mapped to `<dir>/<step>.json`. Anything
//! that is not a plain name is rejected before touching the filesystem, and
//! the resolved path must still stay inside the forms directory.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{OnboardError, Result};

/// Step ids that may name a form file
pub const STEP_PATTERN: &str = "^[A-Za-z0-9_-]{1,64}$";

#[derive(Debug, Clone)]
pub struct FormLoader {
    root: PathBuf,
    step_pattern: Regex,
}

impl FormLoader {
    /// Create a loader rooted at `dir`, which must exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root = dir.canonicalize().map_err(|e| {
            OnboardError::Config(format!("forms directory {}: {}", dir.display(), e))
        })?;

        let step_pattern = Regex::new(STEP_PATTERN)
            .map_err(|e| OnboardError::Internal(format!("step pattern: {}", e)))?;

        Ok(Self { root, step_pattern })
    }

    /// Resolve a step to its file, refusing anything outside the root.
    ///
    /// Malformed step ids answer exactly like missing forms.
    pub async fn resolve(&self, step: &str) -> Result<PathBuf> {
        if !self.step_pattern.is_match(step) {
            debug!(step_len = step.len(), "Rejected malformed step id");
            return Err(OnboardError::NotFound(format!("form {}", step.escape_debug())));
        }

        let candidate = self.root.join(format!("{}.json", step));

        let resolved = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OnboardError::NotFound(format!("form {}", step)));
            }
            Err(e) => return Err(e.into()),
        };

        if !resolved.starts_with(&self.root) {
            error!(step, path = %resolved.display(), "Form path escapes the forms directory");
            return Err(OnboardError::Forbidden(format!("form {}", step)));
        }

        Ok(resolved)
    }

    /// Load the form document for `step`. Nothing is cached.
    pub async fn load(&self, step: &str) -> Result<Vec<Value>> {
        let path = self.resolve(step).await?;
        let bytes = tokio::fs::read(&path).await?;

        let document: Value = serde_json::from_slice(&bytes)
            .map_err(|e| OnboardError::Schema(format!("{}: {}", path.display(), e)))?;

        match document {
            Value::Array(nodes) => {
                debug!(step, nodes = nodes.len(), "Loaded form");
                Ok(nodes)
            }
            _ => Err(OnboardError::Schema(format!(
                "{}: form document must be a JSON array",
                path.display()
            ))),
        }
    }
}
