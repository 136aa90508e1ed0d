//! Compiled glob matcher used to select manifest files.
//!
//! Matching is done against the whole path string, not the file name, and `*`
//! is allowed to cross `/`. That keeps `*.yaml` meaning "every YAML file below the
//! base directory", which is how the tool has always been invoked.

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{ApplyError, ApplyResult};

/// An immutable, reusable glob matcher.
#[derive(Clone)]
pub struct Pattern {
    raw: String,
    matcher: GlobMatcher,
}

impl Pattern {
    /// Compile a glob. Fails with [`ApplyError::Pattern`] on malformed syntax
    /// (unclosed character class or alternation, dangling escape, ...).
    pub fn compile(raw: &str) -> ApplyResult<Self> {
        let glob = GlobBuilder::new(raw)
            .literal_separator(false)
            .build()
            .map_err(|source| {
                tracing::error!(pattern = raw, error = %source, "Failed to compile glob");
                ApplyError::Pattern {
                    pattern: raw.to_string(),
                    source,
                }
            })?;
        tracing::debug!(pattern = raw, regex = glob.regex(), "Compiled glob");
        Ok(Self {
            raw: raw.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        self.matcher.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.raw).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
