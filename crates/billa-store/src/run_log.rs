//! The JSON run log: an array of [`RunLogEntry`], oldest first.
//!
//! Older logs may carry bare `NaN` and `Infinity` tokens for missing cell
//! values. Those are read back as `null`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use billa_core::RunLogEntry;

use crate::error::StoreError;
use crate::fs::write_atomically;

pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry. A missing or blank file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read and
    /// [`StoreError::Json`] if it is not a valid log, so an existing history
    /// is never silently replaced.
    pub fn load(&self) -> Result<Vec<RunLogEntry>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&replace_non_finite(&text)).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Appends `entry` and rewrites the file. Returns the full log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the existing log cannot be read or the new
    /// one cannot be written.
    pub fn append(&self, entry: RunLogEntry) -> Result<Vec<RunLogEntry>, StoreError> {
        let mut entries = self.load()?;
        entries.push(entry);
        self.save(&entries)?;
        tracing::info!(
            path = %self.path.display(),
            entries = entries.len(),
            "run log updated"
        );
        Ok(entries)
    }

    /// Writes `entries` as a JSON array indented by four spaces.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the write fails.
    pub fn save(&self, entries: &[RunLogEntry]) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        entries
            .serialize(&mut ser)
            .map_err(|source| StoreError::Json {
                path: self.path.display().to_string(),
                source,
            })?;
        write_atomically(&self.path, &buf)
    }
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Rewrites bare `NaN`, `Infinity` and `-Infinity` outside string literals
/// to `null`. Text without such tokens is borrowed unchanged.
fn replace_non_finite(text: &str) -> Cow<'_, str> {
    if !NON_FINITE_TOKENS.iter().any(|token| text.contains(token)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS
            .iter()
            .find(|token| rest.starts_with(*token))
        {
            let after = &rest[token.len()..];
            if !after.starts_with(|ch: char| ch.is_ascii_alphanumeric() || ch == '_') {
                out.push_str("null");
                rest = after;
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}
