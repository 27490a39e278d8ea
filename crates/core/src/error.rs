use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A recoverable compilation error, located in a script source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            file: file.to_owned(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "column":  self.column,
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.line, self.column, self.message
        )
    }
}

/// Marker returned once an error has been appended to the diagnostic list.
///
/// Callers propagate it with `?` and never report it a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported;

/// A failed build: either every diagnostic collected during the
/// evaluation, or the I/O error that prevented reading a script.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{}", render(.0))]
    Diagnostics(Vec<Diagnostic>),

    #[error("unable to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// The diagnostics carried by this error, empty for I/O failures.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            BuildError::Diagnostics(d) => d,
            BuildError::Io { .. } => &[],
        }
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_render_one_per_line() {
        let err = BuildError::Diagnostics(vec![
            Diagnostic::new("a.btrp", 1, 4, "unknown variable '$x'"),
            Diagnostic::new("a.btrp", 3, 1, "unknown constraint 'foo'"),
        ]);
        assert_eq!(
            err.to_string(),
            "a.btrp:1:4: unknown variable '$x'\na.btrp:3:1: unknown constraint 'foo'"
        );
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn io_errors_carry_no_diagnostics() {
        let err = BuildError::Io {
            path: PathBuf::from("missing.btrp"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.diagnostics().is_empty());
        assert!(err.to_string().contains("missing.btrp"));
    }
}
